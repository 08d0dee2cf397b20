//! Stream receiver: reads chunks with an idle timeout until one frame completes.
//!
//! Every read waits at most `timeout`; data arriving resets the budget, so a
//! slow but steady peer never times out. Bytes trailing a completed frame
//! are kept and fed to the next [`StreamReceiver::receive`] call.
//!
//! # Example
//!
//! ```ignore
//! use rctclient::transport::StreamReceiver;
//! use std::time::Duration;
//!
//! let mut receiver = StreamReceiver::new(stream, Duration::from_secs(2));
//! let frame = receiver.receive().await?;
//! ```

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ReceiveError;
use crate::protocol::{Frame, FrameDecoder};

/// Default read size per wait.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Receives frames from an async reader, one per call.
pub struct StreamReceiver<R> {
    reader: R,
    timeout: Duration,
    chunk_size: usize,
    /// Bytes read past the end of the last frame.
    leftover: BytesMut,
}

impl<R: AsyncRead + Unpin> StreamReceiver<R> {
    /// Create a receiver with the default chunk size.
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self {
            reader,
            timeout,
            chunk_size: DEFAULT_CHUNK_SIZE,
            leftover: BytesMut::new(),
        }
    }

    /// Set the number of bytes requested per read.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Receive the next complete, checksum-validated frame.
    ///
    /// # Errors
    ///
    /// - [`ReceiveError::Timeout`] if a single wait sees no data
    /// - [`ReceiveError::ConnectionClosed`] if the peer closes first
    /// - [`ReceiveError::Frame`] if the decoder rejects the bytes
    pub async fn receive(&mut self) -> Result<Frame, ReceiveError> {
        let mut decoder = FrameDecoder::new();

        if !self.leftover.is_empty() {
            let pending = self.leftover.split();
            let used = decoder.consume(&pending)?;
            decoder = match decoder.into_frame() {
                Ok(frame) => {
                    self.leftover.extend_from_slice(&pending[used..]);
                    return Ok(frame);
                }
                Err(decoder) => decoder,
            };
        }

        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match tokio::time::timeout(self.timeout, self.reader.read(&mut buf)).await {
                Err(_) => return Err(ReceiveError::Timeout(self.timeout)),
                Ok(Ok(0)) => {
                    return Err(ReceiveError::ConnectionClosed {
                        buffered: decoder.consumed(),
                    })
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ReceiveError::Io(e)),
            };

            tracing::debug!(bytes = n, data = ?&buf[..n], "Received chunk");
            let used = decoder.consume(&buf[..n])?;
            tracing::debug!(consumed = used, "Frame consumed bytes");

            decoder = match decoder.into_frame() {
                Ok(frame) => {
                    if used < n {
                        tracing::warn!(
                            leftover = n - used,
                            "Frame complete, but buffer still contains bytes"
                        );
                        tracing::debug!(data = ?&buf[used..n], "Leftover bytes");
                        self.leftover.extend_from_slice(&buf[used..n]);
                    }
                    return Ok(frame);
                }
                Err(decoder) => decoder,
            };
        }
    }

    /// Bytes read past the last returned frame.
    pub fn leftover(&self) -> &[u8] {
        &self.leftover
    }

    /// Get a mutable reference to the underlying reader.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Receive a single frame from `reader`.
///
/// Trailing bytes after the frame are logged and dropped; use a
/// [`StreamReceiver`] to keep them.
pub async fn receive_frame<R: AsyncRead + Unpin>(
    reader: R,
    timeout: Duration,
) -> Result<Frame, ReceiveError> {
    StreamReceiver::new(reader, timeout).receive().await
}
