//! Frame buffer for accumulating partial reads across frames.
//!
//! Uses `bytes::BytesMut` to hold whatever a [`FrameDecoder`] has not
//! consumed yet. A single decoder only ever takes one frame, so servers that
//! read several frames off one connection keep the bytes trailing a completed
//! frame here and hand them to the next decoder.
//!
//! # Example
//!
//! ```
//! use rctclient::protocol::{build_frame, Command, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! buffer.extend(&build_frame(Command::Read, 1, &[]).unwrap());
//! buffer.extend(&build_frame(Command::Read, 2, &[]).unwrap());
//!
//! assert_eq!(buffer.next_frame().unwrap().unwrap().object_id(), 1);
//! assert_eq!(buffer.next_frame().unwrap().unwrap().object_id(), 2);
//! assert!(buffer.next_frame().unwrap().is_none());
//! ```

use bytes::{Buf, BytesMut};

use super::{Frame, FrameDecoder};
use crate::error::FrameError;

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Bytes not yet fed to a decoder.
    buffer: BytesMut,
    /// Decoder for the frame currently being assembled.
    decoder: FrameDecoder,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default capacity (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4 * 1024)
    }

    /// Create a new frame buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            decoder: FrameDecoder::new(),
        }
    }

    /// Append data to the buffer without extracting frames.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next frame from buffered bytes.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a framing error; the bytes the failed decoder consumed
    ///   are dropped so the next call starts fresh on what follows
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let before = self.decoder.consumed();
        let used = match self.decoder.consume(&self.buffer) {
            Ok(used) => used,
            Err(err) => {
                let mut used = self.decoder.consumed() - before;
                // A stray start token begins the next frame; keep it.
                if matches!(err, FrameError::UnexpectedStartToken { .. }) {
                    used -= 1;
                }
                self.buffer.advance(used);
                self.decoder = FrameDecoder::new();
                return Err(err);
            }
        };
        self.buffer.advance(used);

        let decoder = std::mem::take(&mut self.decoder);
        match decoder.into_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(pending) => {
                self.decoder = pending;
                Ok(None)
            }
        }
    }

    /// Get the number of buffered bytes not yet handed to a decoder.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset the decoder.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.decoder = FrameDecoder::new();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
