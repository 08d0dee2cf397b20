//! Incremental frame decoder.
//!
//! Implements a state machine that assembles exactly one frame from byte
//! chunks of any size:
//! - `AwaitingStart`: skipping bytes until a start token
//! - `ReadingHeader`: command, length, address and object ID
//! - `ReadingPayload`: declared-length payload
//! - `ReadingChecksum`: two CRC bytes, validated on arrival
//! - `Done` / `Failed`: terminal
//!
//! Escapes are undone as bytes arrive, so an escape token at the end of one
//! chunk applies to the first byte of the next.
//!
//! # Example
//!
//! ```
//! use rctclient::protocol::{build_frame, Command, FrameDecoder};
//!
//! let bytes = build_frame(Command::Response, 0x959930BF, &[0x42, 0x28, 0x00, 0x00]).unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let (head, tail) = bytes.split_at(5);
//! assert_eq!(decoder.consume(head).unwrap(), 5);
//! assert!(!decoder.complete());
//! assert_eq!(decoder.consume(tail).unwrap(), tail.len());
//! assert!(decoder.complete());
//!
//! let frame = decoder.into_frame().unwrap();
//! assert_eq!(frame.object_id(), 0x959930BF);
//! ```

use bytes::{Buf, BufMut, BytesMut};

use super::wire_format::{frame_checksum, Command, CHECKSUM_SIZE, ESCAPE_TOKEN, START_TOKEN};
use super::Frame;
use crate::error::FrameError;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingStart,
    ReadingHeader,
    ReadingPayload { command: Command, remaining: usize },
    ReadingChecksum { command: Command },
    Done,
    Failed,
}

/// Single-use decoder for one frame.
///
/// Feed chunks with [`consume`](Self::consume) until [`complete`](Self::complete)
/// is true, then move the result out with [`into_frame`](Self::into_frame).
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    /// Unescaped bytes from the command through the payload.
    content: BytesMut,
    command: Option<Command>,
    /// Value of the length field once read.
    body_len: usize,
    checksum: [u8; CHECKSUM_SIZE],
    checksum_read: usize,
    /// Previous byte was an escape token.
    escaping: bool,
    /// Raw bytes consumed over all calls.
    consumed: usize,
    frame: Option<Frame>,
}

impl FrameDecoder {
    /// Create a decoder waiting for a start token.
    pub fn new() -> Self {
        Self {
            state: State::AwaitingStart,
            content: BytesMut::with_capacity(64),
            command: None,
            body_len: 0,
            checksum: [0; CHECKSUM_SIZE],
            checksum_read: 0,
            escaping: false,
            consumed: 0,
            frame: None,
        }
    }

    /// Feed a chunk and return how many of its bytes were consumed.
    ///
    /// Consumption stops right after the last checksum byte, so a short
    /// count means the rest of `chunk` belongs to the next frame. Once the
    /// decoder is done or failed, nothing more is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ChecksumMismatch`] when the checksum does not
    /// validate, and other [`FrameError`] variants for malformed headers. The
    /// decoder is failed afterwards; [`consumed`](Self::consumed) tells how
    /// many bytes it swallowed.
    pub fn consume(&mut self, chunk: &[u8]) -> Result<usize, FrameError> {
        if self.is_terminal() {
            return Ok(0);
        }

        for (i, &byte) in chunk.iter().enumerate() {
            self.consumed += 1;

            if self.state == State::AwaitingStart {
                if byte == START_TOKEN {
                    self.state = State::ReadingHeader;
                }
                continue;
            }

            if self.escaping {
                self.escaping = false;
            } else if byte == ESCAPE_TOKEN {
                self.escaping = true;
                continue;
            } else if byte == START_TOKEN {
                return self.fail(FrameError::UnexpectedStartToken {
                    offset: self.consumed - 1,
                });
            }

            if let Err(err) = self.accept(byte) {
                return self.fail(err);
            }

            if self.state == State::Done {
                return Ok(i + 1);
            }
        }

        Ok(chunk.len())
    }

    /// Take one unescaped byte.
    fn accept(&mut self, byte: u8) -> Result<(), FrameError> {
        match self.state {
            State::ReadingHeader => self.accept_header(byte),
            State::ReadingPayload { command, remaining } => {
                self.content.put_u8(byte);
                self.state = if remaining == 1 {
                    State::ReadingChecksum { command }
                } else {
                    State::ReadingPayload {
                        command,
                        remaining: remaining - 1,
                    }
                };
                Ok(())
            }
            State::ReadingChecksum { command } => {
                self.checksum[self.checksum_read] = byte;
                self.checksum_read += 1;
                if self.checksum_read == CHECKSUM_SIZE {
                    self.finish(command)?;
                }
                Ok(())
            }
            State::AwaitingStart | State::Done | State::Failed => Ok(()),
        }
    }

    fn accept_header(&mut self, byte: u8) -> Result<(), FrameError> {
        let Some(command) = self.command else {
            let command = Command::from_u8(byte).ok_or(FrameError::InvalidCommand(byte))?;
            self.command = Some(command);
            self.content.put_u8(byte);
            return Ok(());
        };

        self.content.put_u8(byte);
        let width = command.length_width();
        let header_read = self.content.len() - 1;

        if header_read == width {
            let length = &self.content[1..1 + width];
            self.body_len = if width == 2 {
                u16::from_be_bytes([length[0], length[1]]) as usize
            } else {
                length[0] as usize
            };

            if self.body_len < command.prefix_len() {
                return Err(FrameError::InvalidLength {
                    declared: self.body_len,
                    minimum: command.prefix_len(),
                });
            }
        } else if header_read == width + command.prefix_len() {
            let payload_len = self.body_len - command.prefix_len();
            self.state = if payload_len == 0 {
                State::ReadingChecksum { command }
            } else {
                State::ReadingPayload {
                    command,
                    remaining: payload_len,
                }
            };
        }

        Ok(())
    }

    /// Validate the checksum and build the frame.
    fn finish(&mut self, command: Command) -> Result<(), FrameError> {
        let received = u16::from_be_bytes(self.checksum);
        let calculated = frame_checksum(&self.content);
        if received != calculated {
            return Err(FrameError::ChecksumMismatch {
                received,
                calculated,
            });
        }

        let mut content = std::mem::take(&mut self.content).freeze();
        content.advance(1 + command.length_width());
        let address = if command.is_plant() {
            Some(content.get_u32())
        } else {
            None
        };
        let object_id = content.get_u32();

        self.frame = Some(Frame::from_wire(command, address, object_id, content, received));
        self.state = State::Done;
        Ok(())
    }

    fn fail(&mut self, err: FrameError) -> Result<usize, FrameError> {
        self.state = State::Failed;
        self.content.clear();
        Err(err)
    }

    #[inline]
    fn is_terminal(&self) -> bool {
        matches!(self.state, State::Done | State::Failed)
    }

    /// True once a frame has been fully read and its checksum validated.
    #[inline]
    pub fn complete(&self) -> bool {
        self.state == State::Done
    }

    /// True after a framing error.
    #[inline]
    pub fn failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Total raw bytes consumed so far, including skipped leading bytes.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// The completed frame, if any.
    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Command of the completed frame.
    pub fn command(&self) -> Option<Command> {
        self.frame.as_ref().map(Frame::command)
    }

    /// Object ID of the completed frame.
    pub fn object_id(&self) -> Option<u32> {
        self.frame.as_ref().map(Frame::object_id)
    }

    /// Payload of the completed frame.
    pub fn payload(&self) -> Option<&[u8]> {
        self.frame.as_ref().map(Frame::payload)
    }

    /// Move the decoder into its frame.
    ///
    /// Hands the decoder back unchanged if it has not completed.
    pub fn into_frame(self) -> Result<Frame, Self> {
        match self.frame {
            Some(frame) => Ok(frame),
            None => Err(self),
        }
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::AwaitingStart => "AwaitingStart",
            State::ReadingHeader => "ReadingHeader",
            State::ReadingPayload { .. } => "ReadingPayload",
            State::ReadingChecksum { .. } => "ReadingChecksum",
            State::Done => "Done",
            State::Failed => "Failed",
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::build_frame;

    fn decode_all(bytes: &[u8]) -> Result<(Frame, usize), FrameError> {
        let mut decoder = FrameDecoder::new();
        let used = decoder.consume(bytes)?;
        let frame = decoder.into_frame().expect("frame should be complete");
        Ok((frame, used))
    }

    #[test]
    fn test_single_complete_frame() {
        let bytes = build_frame(Command::Response, 42, b"hello").unwrap();
        let (frame, used) = decode_all(&bytes).unwrap();

        assert_eq!(used, bytes.len());
        assert_eq!(frame.command(), Command::Response);
        assert_eq!(frame.object_id(), 42);
        assert_eq!(frame.payload(), b"hello");
    }

    #[test]
    fn test_state_progression() {
        let bytes = build_frame(Command::Response, 7, &[1, 2, 3]).unwrap();
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.state_name(), "AwaitingStart");

        decoder.consume(&bytes[..1]).unwrap();
        assert_eq!(decoder.state_name(), "ReadingHeader");

        // command + length + 4 id bytes
        decoder.consume(&bytes[1..7]).unwrap();
        assert_eq!(decoder.state_name(), "ReadingPayload");

        decoder.consume(&bytes[7..10]).unwrap();
        assert_eq!(decoder.state_name(), "ReadingChecksum");

        decoder.consume(&bytes[10..]).unwrap();
        assert_eq!(decoder.state_name(), "Done");
    }

    #[test]
    fn test_empty_payload_skips_payload_state() {
        let bytes = build_frame(Command::Read, 7, &[]).unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.consume(&bytes[..7]).unwrap();
        assert_eq!(decoder.state_name(), "ReadingChecksum");
    }

    #[test]
    fn test_leading_garbage_skipped() {
        let frame = build_frame(Command::Response, 1, &[9]).unwrap();
        let mut data = vec![0x00, 0xFF, ESCAPE_TOKEN];
        data.extend_from_slice(&frame);

        let mut decoder = FrameDecoder::new();
        let used = decoder.consume(&data).unwrap();
        assert_eq!(used, data.len());
        assert_eq!(decoder.consumed(), data.len());
        assert_eq!(decoder.payload(), Some(&[9u8][..]));
    }

    #[test]
    fn test_stops_at_frame_end() {
        let first = build_frame(Command::Response, 1, b"first").unwrap();
        let second = build_frame(Command::Response, 2, b"second").unwrap();
        let mut data = first.to_vec();
        data.extend_from_slice(&second);

        let mut decoder = FrameDecoder::new();
        let used = decoder.consume(&data).unwrap();
        assert_eq!(used, first.len());
        assert_eq!(decoder.object_id(), Some(1));

        let mut next = FrameDecoder::new();
        assert_eq!(next.consume(&data[used..]).unwrap(), second.len());
        assert_eq!(next.object_id(), Some(2));
    }

    #[test]
    fn test_terminal_decoder_consumes_nothing() {
        let bytes = build_frame(Command::Response, 1, b"x").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.consume(&bytes).unwrap();
        assert!(decoder.complete());
        assert_eq!(decoder.consume(&bytes).unwrap(), 0);
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let payload = [START_TOKEN, ESCAPE_TOKEN, START_TOKEN];
        let bytes = build_frame(Command::Response, 0x2B2B_2D2D, &payload).unwrap();

        // Cut right after every escape token.
        let mut decoder = FrameDecoder::new();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate().skip(1) {
            if b == ESCAPE_TOKEN && i + 1 < bytes.len() {
                decoder.consume(&bytes[start..=i]).unwrap();
                start = i + 1;
            }
        }
        decoder.consume(&bytes[start..]).unwrap();

        let frame = decoder.into_frame().unwrap();
        assert_eq!(frame.object_id(), 0x2B2B_2D2D);
        assert_eq!(frame.payload(), &payload);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut bytes = build_frame(Command::Response, 5, &[0x10, 0x20]).unwrap().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let mut decoder = FrameDecoder::new();
        let err = decoder.consume(&bytes).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert!(decoder.failed());
        assert!(!decoder.complete());
        assert_eq!(decoder.consumed(), bytes.len());
        assert!(decoder.into_frame().is_err());
    }

    #[test]
    fn test_invalid_command() {
        let mut decoder = FrameDecoder::new();
        let err = decoder.consume(&[START_TOKEN, 0x04, 0x04]).unwrap_err();
        assert_eq!(err, FrameError::InvalidCommand(0x04));
        assert_eq!(decoder.consume(&[0x00]).unwrap(), 0);
    }

    #[test]
    fn test_invalid_length() {
        let mut decoder = FrameDecoder::new();
        let err = decoder.consume(&[START_TOKEN, 0x01, 0x03]).unwrap_err();
        assert_eq!(
            err,
            FrameError::InvalidLength {
                declared: 3,
                minimum: 4
            }
        );
    }

    #[test]
    fn test_unescaped_start_inside_frame() {
        let mut decoder = FrameDecoder::new();
        let err = decoder
            .consume(&[START_TOKEN, 0x01, 0x04, 0x00, START_TOKEN])
            .unwrap_err();
        assert_eq!(err, FrameError::UnexpectedStartToken { offset: 4 });
    }

    #[test]
    fn test_plant_frame() {
        let frame = Frame::plant(Command::PlantResponse, 0x0102_0304, 99, &[1]).unwrap();
        let bytes = frame.encode();
        let (decoded, _) = decode_all(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.address(), Some(0x0102_0304));
    }

    #[test]
    fn test_long_frame() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let frame = Frame::new(Command::LongResponse, 3, &payload).unwrap();
        let (decoded, used) = decode_all(&frame.encode()).unwrap();
        assert_eq!(used, frame.encode().len());
        assert_eq!(decoded.payload(), &payload[..]);
    }

    #[test]
    fn test_incomplete_hands_decoder_back() {
        let bytes = build_frame(Command::Response, 1, b"abc").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.consume(&bytes[..4]).unwrap();

        let mut decoder = decoder.into_frame().unwrap_err();
        decoder.consume(&bytes[4..]).unwrap();
        assert_eq!(decoder.into_frame().unwrap().payload(), b"abc");
    }
}
