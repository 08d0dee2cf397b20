//! Frame struct with typed accessors, and the frame encoder.
//!
//! A [`Frame`] is either built locally (and then encoded with
//! [`Frame::encode`]) or produced by a completed
//! [`FrameDecoder`](super::FrameDecoder). Payloads use `bytes::Bytes` so
//! decoded frames share the decoder's buffer.
//!
//! # Example
//!
//! ```
//! use rctclient::protocol::{build_frame, Command, Frame};
//!
//! let frame = Frame::new(Command::Read, 0x959930BF, &[]).unwrap();
//! assert_eq!(frame.object_id(), 0x959930BF);
//!
//! let bytes = build_frame(Command::Read, 0x959930BF, &[]).unwrap();
//! assert_eq!(bytes[0], b'+');
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{escape_into, frame_checksum, Command, START_TOKEN};
use crate::error::FrameError;

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    address: Option<u32>,
    object_id: u32,
    payload: Bytes,
    checksum: u16,
}

impl Frame {
    /// Build a non-plant frame.
    ///
    /// Fails if `command` is a plant command or the payload does not fit the
    /// command's length field.
    pub fn new(command: Command, object_id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        Self::build(command, None, object_id, Bytes::copy_from_slice(payload))
    }

    /// Build a plant frame addressed to a specific device.
    pub fn plant(
        command: Command,
        address: u32,
        object_id: u32,
        payload: &[u8],
    ) -> Result<Self, FrameError> {
        Self::build(command, Some(address), object_id, Bytes::copy_from_slice(payload))
    }

    /// Build a frame from its parts, computing the checksum.
    pub fn build(
        command: Command,
        address: Option<u32>,
        object_id: u32,
        payload: Bytes,
    ) -> Result<Self, FrameError> {
        if command.is_plant() != address.is_some() {
            return Err(FrameError::AddressMismatch { command });
        }

        let body_len = command.prefix_len() + payload.len();
        if body_len > command.max_body_len() {
            return Err(FrameError::PayloadTooLarge {
                length: body_len,
                maximum: command.max_body_len(),
            });
        }

        let mut frame = Self {
            command,
            address,
            object_id,
            payload,
            checksum: 0,
        };
        frame.checksum = frame_checksum(&frame.content());
        Ok(frame)
    }

    /// Assemble a frame from decoded parts with the transmitted checksum.
    pub(crate) fn from_wire(
        command: Command,
        address: Option<u32>,
        object_id: u32,
        payload: Bytes,
        checksum: u16,
    ) -> Self {
        Self {
            command,
            address,
            object_id,
            payload,
            checksum,
        }
    }

    /// The unescaped bytes covered by the checksum.
    pub fn content(&self) -> BytesMut {
        let body_len = self.command.prefix_len() + self.payload.len();
        let mut buf = BytesMut::with_capacity(1 + self.command.length_width() + body_len);

        buf.put_u8(self.command.as_u8());
        if self.command.is_long() {
            buf.put_u16(body_len as u16);
        } else {
            buf.put_u8(body_len as u8);
        }
        if let Some(address) = self.address {
            buf.put_u32(address);
        }
        buf.put_u32(self.object_id);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Encode to wire bytes: start token, escaped content, escaped checksum.
    pub fn encode(&self) -> Bytes {
        let content = self.content();
        // Worst case every byte is escaped.
        let mut buf = BytesMut::with_capacity(1 + 2 * (content.len() + 2));
        buf.put_u8(START_TOKEN);
        escape_into(&mut buf, &content);
        escape_into(&mut buf, &self.checksum.to_be_bytes());
        buf.freeze()
    }

    /// Get the command.
    #[inline]
    pub fn command(&self) -> Command {
        self.command
    }

    /// Get the plant address, if any.
    #[inline]
    pub fn address(&self) -> Option<u32> {
        self.address
    }

    /// Get the object ID.
    #[inline]
    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// The checksum carried by (or computed for) this frame.
    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum
    }
}

/// Build the wire bytes for a non-plant frame in one step.
pub fn build_frame(command: Command, object_id: u32, payload: &[u8]) -> Result<Bytes, FrameError> {
    Ok(Frame::new(command, object_id, payload)?.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::{crc16, ESCAPE_TOKEN};

    #[test]
    fn test_read_frame_layout() {
        let bytes = build_frame(Command::Read, 0x0102_0304, &[]).unwrap();

        let content = [0x01, 0x04, 0x01, 0x02, 0x03, 0x04];
        let crc = crc16(&content).to_be_bytes();

        let mut expected = vec![START_TOKEN];
        expected.extend_from_slice(&content);
        expected.extend_from_slice(&crc);
        // crc16 of this content contains no tokens
        assert!(!crc.contains(&START_TOKEN) && !crc.contains(&ESCAPE_TOKEN));
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_object_id_tokens_are_escaped() {
        let frame = Frame::new(Command::Read, 0x2B2D_0000, &[]).unwrap();
        let bytes = frame.encode();

        assert_eq!(bytes[0], START_TOKEN);
        assert_eq!(
            &bytes[3..7],
            &[ESCAPE_TOKEN, START_TOKEN, ESCAPE_TOKEN, ESCAPE_TOKEN]
        );
        // Only the first byte is an unescaped start token.
        assert_eq!(bytes.iter().filter(|&&b| b == START_TOKEN).count(), 2);
    }

    #[test]
    fn test_long_command_uses_two_byte_length() {
        let payload = vec![0x11; 300];
        let frame = Frame::new(Command::LongResponse, 1, &payload).unwrap();
        let content = frame.content();

        assert_eq!(content[0], Command::LongResponse.as_u8());
        assert_eq!(u16::from_be_bytes([content[1], content[2]]), 304);
        assert_eq!(content.len(), 1 + 2 + 304);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; 252];
        let err = Frame::new(Command::Response, 1, &payload).unwrap_err();
        assert_eq!(
            err,
            FrameError::PayloadTooLarge {
                length: 256,
                maximum: 255
            }
        );

        assert!(Frame::new(Command::Response, 1, &payload[..251]).is_ok());
    }

    #[test]
    fn test_plant_frame_address() {
        let frame = Frame::plant(Command::PlantRead, 0xAABB_CCDD, 7, &[]).unwrap();
        let content = frame.content();

        assert_eq!(content[1], 8);
        assert_eq!(&content[2..6], &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(frame.address(), Some(0xAABB_CCDD));
    }

    #[test]
    fn test_address_mismatch() {
        assert_eq!(
            Frame::build(Command::Read, Some(1), 1, Bytes::new()).unwrap_err(),
            FrameError::AddressMismatch {
                command: Command::Read
            }
        );
        assert_eq!(
            Frame::new(Command::PlantRead, 1, &[]).unwrap_err(),
            FrameError::AddressMismatch {
                command: Command::PlantRead
            }
        );
    }

    #[test]
    fn test_checksum_matches_content() {
        let frame = Frame::new(Command::Write, 0xDEAD_BEEF, &[1, 2, 3]).unwrap();
        assert_eq!(frame.checksum(), frame_checksum(&frame.content()));
    }

    #[test]
    fn test_payload_bytes_zero_copy() {
        let frame = Frame::new(Command::Response, 1, b"data").unwrap();
        let a = frame.payload_bytes();
        let b = frame.payload_bytes();
        assert_eq!(a.as_ptr(), b.as_ptr());
    }
}
