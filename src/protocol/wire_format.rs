//! Wire format constants, commands, checksum and byte-stuffing.
//!
//! Frame layout:
//! ```text
//! ┌─────┬─────────┬──────────┬──────────┬───────────┬─────────┬─────────┐
//! │ '+' │ Command │ Length   │ Address  │ Object ID │ Payload │ CRC16   │
//! │ 1   │ 1 byte  │ 1 or 2   │ 4 (plant)│ 4 bytes   │ N bytes │ 2 bytes │
//! │     │         │ uint BE  │ uint32 BE│ uint32 BE │         │ uint BE │
//! └─────┴─────────┴──────────┴──────────┴───────────┴─────────┴─────────┘
//! ```
//!
//! Everything after the start token is byte-stuffed: each start or escape
//! token is preceded by [`ESCAPE_TOKEN`]. The CRC covers the unescaped bytes
//! from the command up to the end of the payload.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Start of frame (`'+'`).
pub const START_TOKEN: u8 = 0x2B;

/// Escape prefix (`'-'`).
pub const ESCAPE_TOKEN: u8 = 0x2D;

/// Size of the object ID field.
pub const OBJECT_ID_SIZE: usize = 4;

/// Size of the plant address field.
pub const ADDRESS_SIZE: usize = 4;

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 2;

/// Largest body (address + id + payload) a normal command can carry.
pub const MAX_BODY_LENGTH: usize = u8::MAX as usize;

/// Largest body a long command can carry.
pub const MAX_LONG_BODY_LENGTH: usize = u16::MAX as usize;

/// Bit marking a plant command (frame carries an address).
const PLANT_FLAG: u8 = 0x40;

/// Protocol command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Read = 0x01,
    Write = 0x02,
    LongWrite = 0x03,
    Response = 0x05,
    LongResponse = 0x06,
    ReadPeriodically = 0x08,
    PlantRead = 0x41,
    PlantWrite = 0x42,
    PlantLongWrite = 0x43,
    PlantResponse = 0x45,
    PlantLongResponse = 0x46,
    PlantReadPeriodically = 0x48,
}

impl Command {
    /// Parse a command byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Read),
            0x02 => Some(Self::Write),
            0x03 => Some(Self::LongWrite),
            0x05 => Some(Self::Response),
            0x06 => Some(Self::LongResponse),
            0x08 => Some(Self::ReadPeriodically),
            0x41 => Some(Self::PlantRead),
            0x42 => Some(Self::PlantWrite),
            0x43 => Some(Self::PlantLongWrite),
            0x45 => Some(Self::PlantResponse),
            0x46 => Some(Self::PlantLongResponse),
            0x48 => Some(Self::PlantReadPeriodically),
            _ => None,
        }
    }

    /// Raw command byte.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Plant commands carry a device address before the object ID.
    #[inline]
    pub fn is_plant(self) -> bool {
        self.as_u8() & PLANT_FLAG != 0
    }

    /// Long commands use a two byte length field.
    #[inline]
    pub fn is_long(self) -> bool {
        matches!(
            self,
            Self::LongWrite | Self::LongResponse | Self::PlantLongWrite | Self::PlantLongResponse
        )
    }

    /// Check if this is a (plant) response.
    #[inline]
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::Response | Self::LongResponse | Self::PlantResponse | Self::PlantLongResponse
        )
    }

    /// Check if this is a (plant) read request.
    #[inline]
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::PlantRead)
    }

    /// Width of the length field in bytes.
    #[inline]
    pub fn length_width(self) -> usize {
        if self.is_long() {
            2
        } else {
            1
        }
    }

    /// Bytes in front of the payload that the length field also counts.
    #[inline]
    pub fn prefix_len(self) -> usize {
        if self.is_plant() {
            ADDRESS_SIZE + OBJECT_ID_SIZE
        } else {
            OBJECT_ID_SIZE
        }
    }

    /// Maximum value of the length field.
    #[inline]
    pub fn max_body_len(self) -> usize {
        if self.is_long() {
            MAX_LONG_BODY_LENGTH
        } else {
            MAX_BODY_LENGTH
        }
    }

    /// The response command matching this request.
    pub fn response(self) -> Self {
        match (self.is_plant(), self.is_long()) {
            (false, false) => Self::Response,
            (false, true) => Self::LongResponse,
            (true, false) => Self::PlantResponse,
            (true, true) => Self::PlantLongResponse,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(value)
    }
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF) over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0xFFFF_u16, |crc, &byte| crc16_update(crc, byte))
}

#[inline]
fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    crc ^= (byte as u16) << 8;
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ 0x1021
        } else {
            crc << 1
        };
    }
    crc
}

/// Frame checksum over unescaped frame content.
///
/// Odd-length content is padded with a single zero byte first.
pub fn frame_checksum(content: &[u8]) -> u16 {
    let crc = crc16(content);
    if content.len() % 2 == 1 {
        crc16_update(crc, 0x00)
    } else {
        crc
    }
}

/// True if `byte` must be escaped inside a frame.
#[inline]
pub fn needs_escape(byte: u8) -> bool {
    byte == START_TOKEN || byte == ESCAPE_TOKEN
}

/// Append `data` to `buf`, escaping start and escape tokens.
pub fn escape_into(buf: &mut BytesMut, data: &[u8]) {
    for &byte in data {
        if needs_escape(byte) {
            buf.put_u8(ESCAPE_TOKEN);
        }
        buf.put_u8(byte);
    }
}
