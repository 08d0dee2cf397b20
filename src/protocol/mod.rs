//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the binary protocol:
//! - Start token, byte-stuffing and CRC16 constants
//! - Frame encoding ([`Frame::encode`], [`build_frame`])
//! - Incremental single-frame decoding ([`FrameDecoder`])
//! - Multi-frame accumulation for servers ([`FrameBuffer`])

mod frame;
mod frame_buffer;
mod frame_decoder;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use frame_decoder::FrameDecoder;
pub use wire_format::{
    crc16, escape_into, frame_checksum, needs_escape, Command, ADDRESS_SIZE, CHECKSUM_SIZE,
    ESCAPE_TOKEN, MAX_BODY_LENGTH, MAX_LONG_BODY_LENGTH, OBJECT_ID_SIZE, START_TOKEN,
};
