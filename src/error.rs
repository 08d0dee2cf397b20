//! Error types for rctclient.
//!
//! Each component boundary has its own small, closed error enum. The client
//! session wraps the lower level ones in [`QueryError`].

use std::time::Duration;

use thiserror::Error;

use crate::codec::DataType;
use crate::protocol::Command;

/// Errors from looking up or loading object descriptors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No descriptor carries this object ID.
    #[error("Unknown object ID 0x{0:08X}")]
    IdNotFound(u32),

    /// No descriptor carries this exact name.
    #[error("Unknown object name: {0}")]
    NameNotFound(String),

    /// Two descriptors share an object ID.
    #[error("Duplicate object ID 0x{0:08X}")]
    DuplicateId(u32),

    /// Two descriptors share a name.
    #[error("Duplicate object name: {0}")]
    DuplicateName(String),

    /// Malformed JSON descriptor table.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Descriptor table could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// True for the two lookup-miss variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IdNotFound(_) | Self::NameNotFound(_))
    }
}

/// Framing errors raised while building or assembling a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The transmitted checksum does not match the one computed locally.
    #[error("Frame CRC mismatch: received 0x{received:04X} but calculated 0x{calculated:04X}")]
    ChecksumMismatch { received: u16, calculated: u16 },

    /// The command byte is not part of the protocol.
    #[error("Invalid command byte 0x{0:02X}")]
    InvalidCommand(u8),

    /// The length field is too small to hold the mandatory fields.
    #[error("Declared length {declared} is shorter than the minimum {minimum}")]
    InvalidLength { declared: usize, minimum: usize },

    /// A start token showed up unescaped inside a frame.
    #[error("Unescaped start token inside frame at offset {offset}")]
    UnexpectedStartToken { offset: usize },

    /// The frame body does not fit the command's length field.
    #[error("Frame body of {length} bytes exceeds maximum {maximum}")]
    PayloadTooLarge { length: usize, maximum: usize },

    /// Plant commands need an address, all others must not carry one.
    #[error("Address does not match command {command:?}")]
    AddressMismatch { command: Command },
}

/// Errors from converting between payload bytes and typed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload length is inconsistent with the data type.
    #[error("Expected {expected} bytes for {data_type:?}, got {actual}")]
    Length {
        data_type: DataType,
        expected: usize,
        actual: usize,
    },

    /// The value cannot be encoded as the requested data type.
    #[error("Value {value} cannot be encoded as {data_type:?}")]
    Unrepresentable { data_type: DataType, value: String },
}

/// Errors from receiving a single frame off a stream.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// No data arrived within one wait window.
    #[error("Timed out after {0:?} without data")]
    Timeout(Duration),

    /// The peer closed the connection before a frame completed.
    #[error("Connection closed after {buffered} bytes of an incomplete frame")]
    ConnectionClosed { buffered: usize },

    /// The decoder rejected the incoming bytes.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Read failure on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single client query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Ambiguous or missing target selection.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The target does not resolve in the registry.
    #[error(transparent)]
    NotFound(#[from] RegistryError),

    /// TCP connect failed (refused, unreachable, DNS, connect timeout).
    #[error("Could not connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The request frame could not be built.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Receiving the response failed.
    #[error(transparent)]
    Receive(#[from] ReceiveError),

    /// The response belongs to a different object.
    #[error("Received unexpected frame, ID is 0x{actual:08X}, expected 0x{expected:08X}")]
    UnexpectedResponse { expected: u32, actual: u32 },

    /// The response payload does not match the declared data type.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Write failure while sending the request.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from running the simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The listen address could not be bound.
    #[error("Could not bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Accept or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias, defaulting to [`QueryError`].
pub type Result<T, E = QueryError> = std::result::Result<T, E>;
