//! Transport module - TCP connections and frame reception.
//!
//! - [`connect`] / [`bind`] - socket setup with address-carrying errors
//! - [`StreamReceiver`] - reads one frame at a time with an idle timeout

mod receiver;
mod tcp;

pub use receiver::{receive_frame, StreamReceiver, DEFAULT_CHUNK_SIZE};
pub use tcp::{bind, connect, socket_address};
