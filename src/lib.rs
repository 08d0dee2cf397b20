//! # rctclient
//!
//! Async client for the RCT Power serial protocol spoken by RCT inverters
//! over TCP.
//!
//! ## Architecture
//!
//! - **Registry**: object IDs, names and data types of the device objects
//! - **Protocol**: byte-stuffed, CRC16-protected frames, decoded incrementally
//! - **Transport**: TCP connect and one-frame-at-a-time receive with an idle timeout
//! - **Client**: resolve, send READ, receive, check, decode
//! - **Simulator**: a small server answering reads from the registry
//!
//! ## Example
//!
//! ```ignore
//! use rctclient::{Client, Target};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder()
//!         .host("192.168.0.10")
//!         .build();
//!
//!     let value = client
//!         .query(&Target::Name("battery.soc".into()))
//!         .await
//!         .unwrap();
//!     println!("{}", value);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;

mod client;
mod simulator;

pub use client::{
    Client, ClientBuilder, ClientConfig, Reading, Target, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT,
    DEFAULT_TIMEOUT,
};
pub use codec::{DataType, Value};
pub use error::{QueryError, ReceiveError, SimulatorError};
pub use registry::{ObjectDescriptor, Registry};
pub use simulator::{respond, Simulator, MAX_SIMULATOR_CLIENTS};
