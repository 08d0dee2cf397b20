//! Codec module - conversion between payload bytes and typed values.
//!
//! - [`decode_value`] - payload bytes to [`Value`] for a [`DataType`]
//! - [`encode_value`] - the inverse, used by the simulator
//! - [`default_value`] - neutral value per data type
//!
//! Codecs are plain functions over `(DataType, bytes)`; they hold no state.
//!
//! # Example
//!
//! ```
//! use rctclient::codec::{decode_value, encode_value, DataType, Value};
//!
//! let bytes = encode_value(&Value::Float(21.5), DataType::Float).unwrap();
//! assert_eq!(decode_value(DataType::Float, &bytes).unwrap(), Value::Float(21.5));
//! ```

mod value;

pub use value::{decode_value, default_value, encode_value, DataType, Value};
