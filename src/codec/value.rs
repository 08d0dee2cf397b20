//! Typed values carried in frame payloads.
//!
//! All multi-byte numbers are Big Endian. Floats are IEEE-754 single
//! precision. Strings are NUL-terminated (or end with the payload).

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Data type of an object's request or response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Bool,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Enum,
    Float,
    String,
}

impl DataType {
    /// Fixed payload size, `None` for strings.
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Uint8 | Self::Int8 | Self::Enum => Some(1),
            Self::Uint16 | Self::Int16 => Some(2),
            Self::Uint32 | Self::Int32 | Self::Float => Some(4),
            Self::String => None,
        }
    }
}

/// A decoded payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f32),
    String(String),
    Enum(u8),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Enum(v) => write!(f, "{v}"),
        }
    }
}

/// Decode a payload according to `data_type`.
///
/// # Example
///
/// ```
/// use rctclient::codec::{decode_value, DataType, Value};
///
/// let value = decode_value(DataType::Int16, &[0xFF, 0xFE]).unwrap();
/// assert_eq!(value, Value::Integer(-2));
/// ```
pub fn decode_value(data_type: DataType, data: &[u8]) -> Result<Value, DecodeError> {
    if let Some(expected) = data_type.size() {
        if data.len() != expected {
            return Err(DecodeError::Length {
                data_type,
                expected,
                actual: data.len(),
            });
        }
    }

    let value = match data_type {
        DataType::Bool => Value::Bool(data[0] != 0),
        DataType::Uint8 => Value::Integer(data[0] as i64),
        DataType::Int8 => Value::Integer(data[0] as i8 as i64),
        DataType::Enum => Value::Enum(data[0]),
        DataType::Uint16 => Value::Integer(u16::from_be_bytes([data[0], data[1]]) as i64),
        DataType::Int16 => Value::Integer(i16::from_be_bytes([data[0], data[1]]) as i64),
        DataType::Uint32 => Value::Integer(u32::from_be_bytes(be4(data)) as i64),
        DataType::Int32 => Value::Integer(i32::from_be_bytes(be4(data)) as i64),
        DataType::Float => Value::Float(f32::from_be_bytes(be4(data))),
        DataType::String => {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            Value::String(String::from_utf8_lossy(&data[..end]).into_owned())
        }
    };

    Ok(value)
}

#[inline]
fn be4(data: &[u8]) -> [u8; 4] {
    [data[0], data[1], data[2], data[3]]
}

/// Encode a value as the payload for `data_type`.
///
/// Integers are range-checked against the target type. Strings are written
/// without a terminator.
pub fn encode_value(value: &Value, data_type: DataType) -> Result<Bytes, DecodeError> {
    let unrepresentable = || DecodeError::Unrepresentable {
        data_type,
        value: value.to_string(),
    };

    let mut buf = BytesMut::with_capacity(data_type.size().unwrap_or(16));
    match (data_type, value) {
        (DataType::Bool, Value::Bool(v)) => buf.put_u8(*v as u8),
        (DataType::Bool, Value::Integer(v)) => buf.put_u8((*v != 0) as u8),
        (DataType::Enum, Value::Enum(v)) => buf.put_u8(*v),
        (DataType::Uint8 | DataType::Enum, Value::Integer(v)) => {
            buf.put_u8(u8::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Int8, Value::Integer(v)) => {
            buf.put_i8(i8::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Uint16, Value::Integer(v)) => {
            buf.put_u16(u16::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Int16, Value::Integer(v)) => {
            buf.put_i16(i16::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Uint32, Value::Integer(v)) => {
            buf.put_u32(u32::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Int32, Value::Integer(v)) => {
            buf.put_i32(i32::try_from(*v).map_err(|_| unrepresentable())?)
        }
        (DataType::Float, Value::Float(v)) => buf.put_f32(*v),
        (DataType::Float, Value::Integer(v)) => buf.put_f32(*v as f32),
        (DataType::String, Value::String(v)) => buf.extend_from_slice(v.as_bytes()),
        _ => return Err(unrepresentable()),
    }

    Ok(buf.freeze())
}

/// Neutral value for a data type, used when nothing better is configured.
pub fn default_value(data_type: DataType) -> Value {
    match data_type {
        DataType::Bool => Value::Bool(false),
        DataType::Enum => Value::Enum(0),
        DataType::Float => Value::Float(0.0),
        DataType::String => Value::String("ABCDEFG".to_string()),
        DataType::Uint8
        | DataType::Int8
        | DataType::Uint16
        | DataType::Int16
        | DataType::Uint32
        | DataType::Int32 => Value::Integer(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integers() {
        assert_eq!(
            decode_value(DataType::Uint8, &[0xFF]).unwrap(),
            Value::Integer(255)
        );
        assert_eq!(
            decode_value(DataType::Int8, &[0xFF]).unwrap(),
            Value::Integer(-1)
        );
        assert_eq!(
            decode_value(DataType::Uint16, &[0x12, 0x34]).unwrap(),
            Value::Integer(0x1234)
        );
        assert_eq!(
            decode_value(DataType::Uint32, &[0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            Value::Integer(u32::MAX as i64)
        );
        assert_eq!(
            decode_value(DataType::Int32, &[0xFF, 0xFF, 0xFF, 0xFE]).unwrap(),
            Value::Integer(-2)
        );
    }

    #[test]
    fn test_decode_bool_and_enum() {
        assert_eq!(decode_value(DataType::Bool, &[0]).unwrap(), Value::Bool(false));
        assert_eq!(decode_value(DataType::Bool, &[7]).unwrap(), Value::Bool(true));
        assert_eq!(decode_value(DataType::Enum, &[3]).unwrap(), Value::Enum(3));
    }

    #[test]
    fn test_decode_float() {
        let bytes = 42.5f32.to_be_bytes();
        assert_eq!(
            decode_value(DataType::Float, &bytes).unwrap(),
            Value::Float(42.5)
        );
    }

    #[test]
    fn test_decode_string_stops_at_nul() {
        assert_eq!(
            decode_value(DataType::String, b"PS 6.0\0\0junk").unwrap(),
            Value::String("PS 6.0".to_string())
        );
        assert_eq!(
            decode_value(DataType::String, b"").unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_decode_length_mismatch() {
        let err = decode_value(DataType::Float, &[0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Length {
                data_type: DataType::Float,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_encode_range_checked() {
        assert_eq!(
            &encode_value(&Value::Integer(-2), DataType::Int16).unwrap()[..],
            &[0xFF, 0xFE]
        );
        assert!(matches!(
            encode_value(&Value::Integer(256), DataType::Uint8),
            Err(DecodeError::Unrepresentable { .. })
        ));
        assert!(matches!(
            encode_value(&Value::Integer(-1), DataType::Uint32),
            Err(DecodeError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn test_encode_type_mismatch() {
        let err = encode_value(&Value::String("x".into()), DataType::Bool).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Unrepresentable {
                data_type: DataType::Bool,
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_defaults_encode_and_decode() {
        for data_type in [
            DataType::Bool,
            DataType::Uint8,
            DataType::Int8,
            DataType::Uint16,
            DataType::Int16,
            DataType::Uint32,
            DataType::Int32,
            DataType::Enum,
            DataType::Float,
            DataType::String,
        ] {
            let value = default_value(data_type);
            let bytes = encode_value(&value, data_type).unwrap();
            assert_eq!(decode_value(data_type, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_value_json() {
        let value: Value = serde_json::from_str("true").unwrap();
        assert_eq!(value, Value::Bool(true));
        let value: Value = serde_json::from_str("12").unwrap();
        assert_eq!(value, Value::Integer(12));
        let value: Value = serde_json::from_str("1.5").unwrap();
        assert_eq!(value, Value::Float(1.5));
        assert_eq!(serde_json::to_string(&Value::Enum(4)).unwrap(), "4");
    }

    #[test]
    fn test_data_type_names() {
        let data_type: DataType = serde_json::from_str("\"UINT16\"").unwrap();
        assert_eq!(data_type, DataType::Uint16);
        assert_eq!(serde_json::to_string(&DataType::Float).unwrap(), "\"FLOAT\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::String("abc".into()).to_string(), "abc");
    }
}
