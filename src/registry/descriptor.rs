//! Object descriptor: metadata for one register on the device.

use serde::{Deserialize, Serialize};

use crate::codec::{DataType, Value};

/// Metadata for one object.
///
/// Descriptors are owned by a [`Registry`](super::Registry) and never
/// mutated after it is built. `index` is the ordinal position in the table
/// and is assigned by the registry, not read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object ID sent on the wire.
    pub object_id: u32,
    /// Dotted, globally unique name (e.g. `battery.soc`).
    pub name: String,
    /// Payload type for write requests.
    pub request_data_type: DataType,
    /// Payload type of responses.
    pub response_data_type: DataType,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Value the simulator answers with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_value: Option<Value>,
    /// Position in the registry.
    #[serde(skip)]
    pub index: usize,
}

impl ObjectDescriptor {
    /// Create a descriptor using the same type for requests and responses.
    pub fn new(object_id: u32, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            object_id,
            name: name.into(),
            request_data_type: data_type,
            response_data_type: data_type,
            description: None,
            unit: None,
            sim_value: None,
            index: 0,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the unit.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the simulator value.
    pub fn sim_value(mut self, value: Value) -> Self {
        self.sim_value = Some(value);
        self
    }
}
