//! Object registry for resolving object IDs and names.
//!
//! The registry maps object IDs and names to descriptors. It is built once
//! at startup and shared read-only (usually behind an `Arc`).
//!
//! # Example
//!
//! ```
//! use rctclient::codec::DataType;
//! use rctclient::registry::{ObjectDescriptor, Registry};
//!
//! let registry = Registry::new(vec![
//!     ObjectDescriptor::new(0x959930BF, "battery.soc", DataType::Float),
//!     ObjectDescriptor::new(0x8B9FF008, "battery.soc_target", DataType::Float),
//! ])
//! .unwrap();
//!
//! assert_eq!(registry.resolve_by_id(0x959930BF).unwrap().name, "battery.soc");
//! assert_eq!(registry.prefix_complete("battery.soc_"), vec!["battery.soc_target"]);
//! ```

use std::collections::HashMap;
use std::path::Path;

use super::ObjectDescriptor;
use crate::client::Target;
use crate::error::RegistryError;

/// Registry mapping object IDs and names to descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Descriptors in table order.
    objects: Vec<ObjectDescriptor>,
    /// Object ID to position.
    by_id: HashMap<u32, usize>,
    /// Name to position.
    by_name: HashMap<String, usize>,
    /// Positions sorted by name (for completion).
    sorted: Vec<usize>,
    /// Length of the longest name.
    max_name_width: usize,
}

impl Registry {
    /// Build a registry from descriptors.
    ///
    /// Assigns each descriptor's `index` from its position and rejects
    /// duplicate IDs or names.
    pub fn new(descriptors: Vec<ObjectDescriptor>) -> Result<Self, RegistryError> {
        let mut objects = Vec::with_capacity(descriptors.len());
        let mut by_id = HashMap::with_capacity(descriptors.len());
        let mut by_name = HashMap::with_capacity(descriptors.len());

        for (index, mut descriptor) in descriptors.into_iter().enumerate() {
            if by_id.insert(descriptor.object_id, index).is_some() {
                return Err(RegistryError::DuplicateId(descriptor.object_id));
            }
            if by_name.insert(descriptor.name.clone(), index).is_some() {
                return Err(RegistryError::DuplicateName(descriptor.name));
            }
            descriptor.index = index;
            objects.push(descriptor);
        }

        let mut sorted: Vec<usize> = (0..objects.len()).collect();
        sorted.sort_by(|&a, &b| objects[a].name.cmp(&objects[b].name));

        let max_name_width = objects
            .iter()
            .map(|o| o.name.chars().count())
            .max()
            .unwrap_or(0);

        Ok(Self {
            objects,
            by_id,
            by_name,
            sorted,
            max_name_width,
        })
    }

    /// Load a registry from a JSON array of descriptors.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let descriptors: Vec<ObjectDescriptor> = serde_json::from_str(json)?;
        Self::new(descriptors)
    }

    /// Load a registry from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Look up a descriptor by object ID.
    pub fn resolve_by_id(&self, object_id: u32) -> Result<&ObjectDescriptor, RegistryError> {
        self.by_id
            .get(&object_id)
            .map(|&i| &self.objects[i])
            .ok_or(RegistryError::IdNotFound(object_id))
    }

    /// Look up a descriptor by exact name.
    pub fn resolve_by_name(&self, name: &str) -> Result<&ObjectDescriptor, RegistryError> {
        self.by_name
            .get(name)
            .map(|&i| &self.objects[i])
            .ok_or_else(|| RegistryError::NameNotFound(name.to_string()))
    }

    /// Look up a descriptor by ID or name.
    pub fn resolve(&self, target: &Target) -> Result<&ObjectDescriptor, RegistryError> {
        match target {
            Target::Id(object_id) => self.resolve_by_id(*object_id),
            Target::Name(name) => self.resolve_by_name(name),
        }
    }

    /// All names starting with `partial`, sorted. Empty `partial` returns all.
    pub fn prefix_complete(&self, partial: &str) -> Vec<&str> {
        self.sorted
            .iter()
            .map(|&i| self.objects[i].name.as_str())
            .filter(|name| name.starts_with(partial))
            .collect()
    }

    /// Length of the longest known name, for aligned output.
    #[inline]
    pub fn max_name_width(&self) -> usize {
        self.max_name_width
    }

    /// Iterate descriptors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectDescriptor> {
        self.objects.iter()
    }

    /// Number of descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
