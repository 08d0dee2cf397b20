//! Registry module - object descriptors and their lookup table.
//!
//! Provides:
//! - [`ObjectDescriptor`] - metadata for one object
//! - [`Registry`] - immutable ID / name lookup, built once and shared
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rctclient::registry::Registry;
//!
//! let registry = Arc::new(Registry::builtin());
//! let soc = registry.resolve_by_name("battery.soc").unwrap();
//! assert_eq!(soc.object_id, 0x959930BF);
//! ```

mod builtin;
mod descriptor;
mod object_registry;

pub use descriptor::ObjectDescriptor;
pub use object_registry::Registry;
