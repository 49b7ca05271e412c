//! # Renkei Core
//!
//! Core types for the renkei hybrid content repository: the canonical
//! record shape every caller sees, the error taxonomy, startup
//! configuration, and the registry of logical content types.
//!
//! Everything backend-specific (property transcoding, HTTP/SQL adapters,
//! routing) lives in `renkei-db`; orchestration lives in `renkei-cms`.
//! This crate is deliberately free of I/O so the data model can be reused
//! from any context.

pub mod config;
pub mod error;
pub mod record;
pub mod registry;

pub use config::{CmsMode, HybridConfig};
pub use error::{ContentError, Result};
pub use record::{FieldMap, FieldValue, StandardRecord};
pub use registry::{
	ContentType, ContentTypeDescriptor, ContentTypeRegistry, FieldSchema, PropertyKind,
};

/// Convenient re-exports of commonly used items
pub mod prelude {
	pub use crate::config::{CmsMode, HybridConfig};
	pub use crate::error::{ContentError, Result};
	pub use crate::record::{FieldMap, FieldValue, StandardRecord};
	pub use crate::registry::{
		ContentType, ContentTypeDescriptor, ContentTypeRegistry, FieldSchema, PropertyKind,
	};
}
