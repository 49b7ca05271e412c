//! # Renkei DB
//!
//! The hybrid data-access layer of the renkei content repository.
//!
//! The same logical content types can be served from either of two
//! structurally different backing stores:
//!
//! - **Provider A**: a page-per-record, typed-property document service
//!   over HTTP ([`document::DocumentStore`]), with automatic transcoding
//!   between its property model and the flat [`StandardRecord`] shape
//!   ([`property`]).
//! - **Provider B**: a table-per-content-type Postgres store
//!   ([`relational::RelationalStore`]).
//!
//! [`router::HybridRouter`] picks one of the two per content type, once,
//! at construction, from configuration plus per-type resource
//! availability, and exposes the uniform [`store::ContentStore`] contract
//! either way. Callers never learn which backend served a call.
//!
//! [`StandardRecord`]: renkei_core::StandardRecord

pub mod document;
pub mod property;
pub mod relational;
pub mod router;
pub mod store;

pub use document::{DocumentClient, DocumentStore};
pub use relational::RelationalStore;
pub use router::{BackendKind, HybridRepository, HybridRouter};
pub use store::{
	ContentStore, FieldFilter, QueryOptions, QueryPage, SortDirection, SortSpec, TextSearch,
};

/// Convenient re-exports of commonly used items
pub mod prelude {
	pub use crate::document::{DocumentClient, DocumentStore};
	pub use crate::relational::RelationalStore;
	pub use crate::router::{BackendKind, HybridRepository, HybridRouter};
	pub use crate::store::{
		ContentStore, FieldFilter, QueryOptions, QueryPage, SortDirection, SortSpec, TextSearch,
	};
}
