//! The uniform content store contract
//!
//! `ContentStore` is the only surface the rest of the application is
//! allowed to depend on, per content type: `query`, `create`, `update`,
//! `delete`, `get`. Both adapters and the hybrid router implement it, and
//! every implementation speaks `StandardRecord`; no backend-specific
//! shape crosses this boundary.

use async_trait::async_trait;
use renkei_core::record::{FieldMap, FieldValue, StandardRecord};
use renkei_core::Result;
use serde::{Deserialize, Serialize};

/// Equality predicate on one field. A `Null` value matches records where
/// the field is null.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
	pub field: String,
	pub value: FieldValue,
}

/// Case-insensitive text search OR'd across a set of text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
	pub query: String,
	pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
	Ascending,
	Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
	pub field: String,
	pub direction: SortDirection,
}

/// Backend-agnostic query options. Adapters translate these into their
/// store's native predicates.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
	pub filters: Vec<FieldFilter>,
	pub search: Option<TextSearch>,
	pub sort: Option<SortSpec>,
	pub limit: Option<u32>,
	/// Offset pagination; honored by the relational path only.
	pub offset: Option<u32>,
	/// Cursor pagination; honored by the document path only.
	pub cursor: Option<String>,
}

impl QueryOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.filters.push(FieldFilter {
			field: field.into(),
			value: value.into(),
		});
		self
	}

	pub fn with_search(mut self, query: impl Into<String>, fields: Vec<String>) -> Self {
		self.search = Some(TextSearch {
			query: query.into(),
			fields,
		});
		self
	}

	pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
		self.sort = Some(SortSpec {
			field: field.into(),
			direction,
		});
		self
	}

	pub fn with_limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn with_offset(mut self, offset: u32) -> Self {
		self.offset = Some(offset);
		self
	}

	pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
		self.cursor = Some(cursor.into());
		self
	}
}

/// One page of query results.
///
/// The relational path always reports `has_more: false` and no cursor,
/// a documented asymmetry versus the document path, kept until a
/// pagination contract says otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
	pub data: Vec<StandardRecord>,
	pub count: usize,
	pub has_more: bool,
	pub next_cursor: Option<String>,
}

/// Uniform CRUD contract over one content type's backing store.
#[async_trait]
pub trait ContentStore: Send + Sync {
	async fn query(&self, options: &QueryOptions) -> Result<QueryPage>;

	async fn create(&self, fields: &FieldMap) -> Result<StandardRecord>;

	async fn update(&self, id: &str, fields: &FieldMap) -> Result<StandardRecord>;

	/// Removes the record from the caller's view. The document path
	/// archives (soft delete); the relational path deletes the row.
	async fn delete(&self, id: &str) -> Result<()>;

	async fn get(&self, id: &str) -> Result<StandardRecord>;
}
