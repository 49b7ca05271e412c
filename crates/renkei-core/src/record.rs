//! Canonical content record shape
//!
//! Every adapter, regardless of backing store, produces and accepts
//! `StandardRecord`. No backend-specific field ever leaks to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open set of named fields on a record.
///
/// Ordered so serialized records are deterministic, which matters for the
/// JSON-based search and for backup snapshots.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A field value as seen by callers: one of the five scalar/array kinds,
/// or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	Null,
	Bool(bool),
	Number(f64),
	Timestamp(DateTime<Utc>),
	String(String),
	StringList(Vec<String>),
}

impl FieldValue {
	/// Returns the string content, if this is a string value.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			FieldValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			FieldValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			FieldValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
		match self {
			FieldValue::Timestamp(ts) => Some(*ts),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[String]> {
		match self {
			FieldValue::StringList(items) => Some(items),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, FieldValue::Null)
	}

	/// True when the value carries no content: null, an empty string, or
	/// an empty list. Used by the per-type required-fields validation.
	pub fn is_empty(&self) -> bool {
		match self {
			FieldValue::Null => true,
			FieldValue::String(s) => s.is_empty(),
			FieldValue::StringList(items) => items.is_empty(),
			_ => false,
		}
	}
}

impl From<&str> for FieldValue {
	fn from(s: &str) -> Self {
		FieldValue::String(s.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(s: String) -> Self {
		FieldValue::String(s)
	}
}

impl From<f64> for FieldValue {
	fn from(n: f64) -> Self {
		FieldValue::Number(n)
	}
}

impl From<i64> for FieldValue {
	fn from(n: i64) -> Self {
		FieldValue::Number(n as f64)
	}
}

impl From<i32> for FieldValue {
	fn from(n: i32) -> Self {
		FieldValue::Number(n as f64)
	}
}

impl From<bool> for FieldValue {
	fn from(b: bool) -> Self {
		FieldValue::Bool(b)
	}
}

impl From<DateTime<Utc>> for FieldValue {
	fn from(ts: DateTime<Utc>) -> Self {
		FieldValue::Timestamp(ts)
	}
}

impl From<Vec<String>> for FieldValue {
	fn from(items: Vec<String>) -> Self {
		FieldValue::StringList(items)
	}
}

impl<T> From<Option<T>> for FieldValue
where
	T: Into<FieldValue>,
{
	fn from(value: Option<T>) -> Self {
		match value {
			Some(v) => v.into(),
			None => FieldValue::Null,
		}
	}
}

/// The canonical flat content representation used by all callers,
/// independent of backing store.
///
/// `id`, `created_at` and `updated_at` are server-managed; the open,
/// content-type-specific fields live in `fields` and serialize flattened,
/// so a record reads as one flat JSON object.
///
/// # Examples
///
/// ```
/// use renkei_core::record::StandardRecord;
///
/// let record = StandardRecord::new("abc-123")
///     .with_field("title", "Spring general meeting")
///     .with_field("capacity", 120_i64);
///
/// assert_eq!(record.str_field("title"), Some("Spring general meeting"));
/// assert_eq!(record.field("capacity").and_then(|v| v.as_number()), Some(120.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRecord {
	pub id: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(flatten)]
	pub fields: FieldMap,
}

impl StandardRecord {
	/// Create a record with the given id and current timestamps.
	pub fn new(id: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: id.into(),
			created_at: now,
			updated_at: now,
			fields: FieldMap::new(),
		}
	}

	/// Builder-style field setter.
	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.fields.insert(name.into(), value.into());
		self
	}

	pub fn field(&self, name: &str) -> Option<&FieldValue> {
		self.fields.get(name)
	}

	/// String content of a field, when present and a string.
	pub fn str_field(&self, name: &str) -> Option<&str> {
		self.fields.get(name).and_then(FieldValue::as_str)
	}

	/// True when the field exists and carries content (non-null,
	/// non-empty string/list).
	pub fn has_field(&self, name: &str) -> bool {
		self.fields.get(name).is_some_and(|v| !v.is_empty())
	}
}
