//! Property transcoder
//!
//! Bidirectional mapping between the document service's typed property
//! model and the flat [`StandardRecord`] shape. Decoding is an exhaustive
//! match over [`PropertyValue`]; unrecognized property kinds land in the
//! `Unknown` variant and are skipped, never an error: the remote schema
//! may evolve independently of this code.
//!
//! Known limitation, preserved intentionally: multi-valued list
//! properties (`rich_text`, `files`) keep only their first item.
//!
//! Encoding is driven by the registry-supplied field schema; fields
//! absent from the schema fall back to inferring the kind from the
//! value's type (string named `title` or `name` → title, other strings →
//! rich_text, numbers → number, booleans → checkbox, lists →
//! multi_select, timestamps → date). `id`, `created_at` and `updated_at`
//! are server-managed and never encoded.
//!
//! Pure functions; no I/O.

use chrono::{DateTime, NaiveDate, Utc};
use renkei_core::record::{FieldMap, FieldValue, StandardRecord};
use renkei_core::registry::{FieldSchema, PropertyKind};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One page of the document backend, as returned by its HTTP API.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPage {
	pub id: String,
	#[serde(default)]
	pub created_time: Option<DateTime<Utc>>,
	#[serde(default)]
	pub last_edited_time: Option<DateTime<Utc>>,
	#[serde(default)]
	pub archived: bool,
	#[serde(default)]
	pub properties: BTreeMap<String, PropertyValue>,
}

/// A typed property as the document backend represents it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
	Title {
		title: Vec<RichTextFragment>,
	},
	RichText {
		rich_text: Vec<RichTextFragment>,
	},
	Select {
		select: Option<SelectOption>,
	},
	MultiSelect {
		multi_select: Vec<SelectOption>,
	},
	Number {
		number: Option<f64>,
	},
	Checkbox {
		checkbox: bool,
	},
	Date {
		date: Option<DateValue>,
	},
	Email {
		email: Option<String>,
	},
	Url {
		url: Option<String>,
	},
	Files {
		files: Vec<FileReference>,
	},
	/// Any property kind this code does not model (formula, rollup,
	/// relation, ...). Skipped during decoding.
	#[serde(other)]
	Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichTextFragment {
	#[serde(default)]
	pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
	pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
	pub start: Option<String>,
	#[serde(default)]
	pub end: Option<String>,
}

/// A file attachment: either hosted by the service or an external link.
#[derive(Debug, Clone, Deserialize)]
pub struct FileReference {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub file: Option<FileUrl>,
	#[serde(default)]
	pub external: Option<FileUrl>,
}

impl FileReference {
	pub fn url(&self) -> Option<&str> {
		self.file
			.as_ref()
			.or(self.external.as_ref())
			.map(|f| f.url.as_str())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
	pub url: String,
}

/// Decode a document page into the canonical record shape.
pub fn decode_page(page: DocumentPage) -> StandardRecord {
	let now = Utc::now();
	let mut record = StandardRecord {
		id: page.id,
		created_at: page.created_time.unwrap_or(now),
		updated_at: page.last_edited_time.unwrap_or(now),
		fields: FieldMap::new(),
	};
	for (name, property) in page.properties {
		if let Some(value) = decode_property(property) {
			record.fields.insert(name, value);
		}
	}
	record
}

/// Per-kind extraction to a record value. `None` means the property kind
/// is not modeled and the field is omitted.
fn decode_property(property: PropertyValue) -> Option<FieldValue> {
	let value = match property {
		PropertyValue::Title { title } => FieldValue::String(
			title
				.first()
				.map(|fragment| fragment.plain_text.clone())
				.unwrap_or_default(),
		),
		// First fragment only; trailing fragments are dropped.
		PropertyValue::RichText { rich_text } => rich_text
			.first()
			.map(|fragment| FieldValue::String(fragment.plain_text.clone()))
			.unwrap_or(FieldValue::Null),
		PropertyValue::Select { select } => select
			.map(|option| FieldValue::String(option.name))
			.unwrap_or(FieldValue::Null),
		PropertyValue::MultiSelect { multi_select } => FieldValue::StringList(
			multi_select.into_iter().map(|option| option.name).collect(),
		),
		PropertyValue::Number { number } => {
			number.map(FieldValue::Number).unwrap_or(FieldValue::Null)
		}
		PropertyValue::Checkbox { checkbox } => FieldValue::Bool(checkbox),
		PropertyValue::Date { date } => date
			.and_then(|d| d.start)
			.and_then(|start| parse_date(&start))
			.map(FieldValue::Timestamp)
			.unwrap_or(FieldValue::Null),
		PropertyValue::Email { email } => {
			email.map(FieldValue::String).unwrap_or(FieldValue::Null)
		}
		PropertyValue::Url { url } => url.map(FieldValue::String).unwrap_or(FieldValue::Null),
		// First file only.
		PropertyValue::Files { files } => files
			.first()
			.and_then(|file| file.url())
			.map(|url| FieldValue::String(url.to_string()))
			.unwrap_or(FieldValue::Null),
		PropertyValue::Unknown => return None,
	};
	Some(value)
}

/// Date properties carry either a full RFC 3339 instant or a bare date.
fn parse_date(start: &str) -> Option<DateTime<Utc>> {
	if let Ok(instant) = DateTime::parse_from_rfc3339(start) {
		return Some(instant.with_timezone(&Utc));
	}
	NaiveDate::parse_from_str(start, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Encode record fields into a property-set payload for the document
/// backend.
///
/// The schema decides each field's property kind; unschematized fields
/// fall back to value-type inference. Null values, server-managed fields
/// and values that do not fit their kind are skipped.
pub fn encode_fields(fields: &FieldMap, schema: &FieldSchema) -> Value {
	let mut properties = Map::new();
	for (name, value) in fields {
		if matches!(name.as_str(), "id" | "created_at" | "updated_at") {
			continue;
		}
		if value.is_null() {
			continue;
		}
		let kind = schema
			.get(name)
			.copied()
			.or_else(|| infer_kind(name, value));
		let Some(kind) = kind else { continue };
		if let Some(payload) = encode_property(kind, value) {
			properties.insert(name.clone(), payload);
		}
	}
	Value::Object(properties)
}

/// Historical fallback: infer the property kind from the value's runtime
/// type.
fn infer_kind(name: &str, value: &FieldValue) -> Option<PropertyKind> {
	match value {
		FieldValue::String(_) if name == "title" || name == "name" => Some(PropertyKind::Title),
		FieldValue::String(_) => Some(PropertyKind::RichText),
		FieldValue::Number(_) => Some(PropertyKind::Number),
		FieldValue::Bool(_) => Some(PropertyKind::Checkbox),
		FieldValue::StringList(_) => Some(PropertyKind::MultiSelect),
		FieldValue::Timestamp(_) => Some(PropertyKind::Date),
		FieldValue::Null => None,
	}
}

fn encode_property(kind: PropertyKind, value: &FieldValue) -> Option<Value> {
	match kind {
		PropertyKind::Title => {
			let text = text_content(value)?;
			Some(json!({ "title": [{ "text": { "content": text } }] }))
		}
		PropertyKind::RichText => {
			let text = text_content(value)?;
			Some(json!({ "rich_text": [{ "text": { "content": text } }] }))
		}
		PropertyKind::Select => {
			let name = value.as_str()?;
			Some(json!({ "select": { "name": name } }))
		}
		PropertyKind::MultiSelect => {
			let options: Vec<Value> = match value {
				FieldValue::StringList(items) => {
					items.iter().map(|item| json!({ "name": item })).collect()
				}
				FieldValue::String(item) => vec![json!({ "name": item })],
				_ => return None,
			};
			Some(json!({ "multi_select": options }))
		}
		PropertyKind::Number => Some(json!({ "number": value.as_number()? })),
		PropertyKind::Checkbox => Some(json!({ "checkbox": value.as_bool()? })),
		PropertyKind::Date => {
			let start = match value {
				FieldValue::Timestamp(ts) => ts.to_rfc3339(),
				FieldValue::String(s) => s.clone(),
				_ => return None,
			};
			Some(json!({ "date": { "start": start } }))
		}
		PropertyKind::Email => Some(json!({ "email": value.as_str()? })),
		PropertyKind::Url => Some(json!({ "url": value.as_str()? })),
		PropertyKind::Files => {
			let files: Vec<Value> = match value {
				FieldValue::String(url) => {
					vec![json!({ "name": url, "external": { "url": url } })]
				}
				FieldValue::StringList(urls) => urls
					.iter()
					.map(|url| json!({ "name": url, "external": { "url": url } }))
					.collect(),
				_ => return None,
			};
			Some(json!({ "files": files }))
		}
	}
}

fn text_content(value: &FieldValue) -> Option<String> {
	match value {
		FieldValue::String(s) => Some(s.clone()),
		FieldValue::Number(n) => Some(n.to_string()),
		FieldValue::Timestamp(ts) => Some(ts.to_rfc3339()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn infer_kind_matches_value_types() {
		assert_eq!(
			infer_kind("title", &FieldValue::String("x".into())),
			Some(PropertyKind::Title)
		);
		assert_eq!(
			infer_kind("name", &FieldValue::String("x".into())),
			Some(PropertyKind::Title)
		);
		assert_eq!(
			infer_kind("body", &FieldValue::String("x".into())),
			Some(PropertyKind::RichText)
		);
		assert_eq!(
			infer_kind("count", &FieldValue::Number(1.0)),
			Some(PropertyKind::Number)
		);
		assert_eq!(
			infer_kind("flag", &FieldValue::Bool(true)),
			Some(PropertyKind::Checkbox)
		);
		assert_eq!(infer_kind("anything", &FieldValue::Null), None);
	}

	#[test]
	fn parse_date_accepts_bare_dates_and_instants() {
		let bare = parse_date("2025-04-01").unwrap();
		assert_eq!(bare.to_rfc3339(), "2025-04-01T00:00:00+00:00");

		let instant = parse_date("2025-04-01T09:30:00+09:00").unwrap();
		assert_eq!(instant.to_rfc3339(), "2025-04-01T00:30:00+00:00");

		assert!(parse_date("next tuesday").is_none());
	}

	#[test]
	fn encode_skips_server_managed_and_null_fields() {
		let mut fields = FieldMap::new();
		fields.insert("id".to_string(), "x".into());
		fields.insert("created_at".to_string(), "y".into());
		fields.insert("title".to_string(), "kept".into());
		fields.insert("summary".to_string(), FieldValue::Null);

		let properties = encode_fields(&fields, &FieldSchema::new());
		let object = properties.as_object().unwrap();
		assert_eq!(object.len(), 1);
		assert!(object.contains_key("title"));
	}
}
