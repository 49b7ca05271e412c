//! Tests for the property transcoder

use renkei_core::record::{FieldMap, FieldValue};
use renkei_core::registry::{FieldSchema, PropertyKind};
use renkei_db::property::{decode_page, encode_fields, DocumentPage};
use rstest::rstest;
use serde_json::json;

fn page_with(properties: serde_json::Value) -> DocumentPage {
	serde_json::from_value(json!({
		"id": "page-1",
		"created_time": "2025-01-15T09:00:00.000Z",
		"last_edited_time": "2025-02-01T10:30:00.000Z",
		"archived": false,
		"properties": properties,
	}))
	.unwrap()
}

#[test]
fn decodes_every_modeled_property_kind() {
	let page = page_with(json!({
		"title": { "type": "title", "title": [{ "plain_text": "春の総会" }] },
		"content": { "type": "rich_text", "rich_text": [{ "plain_text": "本文" }] },
		"category": { "type": "select", "select": { "name": "announcement" } },
		"tags": { "type": "multi_select", "multi_select": [{ "name": "起業" }, { "name": "ボランティア" }] },
		"capacity": { "type": "number", "number": 120.0 },
		"pinned": { "type": "checkbox", "checkbox": true },
		"event_date": { "type": "date", "date": { "start": "2025-03-20T18:00:00.000+09:00" } },
		"email": { "type": "email", "email": "contact@example.org" },
		"website": { "type": "url", "url": "https://example.org" },
		"logo": { "type": "files", "files": [
			{ "name": "logo.png", "file": { "url": "https://files.example.org/logo.png" } }
		] },
	}));

	let record = decode_page(page);
	assert_eq!(record.id, "page-1");
	assert_eq!(record.created_at.to_rfc3339(), "2025-01-15T09:00:00+00:00");
	assert_eq!(record.str_field("title"), Some("春の総会"));
	assert_eq!(record.str_field("content"), Some("本文"));
	assert_eq!(record.str_field("category"), Some("announcement"));
	assert_eq!(
		record.field("tags").and_then(|v| v.as_list()),
		Some(&["起業".to_string(), "ボランティア".to_string()][..])
	);
	assert_eq!(record.field("capacity").and_then(|v| v.as_number()), Some(120.0));
	assert_eq!(record.field("pinned").and_then(|v| v.as_bool()), Some(true));
	assert_eq!(
		record
			.field("event_date")
			.and_then(|v| v.as_timestamp())
			.map(|ts| ts.to_rfc3339()),
		Some("2025-03-20T09:00:00+00:00".to_string())
	);
	assert_eq!(record.str_field("email"), Some("contact@example.org"));
	assert_eq!(record.str_field("website"), Some("https://example.org"));
	assert_eq!(
		record.str_field("logo"),
		Some("https://files.example.org/logo.png")
	);
}

#[rstest]
#[case::select(json!({ "type": "select", "select": null }))]
#[case::number(json!({ "type": "number", "number": null }))]
#[case::date(json!({ "type": "date", "date": null }))]
#[case::email(json!({ "type": "email", "email": null }))]
#[case::url(json!({ "type": "url", "url": null }))]
#[case::rich_text(json!({ "type": "rich_text", "rich_text": [] }))]
#[case::files(json!({ "type": "files", "files": [] }))]
fn absent_optional_properties_decode_to_null(#[case] property: serde_json::Value) {
	let page = page_with(json!({ "field": property }));
	let record = decode_page(page);
	assert_eq!(record.field("field"), Some(&FieldValue::Null));
}

#[test]
fn empty_title_decodes_to_empty_string() {
	let page = page_with(json!({ "title": { "type": "title", "title": [] } }));
	let record = decode_page(page);
	assert_eq!(record.str_field("title"), Some(""));
}

#[test]
fn unrecognized_property_kind_is_skipped_without_error() {
	let page = page_with(json!({
		"title": { "type": "title", "title": [{ "plain_text": "kept" }] },
		"computed": { "type": "formula", "formula": { "type": "number", "number": 7 } },
	}));
	let record = decode_page(page);
	assert_eq!(record.str_field("title"), Some("kept"));
	assert!(record.field("computed").is_none());
}

#[test]
fn list_properties_keep_only_the_first_item() {
	let page = page_with(json!({
		"content": { "type": "rich_text", "rich_text": [
			{ "plain_text": "first" },
			{ "plain_text": "second" },
		] },
		"attachments": { "type": "files", "files": [
			{ "name": "a.pdf", "external": { "url": "https://example.org/a.pdf" } },
			{ "name": "b.pdf", "external": { "url": "https://example.org/b.pdf" } },
		] },
	}));
	let record = decode_page(page);
	assert_eq!(record.str_field("content"), Some("first"));
	assert_eq!(record.str_field("attachments"), Some("https://example.org/a.pdf"));
}

#[test]
fn bare_dates_decode_to_midnight_utc() {
	let page = page_with(json!({
		"joined_at": { "type": "date", "date": { "start": "2024-11-05" } },
	}));
	let record = decode_page(page);
	assert_eq!(
		record
			.field("joined_at")
			.and_then(|v| v.as_timestamp())
			.map(|ts| ts.to_rfc3339()),
		Some("2024-11-05T00:00:00+00:00".to_string())
	);
}

fn schema_of(pairs: &[(&str, PropertyKind)]) -> FieldSchema {
	pairs.iter().map(|(n, k)| (n.to_string(), *k)).collect()
}

#[test]
fn encode_follows_the_field_schema() {
	let schema = schema_of(&[
		("title", PropertyKind::Title),
		("status", PropertyKind::Select),
		("tags", PropertyKind::MultiSelect),
		("website", PropertyKind::Url),
	]);
	let mut fields = FieldMap::new();
	fields.insert("title".to_string(), "Annual report".into());
	// Without the schema this string would fall back to rich_text.
	fields.insert("status".to_string(), "published".into());
	fields.insert("tags".to_string(), vec!["news".to_string()].into());
	fields.insert("website".to_string(), "https://example.org".into());

	let properties = encode_fields(&fields, &schema);
	assert_eq!(
		properties["title"],
		json!({ "title": [{ "text": { "content": "Annual report" } }] })
	);
	assert_eq!(properties["status"], json!({ "select": { "name": "published" } }));
	assert_eq!(
		properties["tags"],
		json!({ "multi_select": [{ "name": "news" }] })
	);
	assert_eq!(properties["website"], json!({ "url": "https://example.org" }));
}

#[test]
fn encode_falls_back_to_value_type_inference() {
	let mut fields = FieldMap::new();
	fields.insert("name".to_string(), "Partner Co".into());
	fields.insert("summary".to_string(), "A partner.".into());
	fields.insert("amount".to_string(), 50000_i64.into());
	fields.insert("public".to_string(), true.into());
	fields.insert(
		"areas".to_string(),
		vec!["kanto".to_string(), "kansai".to_string()].into(),
	);

	let properties = encode_fields(&fields, &FieldSchema::new());
	assert_eq!(
		properties["name"],
		json!({ "title": [{ "text": { "content": "Partner Co" } }] })
	);
	assert_eq!(
		properties["summary"],
		json!({ "rich_text": [{ "text": { "content": "A partner." } }] })
	);
	assert_eq!(properties["amount"], json!({ "number": 50000.0 }));
	assert_eq!(properties["public"], json!({ "checkbox": true }));
	assert_eq!(
		properties["areas"],
		json!({ "multi_select": [{ "name": "kanto" }, { "name": "kansai" }] })
	);
}

#[test]
fn encode_never_emits_server_managed_fields() {
	let mut fields = FieldMap::new();
	fields.insert("id".to_string(), "not-yours".into());
	fields.insert("created_at".to_string(), "2020-01-01".into());
	fields.insert("updated_at".to_string(), "2020-01-01".into());
	fields.insert("title".to_string(), "ok".into());

	let properties = encode_fields(&fields, &FieldSchema::new());
	let object = properties.as_object().unwrap();
	assert_eq!(object.keys().collect::<Vec<_>>(), vec!["title"]);
}
