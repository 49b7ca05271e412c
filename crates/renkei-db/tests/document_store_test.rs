//! Tests for the document-store adapter against a mock HTTP server

use mockito::Matcher;
use renkei_core::config::{CmsMode, HybridConfig};
use renkei_core::record::FieldMap;
use renkei_core::registry::{FieldSchema, PropertyKind};
use renkei_core::ContentError;
use renkei_db::document::{DocumentClient, DocumentStore};
use renkei_db::store::{ContentStore, QueryOptions, SortDirection};
use serde_json::json;
use std::sync::Arc;

fn test_config(base_url: &str) -> HybridConfig {
	HybridConfig::new()
		.with_cms_mode(CmsMode::Hybrid)
		.with_document_store(true)
		.with_document_api_token("test-token")
		.with_document_api_url(base_url)
}

fn news_schema() -> FieldSchema {
	[
		("title".to_string(), PropertyKind::Title),
		("content".to_string(), PropertyKind::RichText),
		("status".to_string(), PropertyKind::Select),
	]
	.into_iter()
	.collect()
}

fn store_for(server: &mockito::Server) -> DocumentStore {
	let config = test_config(&server.url());
	let client = Arc::new(DocumentClient::new(&config).unwrap());
	DocumentStore::new(client, "db-1", news_schema())
}

fn sample_page(id: &str, title: &str) -> serde_json::Value {
	json!({
		"id": id,
		"created_time": "2025-01-10T08:00:00.000Z",
		"last_edited_time": "2025-01-12T08:00:00.000Z",
		"properties": {
			"title": { "type": "title", "title": [{ "plain_text": title }] },
			"status": { "type": "select", "select": { "name": "draft" } },
		}
	})
}

#[tokio::test]
async fn query_decodes_pages_and_reports_pagination() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/v1/databases/db-1/query")
		.match_header("authorization", "Bearer test-token")
		.match_body(Matcher::PartialJson(json!({ "page_size": 100 })))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(
			json!({
				"results": [sample_page("p1", "First"), sample_page("p2", "Second")],
				"has_more": true,
				"next_cursor": "cursor-xyz",
			})
			.to_string(),
		)
		.expect(1)
		.create_async()
		.await;

	let store = store_for(&server);
	let page = store.query(&QueryOptions::new()).await.unwrap();

	assert_eq!(page.count, 2);
	assert!(page.has_more);
	assert_eq!(page.next_cursor.as_deref(), Some("cursor-xyz"));
	assert_eq!(page.data[0].id, "p1");
	assert_eq!(page.data[0].str_field("title"), Some("First"));
	assert_eq!(page.data[1].str_field("status"), Some("draft"));
	mock.assert_async().await;
}

#[tokio::test]
async fn query_translates_filters_and_sort_through_the_schema() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/v1/databases/db-1/query")
		.match_body(Matcher::PartialJson(json!({
			"filter": { "property": "status", "select": { "equals": "published" } },
			"sorts": [{ "timestamp": "last_edited_time", "direction": "descending" }],
			"page_size": 5,
		})))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(json!({ "results": [], "has_more": false, "next_cursor": null }).to_string())
		.expect(1)
		.create_async()
		.await;

	let store = store_for(&server);
	let options = QueryOptions::new()
		.with_filter("status", "published")
		.with_sort("updated_at", SortDirection::Descending)
		.with_limit(5);
	let page = store.query(&options).await.unwrap();

	assert_eq!(page.count, 0);
	assert!(!page.has_more);
	mock.assert_async().await;
}

#[tokio::test]
async fn create_posts_encoded_properties_under_the_parent_database() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/v1/pages")
		.match_body(Matcher::PartialJson(json!({
			"parent": { "database_id": "db-1" },
			"properties": {
				"title": { "title": [{ "text": { "content": "New post" } }] },
				"status": { "select": { "name": "draft" } },
			},
		})))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(sample_page("p-new", "New post").to_string())
		.expect(1)
		.create_async()
		.await;

	let store = store_for(&server);
	let mut fields = FieldMap::new();
	fields.insert("title".to_string(), "New post".into());
	fields.insert("status".to_string(), "draft".into());
	let record = store.create(&fields).await.unwrap();

	assert_eq!(record.id, "p-new");
	mock.assert_async().await;
}

#[tokio::test]
async fn delete_archives_instead_of_removing() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("PATCH", "/v1/pages/p1")
		.match_body(Matcher::PartialJson(json!({ "archived": true })))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(sample_page("p1", "First").to_string())
		.expect(1)
		.create_async()
		.await;

	let store = store_for(&server);
	store.delete("p1").await.unwrap();
	mock.assert_async().await;
}

#[tokio::test]
async fn get_surfaces_missing_pages_as_not_found() {
	let mut server = mockito::Server::new_async().await;
	server
		.mock("GET", "/v1/pages/missing")
		.with_status(404)
		.with_header("content-type", "application/json")
		.with_body(json!({ "object": "error", "status": 404 }).to_string())
		.create_async()
		.await;

	let store = store_for(&server);
	let err = store.get("missing").await.unwrap_err();
	assert!(matches!(err, ContentError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn backend_failures_propagate_unchanged_as_transport_errors() {
	let mut server = mockito::Server::new_async().await;
	server
		.mock("POST", "/v1/databases/db-1/query")
		.with_status(503)
		.with_header("content-type", "application/json")
		.with_body(json!({ "message": "service unavailable" }).to_string())
		.create_async()
		.await;

	let store = store_for(&server);
	let err = store.query(&QueryOptions::new()).await.unwrap_err();
	match err {
		ContentError::Transport(message) => {
			assert!(message.contains("503"), "message should name the status: {message}");
		}
		other => panic!("expected Transport, got {other:?}"),
	}
}

#[tokio::test]
async fn missing_token_is_a_configuration_error() {
	let config = HybridConfig::new().with_cms_mode(CmsMode::Hybrid);
	let err = DocumentClient::new(&config).unwrap_err();
	assert!(matches!(err, ContentError::Configuration(_)));
}
