//! Document-store adapter (Provider A)
//!
//! A page-per-record, typed-property service over HTTP. [`DocumentClient`]
//! owns the HTTP plumbing (auth, versioning, uniform timeout) and exposes
//! the raw endpoints; [`DocumentStore`] binds a client to one database id
//! plus its field schema and implements [`ContentStore`] through the
//! property transcoder.
//!
//! Failure policy: transport and permission errors from the service
//! propagate unchanged, with no retries and no suppression. The client-side
//! timeout surfaces as the distinct `Timeout` error kind because the
//! service is rate-limited and can stall.

use crate::property::{self, DocumentPage};
use crate::store::{ContentStore, QueryOptions, QueryPage, SortDirection};
use async_trait::async_trait;
use renkei_core::config::HybridConfig;
use renkei_core::record::{FieldMap, FieldValue, StandardRecord};
use renkei_core::registry::{FieldSchema, PropertyKind};
use renkei_core::{ContentError, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Versioning date header required by the document API.
const API_VERSION_HEADER: &str = "Notion-Version";
const API_VERSION: &str = "2022-06-28";

/// Default page size when a query gives no limit.
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Low-level HTTP client for the document backend.
#[derive(Debug)]
pub struct DocumentClient {
	client: reqwest::Client,
	base_url: String,
	token: String,
}

impl DocumentClient {
	/// Build a client from configuration. Requires the API token; the
	/// uniform per-call timeout comes from `request_timeout`.
	pub fn new(config: &HybridConfig) -> Result<Self> {
		let token = config.document_api_token.clone().ok_or_else(|| {
			ContentError::Configuration("document API token not configured".to_string())
		})?;
		let client = reqwest::Client::builder()
			.timeout(config.request_timeout)
			.build()
			.map_err(|e| {
				ContentError::Configuration(format!("failed to create HTTP client: {}", e))
			})?;
		Ok(Self {
			client,
			base_url: config.document_api_url.trim_end_matches('/').to_string(),
			token,
		})
	}

	fn build_url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path)
	}

	async fn request<T: DeserializeOwned>(
		&self,
		method: Method,
		path: &str,
		body: Option<Value>,
	) -> Result<T> {
		let url = self.build_url(path);
		let mut req = self
			.client
			.request(method, &url)
			.bearer_auth(&self.token)
			.header(API_VERSION_HEADER, API_VERSION);
		if let Some(body) = body {
			req = req.json(&body);
		}

		let response = req.send().await.map_err(|e| {
			if e.is_timeout() {
				ContentError::Timeout(format!("document API request to {} timed out", url))
			} else {
				ContentError::Transport(format!("document API request failed: {}", e))
			}
		})?;

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			return Err(ContentError::NotFound(format!(
				"document API object not found: {}",
				url
			)));
		}
		if !status.is_success() {
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "unknown error".to_string());
			return Err(ContentError::Transport(format!(
				"document API returned {}: {}",
				status, error_text
			)));
		}

		response
			.json()
			.await
			.map_err(|e| ContentError::Serialization(format!("failed to parse response: {}", e)))
	}

	/// Paginated query over one database.
	pub async fn query_database(&self, database_id: &str, body: Value) -> Result<QueryResponse> {
		self.request(
			Method::POST,
			&format!("v1/databases/{}/query", database_id),
			Some(body),
		)
		.await
	}

	pub async fn create_page(&self, database_id: &str, properties: Value) -> Result<DocumentPage> {
		let body = json!({
			"parent": { "database_id": database_id },
			"properties": properties,
		});
		self.request(Method::POST, "v1/pages", Some(body)).await
	}

	pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<DocumentPage> {
		let body = json!({ "properties": properties });
		self.request(Method::PATCH, &format!("v1/pages/{}", page_id), Some(body))
			.await
	}

	/// Soft delete: the page is archived, never physically removed.
	pub async fn archive_page(&self, page_id: &str) -> Result<DocumentPage> {
		let body = json!({ "archived": true });
		self.request(Method::PATCH, &format!("v1/pages/{}", page_id), Some(body))
			.await
	}

	pub async fn retrieve_page(&self, page_id: &str) -> Result<DocumentPage> {
		self.request(Method::GET, &format!("v1/pages/{}", page_id), None)
			.await
	}

	/// Lightweight existence check used by the connectivity health check.
	pub async fn retrieve_database(&self, database_id: &str) -> Result<Value> {
		self.request(Method::GET, &format!("v1/databases/{}", database_id), None)
			.await
	}
}

/// Response envelope of a database query.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
	pub results: Vec<DocumentPage>,
	#[serde(default)]
	pub has_more: bool,
	#[serde(default)]
	pub next_cursor: Option<String>,
}

/// `ContentStore` over one document database.
pub struct DocumentStore {
	client: Arc<DocumentClient>,
	database_id: String,
	schema: FieldSchema,
}

impl DocumentStore {
	pub fn new(client: Arc<DocumentClient>, database_id: impl Into<String>, schema: FieldSchema) -> Self {
		Self {
			client,
			database_id: database_id.into(),
			schema,
		}
	}

	fn query_body(&self, options: &QueryOptions) -> Value {
		let mut body = serde_json::Map::new();
		body.insert(
			"page_size".to_string(),
			json!(options.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
		);
		if let Some(cursor) = &options.cursor {
			body.insert("start_cursor".to_string(), json!(cursor));
		}

		let mut conditions: Vec<Value> = options
			.filters
			.iter()
			.filter_map(|f| self.filter_condition(&f.field, &f.value))
			.collect();
		if let Some(search) = &options.search {
			let terms: Vec<Value> = search
				.fields
				.iter()
				.map(|field| self.contains_condition(field, &search.query))
				.collect();
			if !terms.is_empty() {
				conditions.push(json!({ "or": terms }));
			}
		}
		match conditions.len() {
			0 => {}
			1 => {
				body.insert("filter".to_string(), conditions.remove(0));
			}
			_ => {
				body.insert("filter".to_string(), json!({ "and": conditions }));
			}
		}

		if let Some(sort) = &options.sort {
			let direction = match sort.direction {
				SortDirection::Ascending => "ascending",
				SortDirection::Descending => "descending",
			};
			// Server-managed timestamps sort via the timestamp clause,
			// everything else by property.
			let clause = match sort.field.as_str() {
				"created_at" => json!({ "timestamp": "created_time", "direction": direction }),
				"updated_at" => {
					json!({ "timestamp": "last_edited_time", "direction": direction })
				}
				field => json!({ "property": field, "direction": direction }),
			};
			body.insert("sorts".to_string(), json!([clause]));
		}

		Value::Object(body)
	}

	/// Equality filter translated through the field schema.
	fn filter_condition(&self, field: &str, value: &FieldValue) -> Option<Value> {
		let kind = self.schema.get(field).copied()?;
		let condition = match (kind, value) {
			(PropertyKind::Title, FieldValue::String(s)) => json!({ "title": { "equals": s } }),
			(PropertyKind::RichText, FieldValue::String(s)) => {
				json!({ "rich_text": { "equals": s } })
			}
			(PropertyKind::Select, FieldValue::String(s)) => json!({ "select": { "equals": s } }),
			(PropertyKind::MultiSelect, FieldValue::String(s)) => {
				json!({ "multi_select": { "contains": s } })
			}
			(PropertyKind::Number, FieldValue::Number(n)) => json!({ "number": { "equals": n } }),
			(PropertyKind::Checkbox, FieldValue::Bool(b)) => {
				json!({ "checkbox": { "equals": b } })
			}
			(PropertyKind::Date, FieldValue::Timestamp(ts)) => {
				json!({ "date": { "equals": ts.to_rfc3339() } })
			}
			(PropertyKind::Date, FieldValue::String(s)) => json!({ "date": { "equals": s } }),
			(PropertyKind::Email, FieldValue::String(s)) => json!({ "email": { "equals": s } }),
			(PropertyKind::Url, FieldValue::String(s)) => json!({ "url": { "equals": s } }),
			// Files are not filterable; mismatched shapes are dropped.
			_ => return None,
		};
		let mut object = serde_json::Map::new();
		object.insert("property".to_string(), json!(field));
		if let Value::Object(clause) = condition {
			object.extend(clause);
		}
		Some(Value::Object(object))
	}

	fn contains_condition(&self, field: &str, query: &str) -> Value {
		match self.schema.get(field) {
			Some(PropertyKind::Title) => {
				json!({ "property": field, "title": { "contains": query } })
			}
			_ => json!({ "property": field, "rich_text": { "contains": query } }),
		}
	}
}

#[async_trait]
impl ContentStore for DocumentStore {
	async fn query(&self, options: &QueryOptions) -> Result<QueryPage> {
		let body = self.query_body(options);
		let response = self.client.query_database(&self.database_id, body).await?;
		let data: Vec<StandardRecord> = response
			.results
			.into_iter()
			.map(property::decode_page)
			.collect();
		tracing::debug!(
			database = %self.database_id,
			count = data.len(),
			has_more = response.has_more,
			"document query"
		);
		Ok(QueryPage {
			count: data.len(),
			has_more: response.has_more,
			next_cursor: response.next_cursor,
			data,
		})
	}

	async fn create(&self, fields: &FieldMap) -> Result<StandardRecord> {
		let properties = property::encode_fields(fields, &self.schema);
		let page = self.client.create_page(&self.database_id, properties).await?;
		Ok(property::decode_page(page))
	}

	async fn update(&self, id: &str, fields: &FieldMap) -> Result<StandardRecord> {
		let properties = property::encode_fields(fields, &self.schema);
		let page = self.client.update_page(id, properties).await?;
		Ok(property::decode_page(page))
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.client.archive_page(id).await?;
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<StandardRecord> {
		let page = self.client.retrieve_page(id).await?;
		Ok(property::decode_page(page))
	}
}
