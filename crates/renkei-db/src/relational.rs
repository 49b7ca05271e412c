//! Relational-store adapter (Provider B)
//!
//! A table-per-content-type Postgres store. Query semantics mirror the
//! document path where the stores overlap: equality filters, an OR'd
//! ILIKE match across the descriptor's search fields, sorting, and
//! offset/limit pagination. `delete` here is a hard delete.
//!
//! `has_more` is always reported `false` and no cursor is produced, a
//! known asymmetry versus the document path, kept deliberately until a
//! pagination contract specifies otherwise.
//!
//! Rows decode dynamically: per column, a `try_get` fallback chain over
//! the supported scalar kinds; columns of other types are skipped so a
//! widened table cannot break reads.

use crate::store::{ContentStore, QueryOptions, QueryPage, SortDirection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use renkei_core::config::HybridConfig;
use renkei_core::record::{FieldMap, FieldValue, StandardRecord};
use renkei_core::{ContentError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::{Column, QueryBuilder, Row};
use std::time::Duration;
use uuid::Uuid;

/// Build a lazily connecting pool from configuration.
pub fn build_pool(config: &HybridConfig) -> Result<PgPool> {
	let url = config.database_url.as_deref().ok_or_else(|| {
		ContentError::Configuration("DATABASE_URL not configured".to_string())
	})?;
	PgPoolOptions::new()
		.acquire_timeout(config.request_timeout)
		.connect_lazy(url)
		.map_err(|e| ContentError::Configuration(format!("invalid database URL: {}", e)))
}

/// `ContentStore` over one relational table.
pub struct RelationalStore {
	pool: PgPool,
	table: String,
	timeout: Duration,
}

impl RelationalStore {
	pub fn new(pool: PgPool, table: impl Into<String>, timeout: Duration) -> Result<Self> {
		let table = table.into();
		validate_identifier(&table)?;
		Ok(Self {
			pool,
			table,
			timeout,
		})
	}

	/// Run a statement future under the uniform per-call timeout.
	async fn timed<T, F>(&self, what: &str, fut: F) -> Result<T>
	where
		F: std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
	{
		match tokio::time::timeout(self.timeout, fut).await {
			Ok(result) => result.map_err(from_sqlx),
			Err(_) => Err(ContentError::Timeout(format!(
				"{} on table {} timed out",
				what, self.table
			))),
		}
	}
}

#[async_trait]
impl ContentStore for RelationalStore {
	async fn query(&self, options: &QueryOptions) -> Result<QueryPage> {
		let mut builder = select_builder(&self.table, options)?;
		let rows = self
			.timed("query", builder.build().fetch_all(&self.pool))
			.await?;
		let data: Vec<StandardRecord> = rows.iter().map(decode_row).collect();
		tracing::debug!(table = %self.table, count = data.len(), "relational query");
		Ok(QueryPage {
			count: data.len(),
			// No true has-more flag on this path; see module docs.
			has_more: false,
			next_cursor: None,
			data,
		})
	}

	async fn create(&self, fields: &FieldMap) -> Result<StandardRecord> {
		let id = Uuid::new_v4().to_string();
		let now = Utc::now();

		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO ");
		builder.push(&self.table);
		builder.push(" (id, created_at, updated_at");
		for name in fields.keys() {
			validate_identifier(name)?;
			builder.push(", ");
			builder.push(name);
		}
		builder.push(") VALUES (");
		builder.push_bind(id);
		builder.push(", ");
		builder.push_bind(now);
		builder.push(", ");
		builder.push_bind(now);
		for value in fields.values() {
			builder.push(", ");
			push_value(&mut builder, value);
		}
		builder.push(") RETURNING *");

		let row = self
			.timed("insert", builder.build().fetch_one(&self.pool))
			.await?;
		Ok(decode_row(&row))
	}

	async fn update(&self, id: &str, fields: &FieldMap) -> Result<StandardRecord> {
		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
		builder.push(&self.table);
		builder.push(" SET updated_at = ");
		builder.push_bind(Utc::now());
		for (name, value) in fields {
			validate_identifier(name)?;
			builder.push(", ");
			builder.push(name);
			builder.push(" = ");
			push_value(&mut builder, value);
		}
		builder.push(" WHERE id = ");
		builder.push_bind(id.to_string());
		builder.push(" RETURNING *");

		let row = self
			.timed("update", builder.build().fetch_optional(&self.pool))
			.await?
			.ok_or_else(|| not_found(&self.table, id))?;
		Ok(decode_row(&row))
	}

	async fn delete(&self, id: &str) -> Result<()> {
		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("DELETE FROM ");
		builder.push(&self.table);
		builder.push(" WHERE id = ");
		builder.push_bind(id.to_string());

		let result = self
			.timed("delete", builder.build().execute(&self.pool))
			.await?;
		if result.rows_affected() == 0 {
			return Err(not_found(&self.table, id));
		}
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<StandardRecord> {
		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM ");
		builder.push(&self.table);
		builder.push(" WHERE id = ");
		builder.push_bind(id.to_string());

		let row = self
			.timed("select", builder.build().fetch_optional(&self.pool))
			.await?
			.ok_or_else(|| not_found(&self.table, id))?;
		Ok(decode_row(&row))
	}
}

fn not_found(table: &str, id: &str) -> ContentError {
	ContentError::NotFound(format!("no record {} in table {}", id, table))
}

fn from_sqlx(err: sqlx::Error) -> ContentError {
	match err {
		sqlx::Error::RowNotFound => ContentError::NotFound(err.to_string()),
		sqlx::Error::PoolTimedOut => ContentError::Timeout(err.to_string()),
		other => ContentError::Transport(other.to_string()),
	}
}

/// Identifiers cannot be bound as parameters; only plain snake_case
/// names ever reach the SQL text.
fn validate_identifier(name: &str) -> Result<()> {
	let mut chars = name.chars();
	let valid = match chars.next() {
		Some(first) => {
			(first.is_ascii_alphabetic() || first == '_')
				&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		}
		None => false,
	};
	if valid {
		Ok(())
	} else {
		Err(ContentError::Configuration(format!(
			"invalid SQL identifier: {:?}",
			name
		)))
	}
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
	match value {
		FieldValue::Null => {
			builder.push("NULL");
		}
		FieldValue::Bool(b) => {
			builder.push_bind(*b);
		}
		FieldValue::Number(n) => {
			builder.push_bind(*n);
		}
		FieldValue::Timestamp(ts) => {
			builder.push_bind(*ts);
		}
		FieldValue::String(s) => {
			builder.push_bind(s.clone());
		}
		FieldValue::StringList(items) => {
			builder.push_bind(items.clone());
		}
	}
}

fn select_builder<'a>(
	table: &str,
	options: &QueryOptions,
) -> Result<QueryBuilder<'a, Postgres>> {
	let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM ");
	builder.push(table);

	let mut has_where = false;
	for filter in &options.filters {
		validate_identifier(&filter.field)?;
		builder.push(if has_where { " AND " } else { " WHERE " });
		has_where = true;
		builder.push(&filter.field);
		if filter.value.is_null() {
			builder.push(" IS NULL");
		} else {
			builder.push(" = ");
			push_value(&mut builder, &filter.value);
		}
	}

	if let Some(search) = &options.search {
		if !search.fields.is_empty() {
			let pattern = format!("%{}%", search.query);
			builder.push(if has_where { " AND (" } else { " WHERE (" });
			has_where = true;
			for (i, field) in search.fields.iter().enumerate() {
				validate_identifier(field)?;
				if i > 0 {
					builder.push(" OR ");
				}
				builder.push(field);
				builder.push(" ILIKE ");
				builder.push_bind(pattern.clone());
			}
			builder.push(")");
		}
	}

	if let Some(sort) = &options.sort {
		validate_identifier(&sort.field)?;
		builder.push(" ORDER BY ");
		builder.push(&sort.field);
		builder.push(match sort.direction {
			SortDirection::Ascending => " ASC",
			SortDirection::Descending => " DESC",
		});
	}

	if let Some(limit) = options.limit {
		builder.push(" LIMIT ");
		builder.push_bind(limit as i64);
	}
	if let Some(offset) = options.offset {
		builder.push(" OFFSET ");
		builder.push_bind(offset as i64);
	}

	Ok(builder)
}

/// Decode one row into the canonical record shape.
///
/// `id` may be text or uuid; `created_at`/`updated_at` must be
/// timestamptz. Remaining columns go through a typed fallback chain and
/// unsupported column types are skipped.
fn decode_row(row: &PgRow) -> StandardRecord {
	let id = row
		.try_get::<String, _>("id")
		.or_else(|_| row.try_get::<Uuid, _>("id").map(|u| u.to_string()))
		.unwrap_or_default();
	let now = Utc::now();
	let created_at = row
		.try_get::<DateTime<Utc>, _>("created_at")
		.unwrap_or(now);
	let updated_at = row
		.try_get::<DateTime<Utc>, _>("updated_at")
		.unwrap_or(now);

	let mut record = StandardRecord {
		id,
		created_at,
		updated_at,
		fields: FieldMap::new(),
	};

	for (i, column) in row.columns().iter().enumerate() {
		let name = column.name();
		if matches!(name, "id" | "created_at" | "updated_at") {
			continue;
		}
		let value = if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
			v.map(FieldValue::Bool).unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
			v.map(|n| FieldValue::Number(n as f64))
				.unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
			v.map(|n| FieldValue::Number(n as f64))
				.unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
			v.map(FieldValue::Number).unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(i) {
			v.map(FieldValue::Timestamp).unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<String>, _>(i) {
			v.map(FieldValue::String).unwrap_or(FieldValue::Null)
		} else if let Ok(v) = row.try_get::<Option<Vec<String>>, _>(i) {
			v.map(FieldValue::StringList).unwrap_or(FieldValue::Null)
		} else {
			continue;
		};
		record.fields.insert(name.to_string(), value);
	}

	record
}
