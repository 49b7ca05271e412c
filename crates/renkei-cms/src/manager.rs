//! Site manager
//!
//! Cross-type orchestration over the hybrid router set: sync-all,
//! search-all, analytics aggregation, backup snapshot, bulk update and
//! connectivity health check.
//!
//! Failure domains are isolated: one content type's failure never aborts
//! the others, and per-item failures in a bulk update surface as entries
//! in the report, never as an early return. The reports are ephemeral:
//! computed on demand and never persisted here.

use chrono::{DateTime, Utc};
use futures::future;
use renkei_core::config::HybridConfig;
use renkei_core::record::{FieldMap, StandardRecord};
use renkei_core::registry::{ContentType, ContentTypeRegistry};
use renkei_core::{ContentError, Result};
use renkei_db::router::HybridRepository;
use renkei_db::store::{ContentStore, QueryOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::workflow::{ContentWorkflow, WorkflowStatus};

/// Per-type outcome of a sync pass.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
	Success { records: usize },
	Error { message: String },
}

/// Result of [`SiteManager::sync_all_content`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
	pub started_at: DateTime<Utc>,
	pub outcomes: BTreeMap<ContentType, SyncOutcome>,
	pub succeeded: usize,
	pub failed: usize,
}

/// One search match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
	pub content_type: ContentType,
	pub record: StandardRecord,
}

/// Per-type analytics.
#[derive(Debug, Clone, Serialize)]
pub struct TypeAnalytics {
	pub total: usize,
	pub published: usize,
	pub drafts: usize,
	pub last_updated: Option<DateTime<Utc>>,
	/// Percentage; `0` when the type has no records.
	pub publish_rate: f64,
}

/// Result of [`SiteManager::content_analytics`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
	pub generated_at: DateTime<Utc>,
	pub per_type: BTreeMap<ContentType, TypeAnalytics>,
	/// Types whose query failed; excluded from the aggregates.
	pub failed: Vec<ContentType>,
	pub total_content: usize,
	pub total_published: usize,
	pub overall_publish_rate: f64,
}

/// Per-type entry of a backup snapshot. A failed type keeps its slot
/// with an inline error marker instead of aborting the whole backup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupEntry {
	Success { records: Vec<StandardRecord> },
	Error { message: String },
}

/// Result of [`SiteManager::create_backup`].
#[derive(Debug, Clone, Serialize)]
pub struct BackupSnapshot {
	pub created_at: DateTime<Utc>,
	pub entries: BTreeMap<ContentType, BackupEntry>,
}

/// One update in a bulk request.
#[derive(Debug, Clone)]
pub struct BulkUpdateItem {
	pub id: String,
	pub fields: FieldMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkItemStatus {
	Success,
	Error,
}

/// Per-item outcome, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateResult {
	pub id: String,
	pub status: BulkItemStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Result of [`SiteManager::bulk_update`]. Never fails fast.
#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateReport {
	pub total: usize,
	pub successful: usize,
	pub failed: usize,
	pub results: Vec<BulkUpdateResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
}

/// Per-resource connectivity status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceStatus {
	Ok,
	Error { message: String },
	NotConfigured,
}

/// Result of [`SiteManager::sync_status`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
	pub checked_at: DateTime<Utc>,
	pub overall: HealthState,
	pub resources: BTreeMap<ContentType, ResourceStatus>,
}

/// Cross-type orchestration over the registry and the router set.
pub struct SiteManager {
	repository: Arc<HybridRepository>,
	content_validation: bool,
}

impl SiteManager {
	/// Build the full stack from configuration: registry, routers, and
	/// the manager on top.
	pub fn new(config: &HybridConfig) -> Result<Self> {
		let registry = ContentTypeRegistry::from_config(config);
		let repository = HybridRepository::new(config, registry)?;
		Ok(Self {
			repository: Arc::new(repository),
			content_validation: config.content_validation,
		})
	}

	/// Assemble a manager over an existing repository.
	pub fn from_parts(repository: Arc<HybridRepository>, content_validation: bool) -> Self {
		Self {
			repository,
			content_validation,
		}
	}

	pub fn repository(&self) -> Arc<HybridRepository> {
		self.repository.clone()
	}

	/// Workflow transitions sharing this manager's router set.
	pub fn workflow(&self) -> ContentWorkflow {
		ContentWorkflow::new(self.repository.clone())
	}

	/// Query every registered content type, optionally validating
	/// required fields, and report per type. One type's failure never
	/// aborts the others.
	pub async fn sync_all_content(&self) -> SyncReport {
		let started_at = Utc::now();
		let types: Vec<ContentType> = self.repository.types().collect();
		let results = future::join_all(types.into_iter().map(|ct| async move {
			let outcome = match self.sync_type(ct).await {
				Ok(records) => SyncOutcome::Success { records },
				Err(e) => {
					tracing::warn!(content_type = %ct, error = %e, "sync failed");
					SyncOutcome::Error {
						message: e.to_string(),
					}
				}
			};
			(ct, outcome)
		}))
		.await;

		let mut outcomes = BTreeMap::new();
		let mut succeeded = 0;
		let mut failed = 0;
		for (ct, outcome) in results {
			match outcome {
				SyncOutcome::Success { .. } => succeeded += 1,
				SyncOutcome::Error { .. } => failed += 1,
			}
			outcomes.insert(ct, outcome);
		}
		tracing::info!(succeeded, failed, "content sync finished");
		SyncReport {
			started_at,
			outcomes,
			succeeded,
			failed,
		}
	}

	async fn sync_type(&self, content_type: ContentType) -> Result<usize> {
		let store = self.repository.store(content_type)?;
		let page = store.query(&QueryOptions::new()).await?;
		if self.content_validation {
			let descriptor = self.repository.registry().descriptor(content_type)?;
			let invalid_count = page
				.data
				.iter()
				.filter(|record| !descriptor.validate(record))
				.count();
			// The summary names the type and the count only, not the
			// offending records.
			if invalid_count > 0 {
				return Err(ContentError::Validation {
					content_type: content_type.to_string(),
					invalid_count,
				});
			}
		}
		Ok(page.count)
	}

	/// Case-insensitive substring search against each record's
	/// JSON-serialized form. Brute force, but schema-agnostic; no
	/// full-text index is assumed to exist. A failing type is logged and
	/// contributes no hits.
	pub async fn search_content(
		&self,
		query: &str,
		content_types: Option<&[ContentType]>,
	) -> Vec<SearchHit> {
		let types: Vec<ContentType> = match content_types {
			Some(selected) => selected.to_vec(),
			None => self.repository.types().collect(),
		};
		let needle = query.to_lowercase();

		let results = future::join_all(types.into_iter().map(|ct| async move {
			let result = match self.repository.store(ct) {
				Ok(store) => store.query(&QueryOptions::new()).await,
				Err(e) => Err(e),
			};
			(ct, result)
		}))
		.await;

		let mut hits = Vec::new();
		for (content_type, result) in results {
			let page = match result {
				Ok(page) => page,
				Err(e) => {
					tracing::warn!(%content_type, error = %e, "search query failed");
					continue;
				}
			};
			for record in page.data {
				let serialized = match serde_json::to_string(&record) {
					Ok(s) => s,
					Err(_) => continue,
				};
				if serialized.to_lowercase().contains(&needle) {
					hits.push(SearchHit {
						content_type,
						record,
					});
				}
			}
		}
		hits
	}

	/// Per-type totals, published/draft counts, freshest update and
	/// publish rate, plus a cross-type summary.
	pub async fn content_analytics(&self) -> AnalyticsReport {
		let types: Vec<ContentType> = self.repository.types().collect();
		let results = future::join_all(types.into_iter().map(|ct| async move {
			let result = match self.repository.store(ct) {
				Ok(store) => store.query(&QueryOptions::new()).await,
				Err(e) => Err(e),
			};
			(ct, result)
		}))
		.await;

		let mut per_type = BTreeMap::new();
		let mut failed = Vec::new();
		let mut total_content = 0;
		let mut total_published = 0;
		for (content_type, result) in results {
			let page = match result {
				Ok(page) => page,
				Err(e) => {
					tracing::warn!(%content_type, error = %e, "analytics query failed");
					failed.push(content_type);
					continue;
				}
			};
			let total = page.data.len();
			let published = count_status(&page.data, WorkflowStatus::Published);
			let drafts = count_status(&page.data, WorkflowStatus::Draft);
			let last_updated = page.data.iter().map(|r| r.updated_at).max();
			per_type.insert(
				content_type,
				TypeAnalytics {
					total,
					published,
					drafts,
					last_updated,
					publish_rate: publish_rate(published, total),
				},
			);
			total_content += total;
			total_published += published;
		}

		AnalyticsReport {
			generated_at: Utc::now(),
			per_type,
			failed,
			total_content,
			total_published,
			overall_publish_rate: publish_rate(total_published, total_content),
		}
	}

	/// Snapshot a full query result per type. A failed type's entry is
	/// an inline error marker; the backup itself always completes.
	pub async fn create_backup(&self) -> BackupSnapshot {
		let types: Vec<ContentType> = self.repository.types().collect();
		let results = future::join_all(types.into_iter().map(|ct| async move {
			let result = match self.repository.store(ct) {
				Ok(store) => store.query(&QueryOptions::new()).await,
				Err(e) => Err(e),
			};
			(ct, result)
		}))
		.await;

		let entries = results
			.into_iter()
			.map(|(ct, result)| {
				let entry = match result {
					Ok(page) => BackupEntry::Success { records: page.data },
					Err(e) => {
						tracing::warn!(content_type = %ct, error = %e, "backup query failed");
						BackupEntry::Error {
							message: e.to_string(),
						}
					}
				};
				(ct, entry)
			})
			.collect();

		BackupSnapshot {
			created_at: Utc::now(),
			entries,
		}
	}

	/// Apply each update independently, sequentially (deterministic
	/// result order), collecting per-item outcomes. Never fails fast.
	pub async fn bulk_update(
		&self,
		content_type: ContentType,
		updates: Vec<BulkUpdateItem>,
	) -> BulkUpdateReport {
		let total = updates.len();
		let store = self.repository.store(content_type);
		let mut results = Vec::with_capacity(total);
		let mut successful = 0;
		let mut failed = 0;

		for update in updates {
			let outcome = match &store {
				Ok(store) => store.update(&update.id, &update.fields).await.map(|_| ()),
				Err(e) => Err(ContentError::Configuration(e.to_string())),
			};
			match outcome {
				Ok(()) => {
					successful += 1;
					results.push(BulkUpdateResult {
						id: update.id,
						status: BulkItemStatus::Success,
						error: None,
					});
				}
				Err(e) => {
					failed += 1;
					results.push(BulkUpdateResult {
						id: update.id,
						status: BulkItemStatus::Error,
						error: Some(e.to_string()),
					});
				}
			}
		}

		BulkUpdateReport {
			total,
			successful,
			failed,
			results,
		}
	}

	/// Lightweight existence check for every configured document
	/// resource. Healthy only if every configured check passes;
	/// unconfigured resources never count against health.
	pub async fn sync_status(&self) -> HealthReport {
		let client = self.repository.document_client();
		let descriptors: Vec<(ContentType, Option<String>)> = self
			.repository
			.registry()
			.iter()
			.map(|d| (d.content_type, d.document_database_id.clone()))
			.collect();

		let results = future::join_all(descriptors.into_iter().map(|(ct, database_id)| {
			let client = client.clone();
			async move {
				let status = match database_id.as_deref().filter(|id| !id.is_empty()) {
					None => ResourceStatus::NotConfigured,
					Some(id) => match &client {
						None => ResourceStatus::Error {
							message: "document API token not configured".to_string(),
						},
						Some(client) => match client.retrieve_database(id).await {
							Ok(_) => ResourceStatus::Ok,
							Err(e) => ResourceStatus::Error {
								message: e.to_string(),
							},
						},
					},
				};
				(ct, status)
			}
		}))
		.await;

		let resources: BTreeMap<ContentType, ResourceStatus> = results.into_iter().collect();
		let degraded = resources
			.values()
			.any(|status| matches!(status, ResourceStatus::Error { .. }));
		HealthReport {
			checked_at: Utc::now(),
			overall: if degraded {
				HealthState::Degraded
			} else {
				HealthState::Healthy
			},
			resources,
		}
	}
}

fn count_status(records: &[StandardRecord], status: WorkflowStatus) -> usize {
	records
		.iter()
		.filter(|record| record.str_field("status") == Some(status.as_str()))
		.count()
}

/// Percentage of published records; `0` when there are none at all, so
/// an empty type never yields NaN.
fn publish_rate(published: usize, total: usize) -> f64 {
	if total == 0 {
		0.0
	} else {
		published as f64 / total as f64 * 100.0
	}
}
