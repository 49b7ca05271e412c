//! Content workflow
//!
//! Named lifecycle transitions layered on the router's `update`. Each
//! transition sets the status field and stamps the corresponding
//! timestamp; rejection additionally records the reason.
//!
//! No transition inspects the record's current status before applying;
//! any status can move to any target. This permissiveness is a deliberate
//! design choice (rejection of an already-published record is allowed,
//! for instance) and is covered by tests; adding guards is a product
//! decision, not a bug fix.

use chrono::{DateTime, Utc};
use renkei_core::record::{FieldMap, StandardRecord};
use renkei_core::registry::ContentType;
use renkei_core::Result;
use renkei_db::router::HybridRepository;
use renkei_db::store::ContentStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
	Draft,
	PendingReview,
	Published,
	Rejected,
	Scheduled,
	Archived,
}

impl WorkflowStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			WorkflowStatus::Draft => "draft",
			WorkflowStatus::PendingReview => "pending_review",
			WorkflowStatus::Published => "published",
			WorkflowStatus::Rejected => "rejected",
			WorkflowStatus::Scheduled => "scheduled",
			WorkflowStatus::Archived => "archived",
		}
	}
}

impl fmt::Display for WorkflowStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Workflow transitions over the hybrid router set.
pub struct ContentWorkflow {
	repository: Arc<HybridRepository>,
}

impl ContentWorkflow {
	pub fn new(repository: Arc<HybridRepository>) -> Self {
		Self { repository }
	}

	async fn transition(
		&self,
		content_type: ContentType,
		id: &str,
		status: WorkflowStatus,
		extra: FieldMap,
	) -> Result<StandardRecord> {
		let store = self.repository.store(content_type)?;
		let mut fields = extra;
		fields.insert("status".to_string(), status.as_str().into());
		tracing::info!(%content_type, id, %status, "workflow transition");
		store.update(id, &fields).await
	}

	/// Move a record into review: status `pending_review`, stamps
	/// `submitted_at`.
	pub async fn submit_for_review(
		&self,
		content_type: ContentType,
		id: &str,
	) -> Result<StandardRecord> {
		let mut fields = FieldMap::new();
		fields.insert("submitted_at".to_string(), Utc::now().into());
		self.transition(content_type, id, WorkflowStatus::PendingReview, fields)
			.await
	}

	/// Publish a record: status `published`, stamps `published_at`.
	pub async fn approve(&self, content_type: ContentType, id: &str) -> Result<StandardRecord> {
		let mut fields = FieldMap::new();
		fields.insert("published_at".to_string(), Utc::now().into());
		self.transition(content_type, id, WorkflowStatus::Published, fields)
			.await
	}

	/// Reject a record with a reason: status `rejected`, stamps
	/// `rejected_at` and records `rejection_reason`. Terminal; there is
	/// no modeled way back to `draft`.
	pub async fn reject(
		&self,
		content_type: ContentType,
		id: &str,
		reason: &str,
	) -> Result<StandardRecord> {
		let mut fields = FieldMap::new();
		fields.insert("rejection_reason".to_string(), reason.into());
		fields.insert("rejected_at".to_string(), Utc::now().into());
		self.transition(content_type, id, WorkflowStatus::Rejected, fields)
			.await
	}

	/// Schedule a record for future publication: status `scheduled`,
	/// records `scheduled_publish_at`.
	pub async fn schedule(
		&self,
		content_type: ContentType,
		id: &str,
		publish_at: DateTime<Utc>,
	) -> Result<StandardRecord> {
		let mut fields = FieldMap::new();
		fields.insert("scheduled_publish_at".to_string(), publish_at.into());
		self.transition(content_type, id, WorkflowStatus::Scheduled, fields)
			.await
	}

	/// Archive a record: status `archived`. Pairs with the document
	/// store's archival soft delete.
	pub async fn archive(&self, content_type: ContentType, id: &str) -> Result<StandardRecord> {
		self.transition(content_type, id, WorkflowStatus::Archived, FieldMap::new())
			.await
	}
}
