//! Error taxonomy for the content repository
//!
//! Single-record operations propagate these errors with `?`. Multi-record
//! orchestration (bulk update, sync-all, backup) never throws for
//! per-item failures; those surface as structured per-item outcomes in
//! the report types instead.

use thiserror::Error;

/// Result type for content repository operations
pub type Result<T> = std::result::Result<T, ContentError>;

/// Unified error type for content repository operations
#[derive(Debug, Error)]
pub enum ContentError {
	/// Network, HTTP or database failure from either backend. Surfaced
	/// as-is; the repository does not retry.
	#[error("transport error: {0}")]
	Transport(String),

	/// The uniform per-call timeout elapsed. Distinct from `Transport`
	/// because the document service is rate-limited and can stall.
	#[error("request timed out: {0}")]
	Timeout(String),

	/// get/update/delete addressed a nonexistent id.
	#[error("not found: {0}")]
	NotFound(String),

	/// Content-type-specific required-field check failed during sync.
	/// Carries the type name and the invalid-record count only; the
	/// summary deliberately does not identify which records.
	#[error("validation failed for {content_type}: {invalid_count} invalid record(s)")]
	Validation {
		content_type: String,
		invalid_count: usize,
	},

	/// A content type with no registered descriptor, a missing token or
	/// connection string, or otherwise malformed configuration.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// JSON (de)serialization failure.
	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for ContentError {
	fn from(err: serde_json::Error) -> Self {
		ContentError::Serialization(err.to_string())
	}
}
