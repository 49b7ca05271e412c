//! Hybrid router
//!
//! Per content type, one backend is selected once, at construction, from
//! the global configuration plus the type's resource availability. The
//! router then exposes the uniform [`ContentStore`] contract and callers
//! never learn which backend served a call. A live configuration flip
//! only affects newly constructed routers, a deliberate simplicity
//! trade-off.

use crate::document::{DocumentClient, DocumentStore};
use crate::relational::{self, RelationalStore};
use crate::store::{ContentStore, QueryOptions, QueryPage};
use async_trait::async_trait;
use renkei_core::config::HybridConfig;
use renkei_core::record::{FieldMap, StandardRecord};
use renkei_core::registry::{ContentType, ContentTypeDescriptor, ContentTypeRegistry};
use renkei_core::{ContentError, Result};
use sqlx::postgres::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which backing store a router dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	Document,
	Relational,
}

/// Per-type dispatcher choosing between the document and relational
/// adapters.
pub struct HybridRouter {
	content_type: ContentType,
	backend: BackendKind,
	store: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for HybridRouter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HybridRouter")
			.field("content_type", &self.content_type)
			.field("backend", &self.backend)
			.finish_non_exhaustive()
	}
}

impl HybridRouter {
	/// The selection rule: document routing requires the global document
	/// mode AND a non-empty resource id on the descriptor. Evaluated
	/// once; the result is fixed for the router's lifetime.
	pub fn select_backend(
		config: &HybridConfig,
		descriptor: &ContentTypeDescriptor,
	) -> BackendKind {
		let has_resource = descriptor
			.document_database_id
			.as_deref()
			.is_some_and(|id| !id.is_empty());
		if config.document_mode() && has_resource {
			BackendKind::Document
		} else {
			BackendKind::Relational
		}
	}

	/// Construct the router for one content type, building the adapter
	/// the selection rule picks.
	pub fn new(
		config: &HybridConfig,
		descriptor: &ContentTypeDescriptor,
		document_client: Option<Arc<DocumentClient>>,
		pool: Option<PgPool>,
	) -> Result<Self> {
		let backend = Self::select_backend(config, descriptor);
		let store: Arc<dyn ContentStore> = match backend {
			BackendKind::Document => {
				let client = document_client.ok_or_else(|| {
					ContentError::Configuration(format!(
						"{} routes to the document store but no document client is available",
						descriptor.content_type
					))
				})?;
				let database_id = descriptor
					.document_database_id
					.clone()
					.unwrap_or_default();
				Arc::new(DocumentStore::new(
					client,
					database_id,
					descriptor.field_schema.clone(),
				))
			}
			BackendKind::Relational => {
				let pool = pool.ok_or_else(|| {
					ContentError::Configuration(format!(
						"{} routes to the relational store but no database pool is available",
						descriptor.content_type
					))
				})?;
				Arc::new(RelationalStore::new(
					pool,
					descriptor.table_name.clone(),
					config.request_timeout,
				)?)
			}
		};
		tracing::debug!(
			content_type = %descriptor.content_type,
			backend = ?backend,
			"routing configured"
		);
		Ok(Self {
			content_type: descriptor.content_type,
			backend,
			store,
		})
	}

	/// Wrap an existing store. Used by tests and by callers that bring
	/// their own adapter.
	pub fn from_store(
		content_type: ContentType,
		backend: BackendKind,
		store: Arc<dyn ContentStore>,
	) -> Self {
		Self {
			content_type,
			backend,
			store,
		}
	}

	pub fn content_type(&self) -> ContentType {
		self.content_type
	}

	pub fn backend(&self) -> BackendKind {
		self.backend
	}
}

#[async_trait]
impl ContentStore for HybridRouter {
	async fn query(&self, options: &QueryOptions) -> Result<QueryPage> {
		self.store.query(options).await
	}

	async fn create(&self, fields: &FieldMap) -> Result<StandardRecord> {
		self.store.create(fields).await
	}

	async fn update(&self, id: &str, fields: &FieldMap) -> Result<StandardRecord> {
		self.store.update(id, fields).await
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.store.delete(id).await
	}

	async fn get(&self, id: &str) -> Result<StandardRecord> {
		self.store.get(id).await
	}
}

/// The full router set: one [`HybridRouter`] per registered content
/// type, sharing a single document client and database pool.
pub struct HybridRepository {
	registry: ContentTypeRegistry,
	routers: BTreeMap<ContentType, Arc<HybridRouter>>,
	document_client: Option<Arc<DocumentClient>>,
}

impl HybridRepository {
	/// Build routers for every registered type. The document client is
	/// created only when some type actually routes to it; the pool is
	/// created whenever a database URL is configured.
	pub fn new(config: &HybridConfig, registry: ContentTypeRegistry) -> Result<Self> {
		let needs_document = config.document_mode()
			&& registry
				.iter()
				.any(|d| d.document_database_id.as_deref().is_some_and(|id| !id.is_empty()));
		let document_client = if needs_document || config.document_api_token.is_some() {
			// Keep a client around for health checks whenever a token
			// exists, not only when routing demands one.
			match DocumentClient::new(config) {
				Ok(client) => Some(Arc::new(client)),
				Err(_) if !needs_document => None,
				Err(e) => return Err(e),
			}
		} else {
			None
		};
		let pool = match config.database_url {
			Some(_) => Some(relational::build_pool(config)?),
			None => None,
		};

		let mut routers = BTreeMap::new();
		for descriptor in registry.iter() {
			let router = HybridRouter::new(
				config,
				descriptor,
				document_client.clone(),
				pool.clone(),
			)?;
			routers.insert(descriptor.content_type, Arc::new(router));
		}

		Ok(Self {
			registry,
			routers,
			document_client,
		})
	}

	/// Assemble a repository from pre-built stores. Intended for tests
	/// and embedding; the backend kind is recorded as given.
	pub fn from_stores(
		registry: ContentTypeRegistry,
		stores: BTreeMap<ContentType, Arc<dyn ContentStore>>,
	) -> Self {
		let routers = stores
			.into_iter()
			.map(|(ct, store)| {
				(
					ct,
					Arc::new(HybridRouter::from_store(ct, BackendKind::Relational, store)),
				)
			})
			.collect();
		Self {
			registry,
			routers,
			document_client: None,
		}
	}

	pub fn registry(&self) -> &ContentTypeRegistry {
		&self.registry
	}

	/// The router for a content type; an unregistered type is a
	/// configuration error.
	pub fn store(&self, content_type: ContentType) -> Result<Arc<HybridRouter>> {
		self.routers.get(&content_type).cloned().ok_or_else(|| {
			ContentError::Configuration(format!(
				"no store registered for content type: {}",
				content_type
			))
		})
	}

	/// Content types with a constructed router, in registry order.
	pub fn types(&self) -> impl Iterator<Item = ContentType> + '_ {
		self.routers.keys().copied()
	}

	/// Shared document client, when one was built (used by the
	/// connectivity health check).
	pub fn document_client(&self) -> Option<Arc<DocumentClient>> {
		self.document_client.clone()
	}
}
