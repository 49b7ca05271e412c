//! Startup configuration
//!
//! One explicit `HybridConfig` struct, constructed once (normally from the
//! environment) and passed by reference into the router and site manager
//! constructors. Nothing in the repository reads the environment ad hoc
//! after startup.

use crate::error::{ContentError, Result};
use crate::registry::ContentType;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default base URL of the document backend's HTTP API.
pub const DEFAULT_DOCUMENT_API_URL: &str = "https://api.notion.com";

/// Default uniform per-call timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Global CMS mode. Only `hybrid` and `notion` enable document routing;
/// `supabase` and `wordpress` pin everything to the relational backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsMode {
	Supabase,
	Notion,
	Hybrid,
	Wordpress,
}

impl CmsMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			CmsMode::Supabase => "supabase",
			CmsMode::Notion => "notion",
			CmsMode::Hybrid => "hybrid",
			CmsMode::Wordpress => "wordpress",
		}
	}
}

impl FromStr for CmsMode {
	type Err = ContentError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"supabase" => Ok(CmsMode::Supabase),
			"notion" => Ok(CmsMode::Notion),
			"hybrid" => Ok(CmsMode::Hybrid),
			"wordpress" => Ok(CmsMode::Wordpress),
			other => Err(ContentError::Configuration(format!(
				"unknown CMS mode: {}",
				other
			))),
		}
	}
}

/// Repository configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct HybridConfig {
	pub cms_mode: CmsMode,
	/// Global document-mode flag. Routing additionally requires a
	/// document-capable `cms_mode` and a per-type resource id.
	pub use_document_store: bool,
	pub document_api_url: String,
	pub document_api_token: Option<String>,
	pub database_url: Option<String>,
	/// Enables the per-type required-fields check during sync.
	pub content_validation: bool,
	/// Uniform per-call timeout applied to both backends.
	pub request_timeout: Duration,
	database_ids: BTreeMap<ContentType, String>,
}

impl HybridConfig {
	/// A configuration with defaults: relational mode, validation on,
	/// 30 second timeout, no resources bound.
	pub fn new() -> Self {
		Self {
			cms_mode: CmsMode::Supabase,
			use_document_store: false,
			document_api_url: DEFAULT_DOCUMENT_API_URL.to_string(),
			document_api_token: None,
			database_url: None,
			content_validation: true,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			database_ids: BTreeMap::new(),
		}
	}

	/// Read configuration from the process environment.
	///
	/// Recognized variables: `CMS_MODE`, `USE_DOCUMENT_STORE`,
	/// `DOCUMENT_API_URL`, `DOCUMENT_API_TOKEN`, `DATABASE_URL`,
	/// `CONTENT_VALIDATION`, `REQUEST_TIMEOUT_SECS`, and one
	/// `<TYPE>_DATABASE_ID` per content type (e.g. `NEWS_DATABASE_ID`).
	pub fn from_env() -> Result<Self> {
		let mut config = Self::new();

		if let Some(mode) = read_var("CMS_MODE") {
			config.cms_mode = mode.parse()?;
		}
		if let Some(flag) = read_var("USE_DOCUMENT_STORE") {
			config.use_document_store = parse_bool("USE_DOCUMENT_STORE", &flag)?;
		}
		if let Some(url) = read_var("DOCUMENT_API_URL") {
			config.document_api_url = url;
		}
		config.document_api_token = read_var("DOCUMENT_API_TOKEN");
		config.database_url = read_var("DATABASE_URL");
		if let Some(flag) = read_var("CONTENT_VALIDATION") {
			config.content_validation = parse_bool("CONTENT_VALIDATION", &flag)?;
		}
		if let Some(secs) = read_var("REQUEST_TIMEOUT_SECS") {
			let secs: u64 = secs.parse().map_err(|_| {
				ContentError::Configuration(format!(
					"REQUEST_TIMEOUT_SECS is not a number: {}",
					secs
				))
			})?;
			config.request_timeout = Duration::from_secs(secs);
		}

		for ct in ContentType::ALL {
			if let Some(id) = read_var(&ct.env_key()) {
				config.database_ids.insert(ct, id);
			}
		}

		tracing::debug!(
			mode = config.cms_mode.as_str(),
			document = config.document_mode(),
			resources = config.database_ids.len(),
			"loaded repository configuration"
		);
		Ok(config)
	}

	pub fn with_cms_mode(mut self, mode: CmsMode) -> Self {
		self.cms_mode = mode;
		self
	}

	pub fn with_document_store(mut self, enabled: bool) -> Self {
		self.use_document_store = enabled;
		self
	}

	pub fn with_document_api_url(mut self, url: impl Into<String>) -> Self {
		self.document_api_url = url.into();
		self
	}

	pub fn with_document_api_token(mut self, token: impl Into<String>) -> Self {
		self.document_api_token = Some(token.into());
		self
	}

	pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
		self.database_url = Some(url.into());
		self
	}

	pub fn with_content_validation(mut self, enabled: bool) -> Self {
		self.content_validation = enabled;
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_database_id(mut self, content_type: ContentType, id: impl Into<String>) -> Self {
		self.database_ids.insert(content_type, id.into());
		self
	}

	/// True when the global configuration permits document routing at
	/// all. Individual types still need a resource id.
	pub fn document_mode(&self) -> bool {
		self.use_document_store && matches!(self.cms_mode, CmsMode::Hybrid | CmsMode::Notion)
	}

	/// The configured document resource id for a type, if any. Empty
	/// values count as unconfigured.
	pub fn database_id(&self, content_type: ContentType) -> Option<&str> {
		self.database_ids
			.get(&content_type)
			.map(String::as_str)
			.filter(|id| !id.is_empty())
	}
}

impl Default for HybridConfig {
	fn default() -> Self {
		Self::new()
	}
}

fn read_var(key: &str) -> Option<String> {
	env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
	match value.to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(ContentError::Configuration(format!(
			"{} is not a boolean: {}",
			key, value
		))),
	}
}
