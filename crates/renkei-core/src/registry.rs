//! Content type registry
//!
//! The seven logical content types of the site, each bound to a
//! relational table name, an optional document resource id, a
//! required-fields validation rule, the text columns used for relational
//! search, and the field-name → property-kind schema that drives encoding
//! on the document path.
//!
//! Descriptors are built once from configuration at process start and are
//! immutable thereafter.

use crate::config::HybridConfig;
use crate::error::{ContentError, Result};
use crate::record::StandardRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The logical content types served by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
	News,
	Events,
	BoardPosts,
	Organizations,
	Partners,
	Members,
	Supporters,
}

impl ContentType {
	/// All registered content types, in registry order.
	pub const ALL: [ContentType; 7] = [
		ContentType::News,
		ContentType::Events,
		ContentType::BoardPosts,
		ContentType::Organizations,
		ContentType::Partners,
		ContentType::Members,
		ContentType::Supporters,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ContentType::News => "news",
			ContentType::Events => "events",
			ContentType::BoardPosts => "board_posts",
			ContentType::Organizations => "organizations",
			ContentType::Partners => "partners",
			ContentType::Members => "members",
			ContentType::Supporters => "supporters",
		}
	}

	/// Relational table backing this type.
	pub fn table_name(&self) -> &'static str {
		self.as_str()
	}

	/// Environment variable naming this type's document resource id.
	pub fn env_key(&self) -> String {
		format!("{}_DATABASE_ID", self.as_str().to_uppercase())
	}
}

impl fmt::Display for ContentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ContentType {
	type Err = ContentError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"news" => Ok(ContentType::News),
			"events" => Ok(ContentType::Events),
			"board_posts" => Ok(ContentType::BoardPosts),
			"organizations" => Ok(ContentType::Organizations),
			"partners" => Ok(ContentType::Partners),
			"members" => Ok(ContentType::Members),
			"supporters" => Ok(ContentType::Supporters),
			other => Err(ContentError::Configuration(format!(
				"unknown content type: {}",
				other
			))),
		}
	}
}

/// Typed field classification in the document store's schema model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
	Title,
	RichText,
	Select,
	MultiSelect,
	Number,
	Checkbox,
	Date,
	Email,
	Url,
	Files,
}

/// Field-name → property-kind map supplied to the encoder, removing the
/// guesswork of inferring kinds from runtime value types.
pub type FieldSchema = BTreeMap<String, PropertyKind>;

fn schema(pairs: &[(&str, PropertyKind)]) -> FieldSchema {
	pairs
		.iter()
		.map(|(name, kind)| (name.to_string(), *kind))
		.collect()
}

fn names(items: &[&str]) -> Vec<String> {
	items.iter().map(|s| s.to_string()).collect()
}

/// Binding of one logical content type to its backing resources and
/// validation rule. Immutable after registry construction.
#[derive(Debug, Clone)]
pub struct ContentTypeDescriptor {
	pub content_type: ContentType,
	pub table_name: String,
	/// Document resource id, when configured. Absent or empty means the
	/// type is pinned to the relational backend regardless of global mode.
	pub document_database_id: Option<String>,
	/// Fields that must carry content for a record to pass sync
	/// validation.
	pub required_fields: Vec<String>,
	/// Text columns the relational adapter searches with OR'd ILIKE.
	pub search_fields: Vec<String>,
	/// Encoder schema for the document path.
	pub field_schema: FieldSchema,
}

impl ContentTypeDescriptor {
	/// Required-fields predicate used by sync validation.
	pub fn validate(&self, record: &StandardRecord) -> bool {
		self.required_fields.iter().all(|f| record.has_field(f))
	}
}

/// Registry of all content type descriptors, built once from
/// configuration.
#[derive(Debug, Clone)]
pub struct ContentTypeRegistry {
	descriptors: BTreeMap<ContentType, ContentTypeDescriptor>,
}

impl ContentTypeRegistry {
	/// Build descriptors for all seven types, binding each to its
	/// configured document resource id (if any).
	pub fn from_config(config: &HybridConfig) -> Self {
		let descriptors = ContentType::ALL
			.iter()
			.map(|ct| {
				let (required, search, fields) = type_profile(*ct);
				let descriptor = ContentTypeDescriptor {
					content_type: *ct,
					table_name: ct.table_name().to_string(),
					document_database_id: config.database_id(*ct).map(str::to_string),
					required_fields: names(required),
					search_fields: names(search),
					field_schema: schema(fields),
				};
				(*ct, descriptor)
			})
			.collect();
		Self { descriptors }
	}

	/// Descriptor lookup; an unregistered type is a configuration error.
	pub fn descriptor(&self, content_type: ContentType) -> Result<&ContentTypeDescriptor> {
		self.descriptors.get(&content_type).ok_or_else(|| {
			ContentError::Configuration(format!(
				"no descriptor registered for content type: {}",
				content_type
			))
		})
	}

	pub fn get(&self, content_type: ContentType) -> Option<&ContentTypeDescriptor> {
		self.descriptors.get(&content_type)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ContentTypeDescriptor> {
		self.descriptors.values()
	}

	pub fn types(&self) -> impl Iterator<Item = ContentType> + '_ {
		self.descriptors.keys().copied()
	}

	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}
}

/// Static per-type profile: (required fields, search fields, encoder
/// schema).
fn type_profile(
	content_type: ContentType,
) -> (
	&'static [&'static str],
	&'static [&'static str],
	&'static [(&'static str, PropertyKind)],
) {
	use PropertyKind::*;
	match content_type {
		ContentType::News => (
			&["title", "content"],
			&["title", "content", "summary"],
			&[
				("title", Title),
				("content", RichText),
				("summary", RichText),
				("category", Select),
				("tags", MultiSelect),
				("status", Select),
				("image", Files),
				("author", RichText),
				("published_at", Date),
			],
		),
		ContentType::Events => (
			&["title", "event_date"],
			&["title", "description", "location"],
			&[
				("title", Title),
				("description", RichText),
				("event_date", Date),
				("location", RichText),
				("capacity", Number),
				("registration_url", Url),
				("status", Select),
				("tags", MultiSelect),
			],
		),
		ContentType::BoardPosts => (
			&["title", "content"],
			&["title", "content"],
			&[
				("title", Title),
				("content", RichText),
				("author", RichText),
				("role", Select),
				("status", Select),
				("pinned", Checkbox),
			],
		),
		ContentType::Organizations => (
			&["name"],
			&["name", "description", "university"],
			&[
				("name", Title),
				("description", RichText),
				("university", RichText),
				("email", Email),
				("website", Url),
				("categories", MultiSelect),
				("member_count", Number),
				("status", Select),
				("logo", Files),
			],
		),
		ContentType::Partners => (
			&["name"],
			&["name", "description"],
			&[
				("name", Title),
				("description", RichText),
				("website", Url),
				("tier", Select),
				("logo", Files),
				("status", Select),
				("contact_email", Email),
			],
		),
		ContentType::Members => (
			&["name"],
			&["name", "bio"],
			&[
				("name", Title),
				("bio", RichText),
				("role", Select),
				("email", Email),
				("university", RichText),
				("skills", MultiSelect),
				("avatar", Files),
				("joined_at", Date),
				("status", Select),
			],
		),
		ContentType::Supporters => (
			&["name"],
			&["name", "message"],
			&[
				("name", Title),
				("message", RichText),
				("amount", Number),
				("website", Url),
				("public", Checkbox),
				("status", Select),
			],
		),
	}
}
