//! Content record shapes handed over by the CMS lifecycle notifier
//!
//! Only the fields the synchronizer reads are modelled. Everything else about
//! the `Post` and `Template` lists (access rules, relationships, admin UI)
//! belongs to the CMS.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::STAGING_SUFFIX;

/// A validated record key (webpage slug or template name).
///
/// The key becomes a file stem, so it must be a single safe path segment and
/// must not collide with the staging namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey(String);

impl RecordKey {
    pub fn parse(value: &str) -> Result<Self> {
        validate_segment(value)?;
        if value.ends_with(STAGING_SUFFIX) {
            return Err(Error::InvalidKey {
                value: value.to_string(),
                reason: format!("must not end with reserved suffix {STAGING_SUFFIX:?}"),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(value: &str) -> Result<()> {
    page_fs::validate_path_segment(value).map_err(|e| match e {
        page_fs::Error::InvalidPath { value, reason } => Error::InvalidKey { value, reason },
        other => Error::Fs(other),
    })
}

/// Stable identity of a record (the CMS primary key).
pub fn validate_record_id(id: &str) -> Result<()> {
    validate_segment(id)
}

/// Skeleton selector of a webpage.
///
/// The CMS offers `product`, `ecommerce` and `none`; any other tag is accepted
/// as long as a skeleton file of that name exists when the page is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateType(String);

impl TemplateType {
    pub const PRODUCT: &'static str = "product";
    pub const ECOMMERCE: &'static str = "ecommerce";
    pub const NONE: &'static str = "none";

    pub fn parse(value: &str) -> Result<Self> {
        validate_segment(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the options the CMS select field offers.
    pub fn is_builtin(&self) -> bool {
        matches!(self.0.as_str(), Self::PRODUCT | Self::ECOMMERCE | Self::NONE)
    }
}

impl Default for TemplateType {
    fn default() -> Self {
        Self(Self::NONE.to_string())
    }
}

impl TryFrom<String> for TemplateType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TemplateType> for String {
    fn from(t: TemplateType) -> Self {
        t.0
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    #[default]
    Draft,
}

/// A `Post` record as seen by the lifecycle hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    /// Unique, but optional in the CMS; a post without a slug has no files.
    pub slug: Option<String>,
    #[serde(default)]
    pub template: TemplateType,
    #[serde(default)]
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
}

/// A `Template` record as seen by the lifecycle hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub name: Option<String>,
}

/// What the notifier passes to a hook: identity, key and template tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookItem {
    pub id: String,
    pub key: String,
    pub template: Option<TemplateType>,
}

impl HookItem {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: TemplateType) -> Self {
        self.template = Some(template);
        self
    }

    pub fn record_key(&self) -> Result<RecordKey> {
        RecordKey::parse(&self.key)
    }
}

impl From<&PostRecord> for HookItem {
    fn from(post: &PostRecord) -> Self {
        Self {
            id: post.id.clone(),
            key: post.slug.clone().unwrap_or_default(),
            template: Some(post.template.clone()),
        }
    }
}

impl From<&TemplateRecord> for HookItem {
    fn from(template: &TemplateRecord) -> Self {
        Self {
            id: template.id.clone(),
            key: template.name.clone().unwrap_or_default(),
            template: None,
        }
    }
}
