//! Where each resource kind keeps its data and page files
//!
//! ```text
//! data/<slug>.json                 webpage content data
//! data/template/<name>.json        template data, doubles as webpage skeleton
//! pages/<slug>.<ext>               webpage rendering entry
//! pages/template/<name>.<ext>      template rendering entry
//! data/<slot>__switch.owner        record holding a staging slot
//! ```

use std::fmt;

use page_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::record::TemplateType;

/// Suffix reserved for staged files. Record keys may not end with it.
pub const STAGING_SUFFIX: &str = "__switch";

/// Slot name used by the shared staging policy.
pub const SHARED_STAGING_STEM: &str = "name";

/// Extension of the slot owner marker next to the staged data file.
pub const OWNER_EXTENSION: &str = "owner";

/// The two record collections mirrored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Content pages keyed by slug
    Webpage,
    /// Page templates keyed by name
    Template,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Webpage, ResourceKind::Template];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webpage => "webpage",
            Self::Template => "template",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "webpage" | "page" | "post" => Some(Self::Webpage),
            "template" => Some(Self::Template),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The data/page file pair for one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub data: NormalizedPath,
    pub page: NormalizedPath,
}

/// Directory names and page extension of a site, all root-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    data_dir: NormalizedPath,
    pages_dir: NormalizedPath,
    template_dir: String,
    page_extension: String,
    /// Template data stems that are skeletons rather than templates
    skeletons: Vec<String>,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self::new("data", "pages", "template", "tsx")
    }
}

impl SiteLayout {
    pub fn new(data_dir: &str, pages_dir: &str, template_dir: &str, page_extension: &str) -> Self {
        Self {
            data_dir: NormalizedPath::new(data_dir),
            pages_dir: NormalizedPath::new(pages_dir),
            template_dir: template_dir.to_string(),
            page_extension: page_extension.trim_start_matches('.').to_string(),
            skeletons: [TemplateType::PRODUCT, TemplateType::ECOMMERCE, TemplateType::NONE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the list of skeleton names.
    pub fn with_skeletons(mut self, skeletons: Vec<String>) -> Self {
        self.skeletons = skeletons;
        self
    }

    /// Whether a template data stem is a skeleton.
    pub fn is_skeleton(&self, stem: &str) -> bool {
        self.skeletons.iter().any(|s| s == stem)
    }

    pub fn page_extension(&self) -> &str {
        &self.page_extension
    }

    /// Directory holding data files of `kind`.
    pub fn data_dir(&self, kind: ResourceKind) -> NormalizedPath {
        match kind {
            ResourceKind::Webpage => self.data_dir.clone(),
            ResourceKind::Template => self.data_dir.join(&self.template_dir),
        }
    }

    /// Directory holding page files of `kind`.
    pub fn pages_dir(&self, kind: ResourceKind) -> NormalizedPath {
        match kind {
            ResourceKind::Webpage => self.pages_dir.clone(),
            ResourceKind::Template => self.pages_dir.join(&self.template_dir),
        }
    }

    pub fn data_file(&self, kind: ResourceKind, stem: &str) -> NormalizedPath {
        self.data_dir(kind).join(&format!("{}.json", stem))
    }

    pub fn page_file(&self, kind: ResourceKind, stem: &str) -> NormalizedPath {
        self.pages_dir(kind)
            .join(&format!("{}.{}", stem, self.page_extension))
    }

    /// Canonical pair for a record key.
    pub fn pair(&self, kind: ResourceKind, stem: &str) -> FilePair {
        FilePair {
            data: self.data_file(kind, stem),
            page: self.page_file(kind, stem),
        }
    }

    /// Staged pair for a staging slot (`<slot>__switch`).
    pub fn staging_pair(&self, kind: ResourceKind, slot: &str) -> FilePair {
        self.pair(kind, &format!("{}{}", slot, STAGING_SUFFIX))
    }

    /// Marker naming the record that holds a staging slot.
    pub fn staging_owner(&self, kind: ResourceKind, slot: &str) -> NormalizedPath {
        self.data_dir(kind)
            .join(&format!("{}{}.{}", slot, STAGING_SUFFIX, OWNER_EXTENSION))
    }

    /// Skeleton that seeds a new webpage of the given template type.
    pub fn skeleton(&self, template_type: &str) -> NormalizedPath {
        self.data_file(ResourceKind::Template, template_type)
    }
}
