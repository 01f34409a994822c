//! Site configuration (`pagesync.toml`)
//!
//! Every field has a default, so an absent file yields a working setup for the
//! conventional `data/` + `pages/` layout with TSX page entries.

use std::path::Path;
use std::time::Duration;

use page_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::SiteLayout;
use crate::record::TemplateType;

/// File name looked up in the site root.
pub const CONFIG_FILE: &str = "pagesync.toml";

/// Lines appended to every new page entry.
pub const DEFAULT_BOILERPLATE: [&str; 3] = [
    "import 'grapesjs/dist/css/grapes.min.css'",
    "export { getStaticProps } from 'destack/build/server'",
    "export { ContentProvider as default } from 'destack'",
];

/// How shifted files are parked during an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StagingPolicy {
    /// One slot per record, named after the record id
    #[default]
    PerRecord,
    /// One `name__switch` slot per resource kind
    Shared,
}

/// Backoff settings for the projection worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval_ms: 50,
            max_interval_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub page_extension: String,
    pub data_dir: String,
    pub pages_dir: String,
    pub template_dir: String,
    pub staging: StagingPolicy,
    pub boilerplate: Vec<String>,
    /// Template data stems used as webpage skeletons; they need no page file
    pub skeletons: Vec<String>,
    /// Outbox ledger, relative to the site root
    pub ledger_path: String,
    pub retry: RetryConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            page_extension: "tsx".to_string(),
            data_dir: "data".to_string(),
            pages_dir: "pages".to_string(),
            template_dir: "template".to_string(),
            staging: StagingPolicy::default(),
            boilerplate: DEFAULT_BOILERPLATE.iter().map(|s| s.to_string()).collect(),
            skeletons: [TemplateType::PRODUCT, TemplateType::ECOMMERCE, TemplateType::NONE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ledger_path: ".pagesync/ledger.toml".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load `pagesync.toml` from the site root, or defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&NormalizedPath::new(root.join(CONFIG_FILE)))
    }

    /// Load from an explicit file (TOML, JSON or YAML by extension).
    pub fn load_from(path: &NormalizedPath) -> Result<Self> {
        let config: SiteConfig = ConfigStore::new().load_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("data_dir", &self.data_dir),
            ("pages_dir", &self.pages_dir),
            ("template_dir", &self.template_dir),
        ] {
            if value.trim().is_empty() || value.split('/').any(|part| part == "..") {
                return Err(Error::InvalidConfig {
                    message: format!("{field} must be a relative path inside the site, got {value:?}"),
                });
            }
        }
        page_fs::validate_path_segment(&self.template_dir).map_err(|e| Error::InvalidConfig {
            message: format!("template_dir: {e}"),
        })?;
        let extension = self.page_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains('/') {
            return Err(Error::InvalidConfig {
                message: format!("page_extension {:?} is not a file extension", self.page_extension),
            });
        }
        for skeleton in &self.skeletons {
            TemplateType::parse(skeleton).map_err(|e| Error::InvalidConfig {
                message: format!("skeletons: {e}"),
            })?;
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(
            &self.data_dir,
            &self.pages_dir,
            &self.template_dir,
            &self.page_extension,
        )
        .with_skeletons(self.skeletons.clone())
    }

    /// Boilerplate lines, each terminated with a newline.
    pub fn boilerplate_lines(&self) -> Vec<String> {
        self.boilerplate.iter().map(|line| format!("{line}\n")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_conventional_layout() {
        let config = SiteConfig::default();
        assert_eq!(config.page_extension, "tsx");
        assert_eq!(config.staging, StagingPolicy::PerRecord);
        assert_eq!(config.boilerplate.len(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
page_extension = "jsx"
staging = "shared"

[retry]
max_attempts = 5
"#,
        )
        .unwrap();
        assert_eq!(config.page_extension, "jsx");
        assert_eq!(config.staging, StagingPolicy::Shared);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_interval_ms, 50);
        assert_eq!(config.data_dir, "data");
    }

    #[test]
    fn rejects_escaping_dirs() {
        let config = SiteConfig {
            data_dir: "../outside".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn custom_skeletons_reach_the_layout() {
        let config: SiteConfig = toml::from_str(r#"skeletons = ["none", "landing"]"#).unwrap();
        config.validate().unwrap();
        let layout = config.layout();
        assert!(layout.is_skeleton("landing"));
        assert!(!layout.is_skeleton("product"));
    }

    #[test]
    fn rejects_skeleton_with_separator() {
        let config = SiteConfig {
            skeletons: vec!["a/b".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.pages_dir, "pages");
    }
}
