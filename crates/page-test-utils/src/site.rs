//! Temporary site directories with seeded skeletons
//!
//! ```text
//! <root>/
//!   data/
//!     template/
//!       product.json    <- skeletons, seeded on demand
//!   pages/
//!     template/
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A site root that is deleted when dropped.
pub struct TestSite {
    temp_dir: TempDir,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    /// Create an empty site directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a site with the `data/`, `pages/` and template directories.
    pub fn with_layout() -> Self {
        let site = Self::new();
        for dir in ["data/template", "pages/template"] {
            fs::create_dir_all(site.root().join(dir)).unwrap();
        }
        site
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a site-relative path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Default location of the outbox ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.path(".pagesync/ledger.toml")
    }

    /// Write `data/template/<template>.json`.
    pub fn seed_skeleton(&self, template: &str, content: &str) -> &Self {
        self.write(&format!("data/template/{template}.json"), content)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self
    }

    /// Write `pagesync.toml` at the site root.
    pub fn write_config(&self, toml: &str) -> &Self {
        self.write("pagesync.toml", toml)
    }

    /// Read a file as text.
    ///
    /// # Panics
    /// Panics with the path when the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {}", path.display(), e))
    }

    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }

    /// Assert that the file at `relative` contains `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let actual = self.read(relative);
        assert!(
            actual.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            relative,
            content,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_skeleton_lands_under_data_template() {
        let site = TestSite::new();
        site.seed_skeleton("product", "{\"a\":1}");

        site.assert_file_exists("data/template/product.json");
        assert_eq!(site.read("data/template/product.json"), "{\"a\":1}");
    }

    #[test]
    fn layout_creates_directories() {
        let site = TestSite::with_layout();
        assert!(site.path("pages/template").is_dir());
        site.assert_file_not_exists("pages/hello.tsx");
    }
}
