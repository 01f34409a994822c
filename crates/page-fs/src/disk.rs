//! Disk-backed [`PageFs`] rooted at a site directory

use crate::io::{self, RobustnessConfig};
use crate::{Error, NormalizedPath, PageFs, Result};
use std::fs;
use tracing::debug;

/// Performs filesystem effects under a root directory.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: NormalizedPath,
    robustness: RobustnessConfig,
}

impl DiskFs {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self {
            root: root.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(root: impl Into<NormalizedPath>, robustness: RobustnessConfig) -> Self {
        Self {
            root: root.into(),
            robustness,
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    fn resolve(&self, path: &NormalizedPath) -> NormalizedPath {
        self.root.join(path.as_str())
    }
}

impl PageFs for DiskFs {
    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        let native = self.resolve(path).to_native();
        fs::read(&native).map_err(|e| Error::io(native, e))
    }

    fn write(&self, path: &NormalizedPath, content: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        debug!(path = %full, bytes = content.len(), "write");
        io::write_atomic(&full, content, self.robustness)
    }

    fn append(&self, path: &NormalizedPath, content: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        debug!(path = %full, bytes = content.len(), "append");
        io::append(&full, content, self.robustness)
    }

    fn copy(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
        let source = self.resolve(from);
        let target = self.resolve(to);
        debug!(from = %source, to = %target, "copy");
        // Read then write atomically so a reader of `to` never sees a half copy
        let content = fs::read(source.to_native()).map_err(|e| Error::io(source.to_native(), e))?;
        io::write_atomic(&target, &content, self.robustness)
    }

    fn rename(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
        let source = self.resolve(from);
        let target = self.resolve(to);
        debug!(from = %source, to = %target, "rename");
        if !source.is_file() {
            return Err(Error::io(
                source.to_native(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        io::rename(&source, &target, self.robustness)
    }

    fn remove(&self, path: &NormalizedPath) -> Result<()> {
        let full = self.resolve(path);
        debug!(path = %full, "remove");
        if !full.is_file() {
            return Err(Error::io(
                full.to_native(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        io::remove(&full, self.robustness)
    }

    fn exists(&self, path: &NormalizedPath) -> bool {
        self.resolve(path).is_file()
    }

    fn list(&self, dir: &NormalizedPath) -> Result<Vec<String>> {
        let native = self.resolve(dir).to_native();
        let entries = match fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(native, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let is_file = entry
                .file_type()
                .map(|t| t.is_file())
                .map_err(|e| Error::io(entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
