//! In-memory [`PageFs`] fake for tests

use crate::{Error, NormalizedPath, PageFs, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    read_only: BTreeSet<String>,
}

/// Thread-safe map of path to file content.
///
/// Paths marked with [`MemoryFs::deny_writes`] reject write, append, rename
/// and remove with `PermissionDenied`, which lets tests drive failure paths.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn insert(&self, path: &str, content: impl Into<Vec<u8>>) {
        let key = NormalizedPath::new(path).as_str().to_string();
        self.lock().files.insert(key, content.into());
    }

    /// Make every mutating call touching `path` fail.
    pub fn deny_writes(&self, path: &str) {
        let key = NormalizedPath::new(path).as_str().to_string();
        self.lock().read_only.insert(key);
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the files from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn io_error(path: &NormalizedPath, kind: ErrorKind) -> Error {
    Error::io(path.to_native(), std::io::Error::from(kind))
}

fn check_writable(state: &State, path: &NormalizedPath) -> Result<()> {
    if state.read_only.contains(path.as_str()) {
        return Err(io_error(path, ErrorKind::PermissionDenied));
    }
    Ok(())
}

impl PageFs for MemoryFs {
    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        self.lock()
            .files
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| io_error(path, ErrorKind::NotFound))
    }

    fn write(&self, path: &NormalizedPath, content: &[u8]) -> Result<()> {
        let mut state = self.lock();
        check_writable(&state, path)?;
        state.files.insert(path.as_str().to_string(), content.to_vec());
        Ok(())
    }

    fn append(&self, path: &NormalizedPath, content: &[u8]) -> Result<()> {
        let mut state = self.lock();
        check_writable(&state, path)?;
        state
            .files
            .entry(path.as_str().to_string())
            .or_default()
            .extend_from_slice(content);
        Ok(())
    }

    fn copy(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
        let mut state = self.lock();
        check_writable(&state, to)?;
        let content = state
            .files
            .get(from.as_str())
            .cloned()
            .ok_or_else(|| io_error(from, ErrorKind::NotFound))?;
        state.files.insert(to.as_str().to_string(), content);
        Ok(())
    }

    fn rename(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
        let mut state = self.lock();
        check_writable(&state, from)?;
        check_writable(&state, to)?;
        let content = state
            .files
            .remove(from.as_str())
            .ok_or_else(|| io_error(from, ErrorKind::NotFound))?;
        state.files.insert(to.as_str().to_string(), content);
        Ok(())
    }

    fn remove(&self, path: &NormalizedPath) -> Result<()> {
        let mut state = self.lock();
        check_writable(&state, path)?;
        state
            .files
            .remove(path.as_str())
            .map(|_| ())
            .ok_or_else(|| io_error(path, ErrorKind::NotFound))
    }

    fn exists(&self, path: &NormalizedPath) -> bool {
        self.lock().files.contains_key(path.as_str())
    }

    fn list(&self, dir: &NormalizedPath) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir.as_str().trim_end_matches('/'));
        let state = self.lock();
        Ok(state
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/') && !rest.starts_with('.'))
            .map(str::to_string)
            .collect())
    }
}
