//! The filesystem capability the synchronizer depends on
//!
//! All paths are relative to the site root owned by the implementation.

use crate::{NormalizedPath, Result};

/// Small explicit set of filesystem effects.
///
/// Implementations decide where the root lives; callers only ever pass
/// site-relative paths such as `data/template/product.json`.
pub trait PageFs: Send + Sync {
    /// Read a whole file.
    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>>;

    /// Create or truncate a file with the given content.
    fn write(&self, path: &NormalizedPath, content: &[u8]) -> Result<()>;

    /// Append to a file, creating it when absent.
    fn append(&self, path: &NormalizedPath, content: &[u8]) -> Result<()>;

    /// Copy `from` over `to`, overwriting `to`.
    fn copy(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()>;

    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &NormalizedPath, to: &NormalizedPath) -> Result<()>;

    /// Remove a file. Fails when the file does not exist.
    fn remove(&self, path: &NormalizedPath) -> Result<()>;

    fn exists(&self, path: &NormalizedPath) -> bool;

    /// Names of the regular, non-hidden files directly inside `dir`, sorted.
    ///
    /// A missing directory lists as empty.
    fn list(&self, dir: &NormalizedPath) -> Result<Vec<String>>;

    /// Read a file as UTF-8 text.
    fn read_text(&self, path: &NormalizedPath) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            crate::Error::io(
                path.to_native(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }
}
