//! Error types for page-fs

use std::path::PathBuf;

/// Result type for page-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the site filesystem layer.
///
/// Missing files surface as [`Error::Io`] with `NotFound`; callers that
/// tolerate them check [`Error::is_not_found`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A site file could not be read, written, moved or removed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `pagesync.toml` (or its JSON/YAML form) is not valid for its format
    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// A config value could not be written back out
    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// Config file extension is not toml, json, yaml or yml
    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    /// Another writer held the `.<file>.lock` sidecar past the lock timeout
    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    /// A record key or template tag cannot be used as a file stem
    #[error("Invalid path segment {value:?}: {reason}")]
    InvalidPath { value: String, reason: String },
}

impl Error {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reports a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_site_file() {
        let err = Error::io(
            "pages/hello.tsx",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("pages/hello.tsx"));
    }

    #[test]
    fn lock_failure_is_not_a_missing_file() {
        let err = Error::LockFailed {
            path: "data/.hello.json.lock".into(),
        };
        assert!(!err.is_not_found());
    }
}
