//! Error types for page-sync

use std::path::PathBuf;

use crate::layout::ResourceKind;

/// Result type for page-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synchronizing pages
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record key or template tag cannot name a file
    #[error("Invalid key {value:?}: {reason}")]
    InvalidKey { value: String, reason: String },

    /// The skeleton for a new webpage could not be copied
    #[error("Failed to copy skeleton {template:?}: {source}")]
    SkeletonCopy {
        template: String,
        #[source]
        source: page_fs::Error,
    },

    /// The data file of a deleted record could not be removed
    #[error("Failed to delete {path}: {source}")]
    DataFileRemove {
        path: String,
        #[source]
        source: page_fs::Error,
    },

    /// The data file of a renamed record could not be moved
    #[error("Failed to rename {from} to {to}: {source}")]
    DataFileRename {
        from: String,
        to: String,
        #[source]
        source: page_fs::Error,
    },

    /// Another update already occupies the staging slot
    #[error("Staging slot {slot} for {kind} is held by record {holder}")]
    StagingBusy {
        kind: ResourceKind,
        slot: String,
        holder: String,
    },

    /// The target key is already taken by another record's files
    #[error("{kind} key {key:?} is already in use")]
    KeyOccupied { kind: ResourceKind, key: String },

    /// Configuration values are unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error in ledger operations
    #[error("Ledger error at {path}: {message}")]
    LedgerError { path: PathBuf, message: String },

    /// Intent not found in ledger
    #[error("Intent not found: {id}")]
    IntentNotFound { id: String },

    /// Filesystem error from page-fs
    #[error(transparent)]
    Fs(#[from] page_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidKey { .. } | Self::InvalidConfig { .. } | Self::IntentNotFound { .. }
        )
    }
}
