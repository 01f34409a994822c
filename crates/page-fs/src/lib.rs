//! Filesystem capability layer for the page synchronizer
//!
//! Provides root-relative path handling, atomic writes with locking, and the
//! [`PageFs`] capability trait with a disk-backed and an in-memory implementation.

pub mod capability;
pub mod checksum;
pub mod config;
pub mod disk;
pub mod error;
pub mod io;
pub mod memory;
pub mod path;

pub use capability::PageFs;
pub use config::ConfigStore;
pub use disk::DiskFs;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use memory::MemoryFs;
pub use path::{NormalizedPath, validate_path_segment};
