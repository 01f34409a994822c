//! Site root and configuration discovery
//!
//! Commands work from anywhere inside a site: the root is the nearest
//! ancestor holding `pagesync.toml`, or the working directory when none does.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use page_fs::{DiskFs, NormalizedPath, PageFs};
use page_sync::config::CONFIG_FILE;
use page_sync::{PageSynchronizer, SiteConfig};

use crate::error::Result;

/// Everything a command needs about the site it runs against.
pub struct SiteContext {
    pub root: PathBuf,
    pub config: SiteConfig,
    pub synchronizer: Arc<PageSynchronizer>,
}

impl SiteContext {
    /// Resolve the root and load the configuration.
    pub fn open(cwd: &Path, root: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) if root.is_absolute() => root.to_path_buf(),
            Some(root) => cwd.join(root),
            None => find_root(cwd),
        };
        let config = match config {
            Some(path) => SiteConfig::load_from(&NormalizedPath::new(cwd.join(path)))?,
            None => SiteConfig::load(&root)?,
        };
        tracing::debug!(root = %root.display(), "opened site");

        let fs: Arc<dyn PageFs> = Arc::new(DiskFs::new(root.as_path()));
        let synchronizer = Arc::new(PageSynchronizer::new(fs, &config));
        Ok(Self {
            root,
            config,
            synchronizer,
        })
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(&self.config.ledger_path)
    }
}

/// Walk up from `cwd` looking for `pagesync.toml`.
pub fn find_root(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .unwrap_or(cwd)
        .to_path_buf()
}
