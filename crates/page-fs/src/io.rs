//! Atomic I/O operations with file locking

use crate::{Error, NormalizedPath, Result};
use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Tuning for locked writes.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// How long to keep retrying a contended lock before giving up.
    pub lock_timeout: Duration,
    /// Whether to fsync written content before the rename.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Sidecar lock path: `.<file name>.lock` next to the target.
fn lock_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.lock", name))
}

/// Acquire an exclusive advisory lock on the sidecar file, retrying with
/// exponential backoff until `lock_timeout` elapses.
fn acquire_lock(target: &Path, config: RobustnessConfig) -> Result<File> {
    let lock_path = lock_path_for(target);
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(5))
        .with_max_interval(Duration::from_millis(200))
        .with_max_elapsed_time(Some(config.lock_timeout))
        .build();

    backoff::retry(policy, || {
        lock_file
            .try_lock_exclusive()
            .map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    Ok(lock_file)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(&native_path)?;

    let lock = acquire_lock(&native_path, config)?;

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;
        if config.enable_fsync {
            temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        }
        fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    lock.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    result
}

/// Append content to a file under the same lock used by [`write_atomic`].
///
/// Creates the file when absent.
pub fn append(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(&native_path)?;

    let lock = acquire_lock(&native_path, config)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))?;
    file.write_all(content)
        .map_err(|e| Error::io(&native_path, e))?;
    if config.enable_fsync {
        file.sync_all().map_err(|e| Error::io(&native_path, e))?;
    }

    lock.unlock().map_err(|_| Error::LockFailed { path: native_path })?;
    Ok(())
}

/// Remove a file and its lock sidecar, holding the lock while unlinking.
pub fn remove(path: &NormalizedPath, config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    let lock = acquire_lock(&native_path, config)?;

    let result = fs::remove_file(&native_path).map_err(|e| Error::io(&native_path, e));
    release_sidecar(&native_path, lock)?;
    result
}

/// Rename a file, dropping the source's lock sidecar.
pub fn rename(from: &NormalizedPath, to: &NormalizedPath, config: RobustnessConfig) -> Result<()> {
    let source = from.to_native();
    let target = to.to_native();
    ensure_parent(&target)?;

    let lock = acquire_lock(&source, config)?;
    let result = fs::rename(&source, &target).map_err(|e| Error::io(&source, e));
    if result.is_ok() {
        release_sidecar(&source, lock)?;
    } else {
        lock.unlock().map_err(|_| Error::LockFailed { path: source })?;
    }
    result
}

/// Unlink the sidecar of a file that no longer exists, then unlock it.
fn release_sidecar(target: &Path, lock: File) -> Result<()> {
    let lock_path = lock_path_for(target);
    if let Err(e) = fs::remove_file(&lock_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        return Err(Error::io(&lock_path, e));
    }
    lock.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}
