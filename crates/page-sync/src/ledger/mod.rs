//! Outbox ledger of deferred page synchronization
//!
//! Hooks running in outbox mode append intents here instead of touching page
//! and data files. The projection worker drains the ledger later. The ledger
//! is persisted as TOML; every read-modify-write runs under an exclusive lock
//! on a sidecar lock file.

mod intent;

pub use intent::{Intent, IntentStatus};

use crate::error::{Error, Result};
use crate::layout::ResourceKind;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Ordered list of intents, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Ledger format version for forward compatibility
    version: String,
    #[serde(default)]
    intents: Vec<Intent>,
}

fn open_lock(path: &Path, extension: &str) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path.with_extension(extension))?;
    Ok(file)
}

/// Exclusive right to apply intents from one ledger.
///
/// Separate from the ledger lock so hooks can keep appending while a worker
/// applies effects. Released on drop.
#[derive(Debug)]
pub struct DrainLock {
    file: File,
}

impl Drop for DrainLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            intents: Vec::new(),
        }
    }

    /// Load a ledger, treating a missing file as an empty ledger.
    ///
    /// Takes a shared lock for the duration of the read.
    pub fn load(path: &Path) -> Result<Self> {
        let lock = open_lock(path, "toml.lock")?;
        lock.lock_shared()?;
        let ledger = Self::read_unlocked(path);
        lock.unlock()?;
        ledger
    }

    fn read_unlocked(path: &Path) -> Result<Self> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        toml::from_str(&content).map_err(|e| Error::LedgerError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn write_unlocked(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Save the ledger atomically under an exclusive lock.
    pub fn save(&self, path: &Path) -> Result<()> {
        let lock = open_lock(path, "toml.lock")?;
        lock.lock_exclusive()?;
        let result = self.write_unlocked(path);
        lock.unlock()?;
        result
    }

    /// Load, modify and save the ledger as one locked step.
    ///
    /// The ledger is only written back when `f` succeeds.
    pub fn transact<T>(path: &Path, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let lock = open_lock(path, "toml.lock")?;
        lock.lock_exclusive()?;
        let result = (|| {
            let mut ledger = Self::read_unlocked(path)?;
            let value = f(&mut ledger)?;
            ledger.write_unlocked(path)?;
            Ok(value)
        })();
        lock.unlock()?;
        result
    }

    /// Block until no other worker is draining this ledger.
    pub fn lock_drain(path: &Path) -> Result<DrainLock> {
        let file = open_lock(path, "toml.drain.lock")?;
        file.lock_exclusive()?;
        Ok(DrainLock { file })
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn add_intent(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn remove_intent(&mut self, uuid: Uuid) -> Option<Intent> {
        let pos = self.intents.iter().position(|i| i.uuid == uuid)?;
        Some(self.intents.remove(pos))
    }

    pub fn get_intent(&self, uuid: Uuid) -> Option<&Intent> {
        self.intents.iter().find(|i| i.uuid == uuid)
    }

    pub fn get_intent_mut(&mut self, uuid: Uuid) -> Option<&mut Intent> {
        self.intents.iter_mut().find(|i| i.uuid == uuid)
    }

    /// Complete the oldest open update of a record with its new key.
    pub fn complete_update(
        &mut self,
        kind: ResourceKind,
        record_id: &str,
        after_key: &str,
    ) -> Result<Uuid> {
        let intent = self
            .intents
            .iter_mut()
            .find(|i| i.is_for(kind, record_id) && i.status == IntentStatus::Open)
            .ok_or_else(|| Error::IntentNotFound {
                id: format!("open update for {kind} {record_id}"),
            })?;
        intent.after_key = Some(after_key.to_string());
        intent.status = IntentStatus::Pending;
        Ok(intent.uuid)
    }

    pub fn find_by_status(&self, status: IntentStatus) -> Vec<&Intent> {
        self.intents.iter().filter(|i| i.status == status).collect()
    }

    pub fn find_by_record(&self, kind: ResourceKind, record_id: &str) -> Vec<&Intent> {
        self.intents
            .iter()
            .filter(|i| i.is_for(kind, record_id))
            .collect()
    }
}
