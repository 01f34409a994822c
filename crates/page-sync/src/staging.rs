//! In-flight registry of shifted file pairs
//!
//! A slot is claimed by `shift` and released by `update`. Within a process
//! the registry is the mutual-exclusion point for slots; the synchronizer
//! holds its lock across the renames so a claim and its filesystem effects
//! are one step. Across processes the claim is the owner marker
//! `<slot>__switch.owner` written before the files move.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use page_fs::{NormalizedPath, PageFs};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotId {
    pub kind: ResourceKind,
    pub slot: String,
}

/// An update between its before- and after-hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedUpdate {
    pub kind: ResourceKind,
    pub slot: String,
    pub record_id: String,
    /// Key the files were shifted away from
    pub from_key: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct StagingRegistry {
    slots: Mutex<BTreeMap<SlotId, StagedUpdate>>,
}

impl StagingRegistry {
    pub(crate) fn lock(&self) -> MutexGuard<'_, BTreeMap<SlotId, StagedUpdate>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn snapshot(&self) -> Vec<StagedUpdate> {
        self.lock().values().cloned().collect()
    }
}

/// Persist the claim on a slot.
pub(crate) fn write_owner(fs: &dyn PageFs, path: &NormalizedPath, staged: &StagedUpdate) -> Result<()> {
    let content = serde_json::to_vec_pretty(staged)?;
    fs.write(path, &content)?;
    Ok(())
}

/// Read the claim on a slot, if any.
pub(crate) fn read_owner(fs: &dyn PageFs, path: &NormalizedPath) -> Result<Option<StagedUpdate>> {
    match fs.read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
