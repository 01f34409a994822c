//! Keeps each record's data file and page file in step with the record
//!
//! The four operations mirror the record lifecycle:
//!
//! | hook            | operation |
//! |-----------------|-----------|
//! | after create    | `create_webpage` / `create_template` |
//! | before update   | `shift` |
//! | after update    | `update` |
//! | before delete   | `delete` |
//!
//! Between `shift` and `update` neither the old nor the new canonical path
//! exists; the files sit in the staging slot, claimed by an owner marker.

use std::sync::Arc;

use chrono::Utc;
use page_fs::{NormalizedPath, PageFs};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{SiteConfig, StagingPolicy};
use crate::error::{Error, Result};
use crate::layout::{FilePair, ResourceKind, SHARED_STAGING_STEM, SiteLayout};
use crate::record::{RecordKey, TemplateType, validate_record_id};
use crate::staging::{SlotId, StagedUpdate, StagingRegistry, read_owner, write_owner};

/// What an operation did, and what it tolerated.
///
/// Failures that do not abort the operation land in `warnings` instead of
/// being dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub actions: Vec<String>,
    pub warnings: Vec<String>,
}

impl SyncOutcome {
    fn action(&mut self, message: String) {
        debug!("{}", message);
        self.actions.push(message);
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// True when nothing was tolerated.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn merge(mut self, other: SyncOutcome) -> Self {
        self.actions.extend(other.actions);
        self.warnings.extend(other.warnings);
        self
    }
}

pub struct PageSynchronizer {
    fs: Arc<dyn PageFs>,
    layout: SiteLayout,
    staging: StagingPolicy,
    boilerplate: Vec<String>,
    registry: StagingRegistry,
}

impl std::fmt::Debug for PageSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSynchronizer")
            .field("layout", &self.layout)
            .field("staging", &self.staging)
            .finish_non_exhaustive()
    }
}

impl PageSynchronizer {
    pub fn new(fs: Arc<dyn PageFs>, config: &SiteConfig) -> Self {
        Self {
            fs,
            layout: config.layout(),
            staging: config.staging,
            boilerplate: config.boilerplate_lines(),
            registry: StagingRegistry::default(),
        }
    }

    pub fn fs(&self) -> &Arc<dyn PageFs> {
        &self.fs
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn staging_policy(&self) -> StagingPolicy {
        self.staging
    }

    /// Updates currently parked between shift and update.
    pub fn in_flight(&self) -> Vec<StagedUpdate> {
        self.registry.snapshot()
    }

    /// Create the pair for a new webpage, seeding data from the skeleton.
    ///
    /// A missing skeleton is an error; the empty data file is left behind and
    /// no page file is written. Page appends that fail are warnings.
    pub fn create_webpage(&self, key: &RecordKey, template: &TemplateType) -> Result<SyncOutcome> {
        let pair = self.layout.pair(ResourceKind::Webpage, key.as_str());
        let skeleton = self.layout.skeleton(template.as_str());
        let mut outcome = SyncOutcome::default();

        self.fs.write(&pair.data, b"")?;
        self.fs
            .copy(&skeleton, &pair.data)
            .map_err(|source| Error::SkeletonCopy {
                template: template.to_string(),
                source,
            })?;
        outcome.action(format!("Seeded {} from {}", pair.data, skeleton));

        self.append_boilerplate(&pair.page, &mut outcome);
        Ok(outcome)
    }

    /// Create the pair for a new template. Its data file starts empty.
    pub fn create_template(&self, key: &RecordKey) -> Result<SyncOutcome> {
        let pair = self.layout.pair(ResourceKind::Template, key.as_str());
        let mut outcome = SyncOutcome::default();

        self.fs.write(&pair.data, b"")?;
        outcome.action(format!("Created {}", pair.data));

        self.append_boilerplate(&pair.page, &mut outcome);
        Ok(outcome)
    }

    /// Create for either kind; `template` only matters for webpages.
    pub fn create(
        &self,
        kind: ResourceKind,
        key: &RecordKey,
        template: Option<&TemplateType>,
    ) -> Result<SyncOutcome> {
        match kind {
            ResourceKind::Webpage => {
                let fallback = TemplateType::default();
                self.create_webpage(key, template.unwrap_or(&fallback))
            }
            ResourceKind::Template => self.create_template(key),
        }
    }

    fn append_boilerplate(&self, page: &NormalizedPath, outcome: &mut SyncOutcome) {
        let mut written = 0;
        for line in &self.boilerplate {
            match self.fs.append(page, line.as_bytes()) {
                Ok(()) => written += 1,
                Err(e) => outcome.warn(format!("Could not append to {}: {}", page, e)),
            }
        }
        if written > 0 {
            outcome.action(format!("Appended {} boilerplate lines to {}", written, page));
        }
    }

    fn slot_for(&self, kind: ResourceKind, record_id: &str) -> SlotId {
        let slot = match self.staging {
            StagingPolicy::PerRecord => record_id.to_string(),
            StagingPolicy::Shared => SHARED_STAGING_STEM.to_string(),
        };
        SlotId { kind, slot }
    }

    /// Park the record's pair in its staging slot before an update commits.
    ///
    /// Fails with [`Error::StagingBusy`] when the slot is already claimed: in
    /// this process, by an owner marker, or by staged files left on disk. The
    /// marker is written before anything moves. Missing canonical files are
    /// warnings.
    pub fn shift(&self, kind: ResourceKind, record_id: &str, key: &RecordKey) -> Result<SyncOutcome> {
        validate_record_id(record_id)?;
        let slot = self.slot_for(kind, record_id);
        let staged = self.layout.staging_pair(kind, &slot.slot);
        let canonical = self.layout.pair(kind, key.as_str());
        let mut outcome = SyncOutcome::default();

        let owner = self.layout.staging_owner(kind, &slot.slot);
        let mut slots = self.registry.lock();
        if let Some(holder) = slots.get(&slot) {
            return Err(Error::StagingBusy {
                kind,
                slot: slot.slot.clone(),
                holder: holder.record_id.clone(),
            });
        }
        if let Some(holder) = read_owner(self.fs.as_ref(), &owner)? {
            return Err(Error::StagingBusy {
                kind,
                slot: slot.slot.clone(),
                holder: holder.record_id,
            });
        }
        if self.fs.exists(&staged.data) || self.fs.exists(&staged.page) {
            return Err(Error::StagingBusy {
                kind,
                slot: slot.slot.clone(),
                holder: "<staged files on disk>".to_string(),
            });
        }

        let claim = StagedUpdate {
            kind,
            slot: slot.slot.clone(),
            record_id: record_id.to_string(),
            from_key: key.to_string(),
            since: Utc::now(),
        };
        write_owner(self.fs.as_ref(), &owner, &claim)?;
        self.move_pair(&canonical, &staged, &mut outcome);
        slots.insert(slot, claim);
        Ok(outcome)
    }

    /// Move the staged pair to the canonical paths of the (new) key after an
    /// update commits, and free the slot.
    ///
    /// The slot holder comes from this process or from the owner marker on
    /// disk. A slot held by another record is left alone and reported as
    /// [`Error::StagingBusy`]; so are unclaimed staged files under shared
    /// staging. A new key whose files already exist fails with
    /// [`Error::KeyOccupied`] and keeps the staged files and the claim.
    /// Missing staged files are warnings.
    pub fn update(&self, kind: ResourceKind, record_id: &str, key: &RecordKey) -> Result<SyncOutcome> {
        validate_record_id(record_id)?;
        let slot = self.slot_for(kind, record_id);
        let staged = self.layout.staging_pair(kind, &slot.slot);
        let canonical = self.layout.pair(kind, key.as_str());
        let owner = self.layout.staging_owner(kind, &slot.slot);
        let mut outcome = SyncOutcome::default();

        let mut slots = self.registry.lock();
        let holder = match slots.get(&slot) {
            Some(holder) => Some(holder.clone()),
            None => read_owner(self.fs.as_ref(), &owner)?,
        };
        let staged_present = [&staged.data, &staged.page].map(|p| self.fs.exists(p));
        match holder {
            Some(holder) if holder.record_id != record_id => {
                return Err(Error::StagingBusy {
                    kind,
                    slot: slot.slot.clone(),
                    holder: holder.record_id,
                });
            }
            Some(_) => {}
            None if self.staging == StagingPolicy::Shared && staged_present.contains(&true) => {
                return Err(Error::StagingBusy {
                    kind,
                    slot: slot.slot.clone(),
                    holder: "<unclaimed staged files>".to_string(),
                });
            }
            None => debug!(kind = %kind, record_id, "update without a recorded shift"),
        }

        let occupied = (staged_present[0] && self.fs.exists(&canonical.data))
            || (staged_present[1] && self.fs.exists(&canonical.page));
        if occupied {
            return Err(Error::KeyOccupied {
                kind,
                key: key.to_string(),
            });
        }

        self.move_pair(&staged, &canonical, &mut outcome);
        match self.fs.remove(&owner) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => outcome.warn(format!("Could not release {}: {}", owner, e)),
        }
        slots.remove(&slot);
        Ok(outcome)
    }

    /// Move both files, tolerating failures of either.
    fn move_pair(&self, from: &FilePair, to: &FilePair, outcome: &mut SyncOutcome) {
        for (source, target) in [(&from.data, &to.data), (&from.page, &to.page)] {
            match self.fs.rename(source, target) {
                Ok(()) => outcome.action(format!("Moved {} to {}", source, target)),
                Err(e) => outcome.warn(format!("Could not move {} to {}: {}", source, target, e)),
            }
        }
    }

    /// Remove the pair before a delete commits.
    ///
    /// The page file is removed even when the data file cannot be; only the
    /// data file failure is returned.
    pub fn delete(&self, kind: ResourceKind, key: &RecordKey) -> Result<SyncOutcome> {
        let pair = self.layout.pair(kind, key.as_str());
        let mut outcome = SyncOutcome::default();

        let data_result = self.fs.remove(&pair.data);

        match self.fs.remove(&pair.page) {
            Ok(()) => outcome.action(format!("Deleted {}", pair.page)),
            Err(e) => outcome.warn(format!("Could not delete {}: {}", pair.page, e)),
        }

        data_result.map_err(|source| Error::DataFileRemove {
            path: pair.data.to_string(),
            source,
        })?;
        info!("{} has been deleted!", pair.data);
        outcome.action(format!("Deleted {}", pair.data));
        Ok(outcome)
    }

    /// Move a pair straight from one key to another without staging.
    ///
    /// Each file changes name in a single rename, so its canonical path is
    /// never missing in between. A failed data rename is an error; a failed
    /// page rename is a warning.
    pub fn rename(&self, kind: ResourceKind, from: &RecordKey, to: &RecordKey) -> Result<SyncOutcome> {
        let mut outcome = SyncOutcome::default();
        if from == to {
            outcome.action(format!("{} {} unchanged", kind, from));
            return Ok(outcome);
        }

        let source = self.layout.pair(kind, from.as_str());
        let target = self.layout.pair(kind, to.as_str());
        if self.fs.exists(&target.data) {
            return Err(Error::KeyOccupied {
                kind,
                key: to.to_string(),
            });
        }

        self.fs
            .rename(&source.data, &target.data)
            .map_err(|e| Error::DataFileRename {
                from: source.data.to_string(),
                to: target.data.to_string(),
                source: e,
            })?;
        outcome.action(format!("Moved {} to {}", source.data, target.data));

        match self.fs.rename(&source.page, &target.page) {
            Ok(()) => outcome.action(format!("Moved {} to {}", source.page, target.page)),
            Err(e) => outcome.warn(format!(
                "Could not move {} to {}: {}",
                source.page, target.page, e
            )),
        }
        Ok(outcome)
    }
}
