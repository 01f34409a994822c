//! Lifecycle hooks for content records
//!
//! The CMS calls a before-hook and an after-hook around every mutation of a
//! `Post` or `Template`. [`HookDispatcher`] maps those calls onto the
//! synchronizer:
//!
//! - after create: create the pair
//! - before update: shift the pair into staging
//! - after update: move the staged pair to the new key
//! - before delete: remove the pair
//!
//! Every other phase/operation combination is a no-op. In outbox mode the
//! dispatcher only records intents and the projection worker applies them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use page_fs::checksum::compute_checksum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::layout::ResourceKind;
use crate::ledger::{Intent, Ledger};
use crate::record::{HookItem, TemplateType, validate_record_id};
use crate::synchronizer::{PageSynchronizer, SyncOutcome};

/// Mutation reported by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl Operation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Which side of the database commit a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// Whether hooks touch files now or defer to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    Direct,
    Outbox { ledger_path: PathBuf },
}

/// Result of a single hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Effects applied immediately
    Applied(SyncOutcome),
    /// Intent recorded or completed in the outbox
    Enqueued(uuid::Uuid),
    /// Nothing to do for this phase and operation
    Ignored,
}

pub struct HookDispatcher {
    synchronizer: Arc<PageSynchronizer>,
    mode: DispatchMode,
}

impl HookDispatcher {
    pub fn new(synchronizer: Arc<PageSynchronizer>, mode: DispatchMode) -> Self {
        Self { synchronizer, mode }
    }

    pub fn direct(synchronizer: Arc<PageSynchronizer>) -> Self {
        Self::new(synchronizer, DispatchMode::Direct)
    }

    pub fn outbox(synchronizer: Arc<PageSynchronizer>, ledger_path: impl Into<PathBuf>) -> Self {
        Self::new(
            synchronizer,
            DispatchMode::Outbox {
                ledger_path: ledger_path.into(),
            },
        )
    }

    pub fn mode(&self) -> &DispatchMode {
        &self.mode
    }

    /// Hook called before the database commit.
    pub fn before_operation(
        &self,
        kind: ResourceKind,
        operation: Operation,
        item: &HookItem,
    ) -> Result<HookOutcome> {
        self.dispatch(kind, HookPhase::Before, operation, item)
    }

    /// Hook called after the database commit.
    pub fn after_operation(
        &self,
        kind: ResourceKind,
        operation: Operation,
        item: &HookItem,
    ) -> Result<HookOutcome> {
        self.dispatch(kind, HookPhase::After, operation, item)
    }

    pub fn dispatch(
        &self,
        kind: ResourceKind,
        phase: HookPhase,
        operation: Operation,
        item: &HookItem,
    ) -> Result<HookOutcome> {
        debug!(%kind, %phase, %operation, id = %item.id, key = %item.key, "hook");
        match (phase, operation) {
            (HookPhase::After, Operation::Create)
            | (HookPhase::Before, Operation::Update)
            | (HookPhase::After, Operation::Update)
            | (HookPhase::Before, Operation::Delete) => {}
            _ => return Ok(HookOutcome::Ignored),
        }

        match &self.mode {
            DispatchMode::Direct => self.apply(kind, phase, operation, item).map(HookOutcome::Applied),
            DispatchMode::Outbox { ledger_path } => self
                .enqueue(ledger_path, kind, phase, operation, item)
                .map(HookOutcome::Enqueued),
        }
    }

    fn apply(
        &self,
        kind: ResourceKind,
        phase: HookPhase,
        operation: Operation,
        item: &HookItem,
    ) -> Result<SyncOutcome> {
        let key = item.record_key()?;
        let sync = &self.synchronizer;
        match (phase, operation) {
            (HookPhase::After, Operation::Create) => sync.create(kind, &key, item.template.as_ref()),
            (HookPhase::Before, Operation::Update) => sync.shift(kind, &item.id, &key),
            (HookPhase::After, Operation::Update) => sync.update(kind, &item.id, &key),
            (HookPhase::Before, Operation::Delete) => sync.delete(kind, &key),
            _ => Ok(SyncOutcome::default()),
        }
    }

    fn enqueue(
        &self,
        ledger_path: &Path,
        kind: ResourceKind,
        phase: HookPhase,
        operation: Operation,
        item: &HookItem,
    ) -> Result<uuid::Uuid> {
        let key = item.record_key()?;
        validate_record_id(&item.id)?;

        let uuid = Ledger::transact(ledger_path, |ledger| match (phase, operation) {
            (HookPhase::Before, Operation::Update) => {
                let intent = Intent::open_update(kind, &item.id, key.as_str());
                let uuid = intent.uuid;
                ledger.add_intent(intent);
                Ok(uuid)
            }
            (HookPhase::After, Operation::Update) => {
                ledger.complete_update(kind, &item.id, key.as_str())
            }
            (HookPhase::Before, Operation::Delete) => {
                let intent = Intent::delete(kind, &item.id, key.as_str());
                let uuid = intent.uuid;
                ledger.add_intent(intent);
                Ok(uuid)
            }
            _ => {
                let template = match kind {
                    ResourceKind::Webpage => Some(item.template.clone().unwrap_or_default()),
                    ResourceKind::Template => None,
                };
                let payload_ref = template.as_ref().and_then(|t| self.skeleton_checksum(t));
                let intent = Intent::create(kind, &item.id, key.as_str(), template, payload_ref);
                let uuid = intent.uuid;
                ledger.add_intent(intent);
                Ok(uuid)
            }
        })?;

        info!(%kind, %phase, %operation, %uuid, "queued page sync intent");
        Ok(uuid)
    }

    fn skeleton_checksum(&self, template: &TemplateType) -> Option<String> {
        let skeleton = self.synchronizer.layout().skeleton(template.as_str());
        self.synchronizer
            .fs()
            .read(&skeleton)
            .ok()
            .map(|bytes| compute_checksum(&bytes))
    }
}
