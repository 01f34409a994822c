//! Applies outbox intents to the filesystem
//!
//! Intents run oldest first. An intent that cannot run (an update still open,
//! or one that failed) blocks later intents of the same record so per-record
//! order is kept; other records proceed.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use backoff::ExponentialBackoffBuilder;
use page_fs::checksum::compute_checksum;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::hooks::Operation;
use crate::layout::ResourceKind;
use crate::ledger::{Intent, IntentStatus, Ledger};
use crate::record::RecordKey;
use crate::synchronizer::{PageSynchronizer, SyncOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct FailedIntent {
    pub uuid: Uuid,
    pub attempts: u32,
    pub error: String,
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrainReport {
    pub applied: Vec<Uuid>,
    pub failed: Vec<FailedIntent>,
    /// Intents left for a later pass (open updates and anything behind them)
    pub deferred: Vec<Uuid>,
    pub outcome: SyncOutcome,
}

impl DrainReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ProjectionWorker {
    synchronizer: Arc<PageSynchronizer>,
    ledger_path: PathBuf,
    retry: RetryConfig,
    retry_failed: bool,
}

impl ProjectionWorker {
    pub fn new(synchronizer: Arc<PageSynchronizer>, ledger_path: impl Into<PathBuf>, retry: RetryConfig) -> Self {
        Self {
            synchronizer,
            ledger_path: ledger_path.into(),
            retry,
            retry_failed: false,
        }
    }

    /// Also pick up intents that failed in an earlier pass.
    pub fn retry_failed(mut self, yes: bool) -> Self {
        self.retry_failed = yes;
        self
    }

    /// Apply every runnable intent and remove the applied ones from the ledger.
    ///
    /// Effects run outside the ledger lock. Each intent is committed on its
    /// own as soon as it is applied or has failed, so hooks are only held up
    /// for that short write and a crash replays at most one intent.
    pub fn drain(&self) -> Result<DrainReport> {
        let _drain = Ledger::lock_drain(&self.ledger_path)?;
        let queued: Vec<Intent> = Ledger::load(&self.ledger_path)?.intents().to_vec();
        let mut report = DrainReport::default();
        let mut blocked: BTreeSet<(ResourceKind, String)> = BTreeSet::new();

        for intent in queued {
            let record = (intent.kind, intent.record_id.clone());
            let runnable = match intent.status {
                IntentStatus::Pending => true,
                IntentStatus::Failed => self.retry_failed,
                IntentStatus::Open => false,
            };
            if !runnable || blocked.contains(&record) {
                blocked.insert(record);
                report.deferred.push(intent.uuid);
                continue;
            }

            let (result, attempts) = self.apply_with_retry(&intent);
            match result {
                Ok(outcome) => {
                    Ledger::transact(&self.ledger_path, |ledger| {
                        ledger.remove_intent(intent.uuid);
                        Ok(())
                    })?;
                    report.applied.push(intent.uuid);
                    report.outcome = std::mem::take(&mut report.outcome).merge(outcome);
                }
                Err(e) => {
                    warn!(uuid = %intent.uuid, attempts, error = %e, "intent failed");
                    let error = e.to_string();
                    Ledger::transact(&self.ledger_path, |ledger| {
                        if let Some(stored) = ledger.get_intent_mut(intent.uuid) {
                            stored.record_failure(attempts, error.clone());
                        }
                        Ok(())
                    })?;
                    blocked.insert(record);
                    report.failed.push(FailedIntent {
                        uuid: intent.uuid,
                        attempts,
                        error,
                    });
                }
            }
        }

        info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            deferred = report.deferred.len(),
            "drained page sync outbox"
        );
        Ok(report)
    }

    fn apply_with_retry(&self, intent: &Intent) -> (Result<SyncOutcome>, u32) {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_interval())
            .with_max_interval(self.retry.max_interval())
            .with_max_elapsed_time(None)
            .build();

        let mut attempts = 0;
        let result = backoff::retry(policy, || {
            attempts += 1;
            match self.apply(intent) {
                Ok(outcome) => Ok(outcome),
                Err(e) if e.is_retryable() && attempts < self.retry.max_attempts => {
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        });
        (result, attempts)
    }

    /// Apply one intent. Replaying an intent that already took effect is a
    /// no-op, since the ledger commit can be lost after the files changed.
    fn apply(&self, intent: &Intent) -> Result<SyncOutcome> {
        let sync = &self.synchronizer;
        let fs = sync.fs();
        let mut outcome = SyncOutcome::default();
        match intent.operation {
            Operation::Create => {
                let key = required_key(intent, intent.after_key.as_deref())?;
                let pair = sync.layout().pair(intent.kind, key.as_str());
                if fs.exists(&pair.page) {
                    outcome.actions.push(format!("{} already exists", pair.page));
                    return Ok(outcome);
                }
                if let (Some(template), Some(expected)) = (&intent.template, &intent.payload_ref) {
                    let skeleton = sync.layout().skeleton(template.as_str());
                    if let Ok(bytes) = fs.read(&skeleton)
                        && &compute_checksum(&bytes) != expected
                    {
                        outcome.warnings.push(format!(
                            "Skeleton {} changed since the create was queued",
                            skeleton
                        ));
                    }
                }
                Ok(outcome.merge(sync.create(intent.kind, &key, intent.template.as_ref())?))
            }
            Operation::Update => {
                let from = required_key(intent, intent.before_key.as_deref())?;
                let to = required_key(intent, intent.after_key.as_deref())?;
                let source = sync.layout().pair(intent.kind, from.as_str());
                let target = sync.layout().pair(intent.kind, to.as_str());
                if from != to && !fs.exists(&source.data) && fs.exists(&target.data) {
                    outcome.actions.push(format!("{} already moved to {}", source.data, target.data));
                    return Ok(outcome);
                }
                sync.rename(intent.kind, &from, &to)
            }
            Operation::Delete => {
                let key = required_key(intent, intent.before_key.as_deref())?;
                let pair = sync.layout().pair(intent.kind, key.as_str());
                if fs.exists(&pair.data) {
                    return sync.delete(intent.kind, &key);
                }
                if fs.exists(&pair.page) {
                    fs.remove(&pair.page)?;
                    outcome.actions.push(format!("Deleted {}", pair.page));
                }
                outcome.actions.push(format!("{} already deleted", pair.data));
                Ok(outcome)
            }
        }
    }
}

fn required_key(intent: &Intent, key: Option<&str>) -> Result<RecordKey> {
    let key = key.ok_or_else(|| Error::InvalidKey {
        value: String::new(),
        reason: format!("{} intent {} has no key", intent.operation, intent.uuid),
    })?;
    RecordKey::parse(key)
}
