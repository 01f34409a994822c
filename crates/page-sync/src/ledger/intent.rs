//! Intent type for deferred page synchronization
//!
//! An intent records one lifecycle event whose filesystem effect has not been
//! applied yet. Updates are recorded in two steps: the before-hook opens the
//! intent with the old key, the after-hook completes it with the new key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hooks::Operation;
use crate::layout::ResourceKind;
use crate::record::TemplateType;

/// Where an intent is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Update whose after-hook has not fired yet
    Open,
    /// Ready for the worker
    Pending,
    /// Ran out of attempts; kept for inspection and a later retry
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: ResourceKind,
    pub operation: Operation,
    pub record_id: String,
    /// Key before the operation (update, delete)
    pub before_key: Option<String>,
    /// Key after the operation (create, update)
    pub after_key: Option<String>,
    pub template: Option<TemplateType>,
    /// Checksum of the skeleton at enqueue time
    pub payload_ref: Option<String>,
    pub status: IntentStatus,
    #[serde(default)]
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl Intent {
    fn new(kind: ResourceKind, operation: Operation, record_id: &str, status: IntentStatus) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            operation,
            record_id: record_id.to_string(),
            before_key: None,
            after_key: None,
            template: None,
            payload_ref: None,
            status,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn create(
        kind: ResourceKind,
        record_id: &str,
        key: &str,
        template: Option<TemplateType>,
        payload_ref: Option<String>,
    ) -> Self {
        let mut intent = Self::new(kind, Operation::Create, record_id, IntentStatus::Pending);
        intent.after_key = Some(key.to_string());
        intent.template = template;
        intent.payload_ref = payload_ref;
        intent
    }

    /// Opened by the before-update hook; not runnable until completed.
    pub fn open_update(kind: ResourceKind, record_id: &str, before_key: &str) -> Self {
        let mut intent = Self::new(kind, Operation::Update, record_id, IntentStatus::Open);
        intent.before_key = Some(before_key.to_string());
        intent
    }

    pub fn delete(kind: ResourceKind, record_id: &str, key: &str) -> Self {
        let mut intent = Self::new(kind, Operation::Delete, record_id, IntentStatus::Pending);
        intent.before_key = Some(key.to_string());
        intent
    }

    /// Whether this intent concerns the given record.
    pub fn is_for(&self, kind: ResourceKind, record_id: &str) -> bool {
        self.kind == kind && self.record_id == record_id
    }

    /// Record a failed attempt.
    pub fn record_failure(&mut self, attempts: u32, error: String) {
        self.attempts += attempts;
        self.status = IntentStatus::Failed;
        self.last_error = Some(error);
    }
}
