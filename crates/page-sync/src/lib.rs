//! Page synchronization for content record lifecycle events
//!
//! Keeps a site's `pages/*` entries and `data/*.json` content files in step
//! with the `Post` and `Template` records of the CMS:
//!
//! - **Synchronizer**: create, shift, update and delete of data/page pairs
//! - **Hooks**: maps the CMS before/after callbacks onto the synchronizer
//! - **Ledger**: outbox of deferred intents, persisted as TOML
//! - **Worker**: drains the outbox with retry
//! - **Check**: finds orphaned halves of pairs and leftover staged files
//!
//! ```text
//!     CMS lifecycle notifier
//!              |
//!        HookDispatcher ---- Ledger ---- ProjectionWorker
//!              |                               |
//!              +-------- PageSynchronizer -----+
//!                              |
//!                       page_fs::PageFs
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod hooks;
pub mod layout;
pub mod ledger;
pub mod record;
pub mod staging;
pub mod synchronizer;
pub mod worker;

pub use check::{CheckItem, CheckReport, CheckStatus, check_layout};
pub use config::{RetryConfig, SiteConfig, StagingPolicy};
pub use error::{Error, Result};
pub use hooks::{DispatchMode, HookDispatcher, HookOutcome, HookPhase, Operation};
pub use layout::{FilePair, ResourceKind, SiteLayout};
pub use ledger::{DrainLock, Intent, IntentStatus, Ledger};
pub use record::{HookItem, PostRecord, PostStatus, RecordKey, TemplateRecord, TemplateType};
pub use staging::StagedUpdate;
pub use synchronizer::{PageSynchronizer, SyncOutcome};
pub use worker::{DrainReport, ProjectionWorker};
