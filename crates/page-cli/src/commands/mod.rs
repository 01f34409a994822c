//! Command implementations for page-cli

pub mod check;
pub mod lifecycle;
pub mod outbox;

pub use check::run_check;
pub use lifecycle::{run_create_page, run_create_template, run_delete, run_shift, run_update};
pub use outbox::{run_drain, run_enqueue, run_pending};

use colored::Colorize;
use page_sync::SyncOutcome;

/// Print what an operation did and what it tolerated.
pub(crate) fn print_outcome(outcome: &SyncOutcome) {
    for action in &outcome.actions {
        println!("   {} {}", "+".green(), action);
    }
    for warning in &outcome.warnings {
        println!("   {} {}", "!".yellow(), warning);
    }
}
