//! Outbox commands: enqueue, drain and pending

use colored::Colorize;
use page_sync::{
    HookDispatcher, HookItem, HookOutcome, HookPhase, IntentStatus, Ledger, Operation,
    ProjectionWorker, ResourceKind, TemplateType,
};

use super::print_outcome;
use crate::context::SiteContext;
use crate::error::Result;

/// Arguments of one recorded hook call.
pub struct EnqueueArgs<'a> {
    pub phase: HookPhase,
    pub operation: Operation,
    pub kind: ResourceKind,
    pub id: &'a str,
    pub key: &'a str,
    pub template: Option<&'a str>,
}

pub fn run_enqueue(site: &SiteContext, args: EnqueueArgs<'_>) -> Result<()> {
    let mut item = HookItem::new(args.id, args.key);
    if let Some(template) = args.template {
        item = item.with_template(TemplateType::parse(template)?);
    }

    let hooks = HookDispatcher::outbox(site.synchronizer.clone(), site.ledger_path());
    match hooks.dispatch(args.kind, args.phase, args.operation, &item)? {
        HookOutcome::Enqueued(uuid) => println!(
            "{} {} {} {} queued as {}",
            "=>".blue().bold(),
            args.phase,
            args.operation,
            args.kind,
            uuid.to_string().dimmed()
        ),
        HookOutcome::Ignored => println!(
            "{} {} {} needs no file changes",
            "--".dimmed(),
            args.phase,
            args.operation
        ),
        HookOutcome::Applied(outcome) => print_outcome(&outcome),
    }
    Ok(())
}

pub fn run_drain(site: &SiteContext, retry_failed: bool, json: bool) -> Result<()> {
    let worker = ProjectionWorker::new(
        site.synchronizer.clone(),
        site.ledger_path(),
        site.config.retry.clone(),
    )
    .retry_failed(retry_failed);
    let report = worker.drain()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} Applied {} intent(s), {} deferred",
            "=>".blue().bold(),
            report.applied.len(),
            report.deferred.len()
        );
        print_outcome(&report.outcome);
        for failed in &report.failed {
            println!(
                "   {} {} after {} attempt(s): {}",
                "FAILED".red().bold(),
                failed.uuid,
                failed.attempts,
                failed.error
            );
        }
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(crate::error::CliError::user(format!(
            "{} intent(s) failed; run `pagesync drain --retry-failed` after fixing them",
            report.failed.len()
        )))
    }
}

pub fn run_pending(site: &SiteContext, json: bool) -> Result<()> {
    let ledger = Ledger::load(&site.ledger_path())?;

    if json {
        println!("{}", serde_json::to_string_pretty(ledger.intents())?);
        return Ok(());
    }
    if ledger.intents().is_empty() {
        println!("{} Outbox is empty.", "OK".green().bold());
        return Ok(());
    }
    for intent in ledger.intents() {
        let status = match intent.status {
            IntentStatus::Open => "open".yellow(),
            IntentStatus::Pending => "pending".cyan(),
            IntentStatus::Failed => "failed".red(),
        };
        let keys = match (&intent.before_key, &intent.after_key) {
            (Some(before), Some(after)) => format!("{before} -> {after}"),
            (Some(key), None) | (None, Some(key)) => key.clone(),
            (None, None) => String::new(),
        };
        println!(
            "   {} {} {} {} [{}]",
            status,
            intent.operation,
            intent.kind,
            keys,
            intent.record_id.dimmed()
        );
        if let Some(error) = &intent.last_error {
            println!("      {}", error.dimmed());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_test_utils::TestSite;

    fn args<'a>(phase: HookPhase, operation: Operation, key: &'a str) -> EnqueueArgs<'a> {
        EnqueueArgs {
            phase,
            operation,
            kind: ResourceKind::Template,
            id: "3",
            key,
            template: None,
        }
    }

    #[test]
    fn enqueued_rename_is_applied_by_drain() {
        let site = TestSite::with_layout();
        let context = SiteContext::open(site.root(), None, None).unwrap();

        run_enqueue(&context, args(HookPhase::After, Operation::Create, "card")).unwrap();
        run_enqueue(&context, args(HookPhase::Before, Operation::Update, "card")).unwrap();
        run_enqueue(&context, args(HookPhase::After, Operation::Update, "tile")).unwrap();
        site.assert_file_not_exists("data/template/card.json");

        run_drain(&context, false, false).unwrap();
        site.assert_file_exists("data/template/tile.json");
        site.assert_file_exists("pages/template/tile.tsx");
        run_pending(&context, false).unwrap();
    }

    #[test]
    fn delete_of_an_absent_record_drains_cleanly() {
        let site = TestSite::with_layout();
        let context = SiteContext::open(site.root(), None, None).unwrap();

        run_enqueue(&context, args(HookPhase::Before, Operation::Delete, "ghost")).unwrap();

        run_drain(&context, false, false).unwrap();
        assert!(Ledger::load(&context.ledger_path()).unwrap().intents().is_empty());
    }

    #[test]
    fn failed_drain_is_an_error() {
        let site = TestSite::with_layout();
        site.write_config("[retry]\nmax_attempts = 1\ninitial_interval_ms = 1\n");
        let context = SiteContext::open(site.root(), None, None).unwrap();

        let create = EnqueueArgs {
            kind: ResourceKind::Webpage,
            template: Some("product"),
            ..args(HookPhase::After, Operation::Create, "shop")
        };
        run_enqueue(&context, create).unwrap();

        assert!(run_drain(&context, false, true).is_err());
        assert_eq!(Ledger::load(&context.ledger_path()).unwrap().intents().len(), 1);
    }
}
