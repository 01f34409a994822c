//! Page synchronizer CLI
//!
//! Drives the synchronizer, the outbox and the layout check for a site
//! directory.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::outbox::EnqueueArgs;
use context::SiteContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {}", "warning".yellow(), e);
    }

    let Some(command) = cli.command else {
        println!("{} page synchronizer", "pagesync".green().bold());
        println!();
        println!("Run {} for available commands.", "pagesync --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let site = SiteContext::open(&cwd, cli.root.as_deref(), cli.config.as_deref())?;
    execute_command(&site, command)
}

fn execute_command(site: &SiteContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::CreatePage { slug, template } => {
            commands::run_create_page(site, &slug, &template)
        }
        Commands::CreateTemplate { name } => commands::run_create_template(site, &name),
        Commands::Shift { kind, id, key } => commands::run_shift(site, kind.into(), &id, &key),
        Commands::Update { kind, id, key } => commands::run_update(site, kind.into(), &id, &key),
        Commands::Delete { kind, key } => commands::run_delete(site, kind.into(), &key),
        Commands::Enqueue {
            phase,
            operation,
            kind,
            id,
            key,
            template,
        } => commands::run_enqueue(
            site,
            EnqueueArgs {
                phase: phase.into(),
                operation: operation.into(),
                kind: kind.into(),
                id: &id,
                key: &key,
                template: template.as_deref(),
            },
        ),
        Commands::Drain { retry_failed, json } => commands::run_drain(site, retry_failed, json),
        Commands::Check { json } => commands::run_check(site, json),
        Commands::Pending { json } => commands::run_pending(site, json),
    }
}
