//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use page_sync::{HookPhase, Operation, ResourceKind};

/// Keep page and data files in step with CMS records
#[derive(Parser, Debug)]
#[command(name = "pagesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site root (defaults to the nearest directory with pagesync.toml)
    #[arg(long, global = true, env = "PAGESYNC_ROOT")]
    pub root: Option<PathBuf>,

    /// Explicit configuration file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Record collection on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    #[value(aliases = ["page", "post"])]
    Webpage,
    Template,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Webpage => ResourceKind::Webpage,
            KindArg::Template => ResourceKind::Template,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseArg {
    Before,
    After,
}

impl From<PhaseArg> for HookPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Before => HookPhase::Before,
            PhaseArg::After => HookPhase::After,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationArg {
    Create,
    Update,
    Delete,
}

impl From<OperationArg> for Operation {
    fn from(op: OperationArg) -> Self {
        match op {
            OperationArg::Create => Operation::Create,
            OperationArg::Update => Operation::Update,
            OperationArg::Delete => Operation::Delete,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the data and page files of a new webpage
    ///
    /// Examples:
    ///   pagesync create-page hello                 # seeded from data/template/none.json
    ///   pagesync create-page shop -t ecommerce
    CreatePage {
        /// Page slug
        slug: String,

        /// Skeleton to seed the data file from
        #[arg(short, long, default_value = "none")]
        template: String,
    },

    /// Create the data and page files of a new template
    CreateTemplate {
        /// Template name
        name: String,
    },

    /// Park a record's files in staging before its key changes
    Shift {
        #[arg(value_enum)]
        kind: KindArg,
        /// Record id
        id: String,
        /// Current key
        key: String,
    },

    /// Move a record's staged files to its new key
    Update {
        #[arg(value_enum)]
        kind: KindArg,
        /// Record id
        id: String,
        /// New key
        key: String,
    },

    /// Remove a record's data and page files
    Delete {
        #[arg(value_enum)]
        kind: KindArg,
        /// Record key
        key: String,
    },

    /// Record a lifecycle hook in the outbox instead of applying it
    ///
    /// Examples:
    ///   pagesync enqueue after create webpage 1 hello -t product
    ///   pagesync enqueue before update webpage 1 hello
    ///   pagesync enqueue after update webpage 1 world
    Enqueue {
        #[arg(value_enum)]
        phase: PhaseArg,
        #[arg(value_enum)]
        operation: OperationArg,
        #[arg(value_enum)]
        kind: KindArg,
        /// Record id
        id: String,
        /// Record key at this phase
        key: String,
        /// Skeleton for created webpages
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Apply pending outbox intents
    Drain {
        /// Also retry intents that failed before
        #[arg(long)]
        retry_failed: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Report orphaned pairs and leftover staged files
    Check {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List intents waiting in the outbox
    Pending {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
