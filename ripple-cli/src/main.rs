//! Ripple — track upstream git repositories and review what landed.
//!
//! # Usage
//!
//! ```text
//! ripple setup <name> <source> [--ref <branch>] [--synced] [--local] [--ignore]
//! ripple list [--json]
//! ripple log <name> [--depth <n>] [--filter <keyword>] [--json]
//! ripple diff <name> <commit>
//! ripple mark-synced <name> [--tip <commit>]
//! ```
//!
//! # Exit codes
//!
//! - `0` — success, including "nothing new"
//! - `2` — configuration error (malformed or conflicting registry)
//! - `3` — checkout/fetch error (missing path, clone or fetch failure)
//! - `4` — consistency error (unreachable pointer, stale tip)
//! - `5` — not found (unknown project, unreachable commit)

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, list::ListArgs, log::LogArgs, mark_synced::MarkSyncedArgs, setup::SetupArgs,
};
use ripple_core::ConfigError;
use ripple_git::{GitError, GitErrorKind};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ripple",
    version,
    about = "Track upstream git repositories and review commits since the last sync",
    long_about = None,
)]
struct Cli {
    /// Host project root holding the .ripple/ state directory
    /// (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register or update a tracked project.
    Setup(SetupArgs),

    /// Show every tracked project with its pending-commit count.
    List(ListArgs),

    /// Show commits since the last sync and capture the reviewed tip.
    Log(LogArgs),

    /// Show the patch for a single commit.
    Diff(DiffArgs),

    /// Advance the sync pointer to a reviewed tip.
    MarkSynced(MarkSyncedArgs),
}

// ---------------------------------------------------------------------------
// Exit-code mapping
// ---------------------------------------------------------------------------

const EXIT_CONFIG: i32 = 2;
const EXIT_CHECKOUT: i32 = 3;
const EXIT_CONSISTENCY: i32 = 4;
const EXIT_NOT_FOUND: i32 = 5;

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(git) = err.downcast_ref::<GitError>() {
        return git_exit_code(git);
    }
    if let Some(config) = err.downcast_ref::<ConfigError>() {
        return config_exit_code(config);
    }
    1
}

fn git_exit_code(err: &GitError) -> i32 {
    match err.kind() {
        GitErrorKind::Checkout => EXIT_CHECKOUT,
        GitErrorKind::NotFound => EXIT_NOT_FOUND,
        GitErrorKind::Consistency => EXIT_CONSISTENCY,
        GitErrorKind::Config => match err {
            GitError::Config(inner) => config_exit_code(inner),
            _ => EXIT_CONFIG,
        },
    }
}

fn config_exit_code(err: &ConfigError) -> i32 {
    match err {
        ConfigError::UnknownProject { .. } => EXIT_NOT_FOUND,
        _ => EXIT_CONFIG,
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                eprintln!("error: cannot determine current directory: {err}");
                std::process::exit(EXIT_CONFIG);
            }
        },
    };

    let result = match cli.command {
        Commands::Setup(args) => args.run(&root),
        Commands::List(args) => args.run(&root),
        Commands::Log(args) => args.run(&root),
        Commands::Diff(args) => args.run(&root),
        Commands::MarkSynced(args) => args.run(&root),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
