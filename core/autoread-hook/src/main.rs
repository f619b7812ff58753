//! autoread-hook: CLI hook handler that surfaces context files once per session.
//!
//! Called directly by Claude Code hooks configured in ~/.claude/settings.json.
//!
//! ## Subcommands
//!
//! - `handle`: Main hook handler, reads JSON from stdin
//! - `patterns`: Print the autoread patterns in effect for a directory
//! - `locate`: Print the entries found for a directory as JSON
//! - `mark`: Record a path as surfaced for a session

mod handle;
mod inspect;
mod logging;
mod render;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autoread-hook")]
#[command(about = "Surface autoread context files once per session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a hook event (reads JSON from stdin)
    Handle,

    /// Print the patterns in effect for a directory
    Patterns {
        /// Start directory (defaults to the current directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print the autoread entries for a directory as JSON
    Locate {
        /// Start directory (defaults to the current directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Record a path as surfaced for a session (prints "new" or "seen")
    Mark {
        /// Session identifier
        #[arg(value_name = "SESSION")]
        session: String,

        /// Resolved path to record
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn main() {
    let logging_guard = logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Handle => handle::run().map_err(|e| e.to_string()),
        Commands::Patterns { dir } => inspect::patterns(dir),
        Commands::Locate { dir } => inspect::locate(dir),
        Commands::Mark { session, path } => inspect::mark(&session, &path),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "autoread-hook failed");
        eprintln!("autoread-hook: {}", e);
        drop(logging_guard);
        std::process::exit(1);
    }
}
