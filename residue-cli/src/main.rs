//! Residue: operator CLI for the agent's file retention tracker.
//!
//! # Usage
//!
//! ```text
//! residue [--home <dir>] add <path>...
//! residue [--home <dir>] flush [--json]
//! residue [--home <dir>] list
//! residue [--home <dir>] status [--json]
//! residue [--home <dir>] config show
//! residue [--home <dir>] config set-retention <hours|disabled>
//! ```

mod commands;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use residue_core::{registry, types::AgeBasis};

use commands::{
    add::AddArgs, config::ConfigCommand, flush::FlushArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "residue",
    version,
    about = "Track files created by the automation agent and sweep them once they age out",
    long_about = None,
)]
struct Cli {
    /// Directory holding `.residue/` (defaults to the user's home directory).
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record created files so a later flush can clean them up.
    Add(AddArgs),

    /// Run one retention sweep now.
    Flush(FlushArgs),

    /// Print every tracked path in registry order.
    List,

    /// Show registry location, size, and retention settings.
    Status(StatusArgs),

    /// Inspect or change the tracker config.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared AgeBasis argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `AgeBasis` from CLI args.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeBasisArg(pub AgeBasis);

impl FromStr for AgeBasisArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "birth" => Ok(Self(AgeBasis::Created)),
            "modified" | "mtime" => Ok(Self(AgeBasis::Modified)),
            other => Err(format!(
                "unknown age basis '{other}'; expected: created, modified"
            )),
        }
    }
}

impl fmt::Display for AgeBasisArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AgeBasisArg> for AgeBasis {
    fn from(arg: AgeBasisArg) -> Self {
        arg.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let home = match cli.home {
        Some(home) => home,
        None => registry::home().context("could not determine home directory")?,
    };

    match cli.command {
        Commands::Add(args) => args.run(&home),
        Commands::Flush(args) => args.run(&home),
        Commands::List => commands::list::run(&home),
        Commands::Status(args) => args.run(&home),
        Commands::Config { command } => commands::config::run(&home, command),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
