//! `residue flush [--json]`: run one retention pass.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use residue_tracker::{FileTracker, SweepReport, SweepStatus};

#[derive(Args, Debug)]
pub struct FlushArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl FlushArgs {
    pub fn run(self, home: &Path) -> Result<()> {
        let tracker = FileTracker::open_at(home).context("failed to open tracker")?;
        let status = tracker
            .sweep()
            .with_context(|| format!("sweep of '{}' aborted", tracker.registry_path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize sweep JSON")?
            );
            return Ok(());
        }

        match status {
            SweepStatus::Disabled => {
                println!("Retention is disabled; nothing swept.");
                println!("Run 'residue config set-retention <hours>' to enable cleanup.");
            }
            SweepStatus::NoRegistry => println!("No files tracked yet."),
            SweepStatus::Busy => println!("Another sweep is already running."),
            SweepStatus::Completed(report) => print_report(&report),
        }
        Ok(())
    }
}

fn print_report(report: &SweepReport) {
    for path in &report.deleted {
        println!("{} Deleted {path}", "✗".red().bold());
    }
    for path in &report.dropped {
        println!("{} Dropped {path}", "·".bright_black());
    }
    for path in &report.delete_failed {
        println!("{} Could not delete {path} (will retry)", "!".yellow().bold());
    }
    println!(
        "Scanned {} | {} deleted | {} dropped | {} retained | {} missing | {} failed",
        report.scanned,
        report.deleted.len(),
        report.dropped.len(),
        report.retained,
        report.missing,
        report.delete_failed.len(),
    );
}
