//! `residue status [--json]`: registry location, size, and settings.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use residue_core::{config, registry, TrackerConfig};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    registry: String,
    registry_exists: bool,
    entries: usize,
    unique_entries: usize,
    config: TrackerConfig,
}

impl StatusArgs {
    pub fn run(self, home: &Path) -> Result<()> {
        let cfg = config::load_at(home).context("failed to load tracker config")?;
        let path = registry::registry_path_at(home);
        let entries = registry::read_entries(&path).context("failed to read registry")?;
        let unique = entries.iter().collect::<HashSet<_>>().len();

        let status = StatusJson {
            registry: path.display().to_string(),
            registry_exists: path.exists(),
            entries: entries.len(),
            unique_entries: unique,
            config: cfg,
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_summary(&status);
        Ok(())
    }
}

fn print_summary(status: &StatusJson) {
    println!(
        "Residue v{} | {} tracked ({} unique)",
        env!("CARGO_PKG_VERSION"),
        status.entries,
        status.unique_entries,
    );
    let registry_note = if status.registry_exists {
        String::new()
    } else {
        " (not created yet)".bright_black().to_string()
    };
    println!("Registry:   {}{registry_note}", status.registry);

    let retention = status.config.retention_hours;
    let retention_label = if retention.is_disabled() {
        "disabled".yellow().bold().to_string()
    } else {
        retention.to_string().green().bold().to_string()
    };
    println!("Retention:  {retention_label}");
    println!("Age basis:  {}", status.config.age_basis);
    println!("Backoff:    {}ms", status.config.backoff_ms);
}
