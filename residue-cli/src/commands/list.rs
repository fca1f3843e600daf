//! `residue list`: tracked paths with their current age.

use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tabled::{settings::Style, Table, Tabled};

use residue_core::{config, registry};
use residue_tracker::probe::{self, FileProbe};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "state")]
    state: &'static str,
    #[tabled(rename = "age")]
    age: String,
}

pub fn run(home: &Path) -> Result<()> {
    let cfg = config::load_at(home).context("failed to load tracker config")?;
    let entries = registry::read_entries(&registry::registry_path_at(home))
        .context("failed to read registry")?;

    if entries.is_empty() {
        println!("No files tracked.");
        return Ok(());
    }

    let now = SystemTime::now();
    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|entry| {
            let (state, age) = match probe::probe(entry.as_path(), cfg.age_basis) {
                FileProbe::Present { stamp } => ("present", format_age(probe::age(stamp, now))),
                FileProbe::NotFound => ("missing", "-".to_string()),
                FileProbe::AccessDenied => ("denied", "-".to_string()),
                FileProbe::Malformed { .. } => ("malformed", "-".to_string()),
            };
            EntryRow {
                path: entry.to_string(),
                state,
                age,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} entries", entries.len());
    Ok(())
}

fn format_age(age: Duration) -> String {
    let seconds = age.as_secs();
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
