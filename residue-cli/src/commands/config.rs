//! `residue config <show|set-retention|set-age-basis|set-backoff>`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use residue_core::{config, types::RetentionThreshold, TrackerConfig};

use super::super::AgeBasisArg;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective config (defaults filled in).
    Show,

    /// Set the retention window in hours, or `disabled` to stop cleanup.
    ///
    /// Takes effect on the next flush, including in running processes.
    SetRetention {
        #[arg(value_name = "HOURS|disabled", allow_negative_numbers = true)]
        retention: RetentionThreshold,
    },

    /// Choose which timestamp defines a file's age: created | modified.
    SetAgeBasis {
        #[arg(value_name = "BASIS")]
        basis: AgeBasisArg,
    },

    /// How long a producer waits when it collides with a sweep, in milliseconds.
    SetBackoff {
        #[arg(value_name = "MS")]
        millis: u64,
    },
}

pub fn run(home: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(home),
        ConfigCommand::SetRetention { retention } => update(home, |cfg| {
            cfg.retention_hours = retention;
            println!("✓ Retention set to {retention}");
        }),
        ConfigCommand::SetAgeBasis { basis } => update(home, |cfg| {
            cfg.age_basis = basis.into();
            println!("✓ Age basis set to {basis}");
        }),
        ConfigCommand::SetBackoff { millis } => update(home, |cfg| {
            cfg.backoff_ms = millis;
            println!("✓ Backoff set to {millis}ms");
        }),
    }
}

fn show(home: &Path) -> Result<()> {
    let path = config::config_path_at(home);
    let cfg = config::load_from(&path).context("failed to load tracker config")?;
    println!("config:          {}", path.display());
    println!("retention_hours: {}", cfg.retention_hours);
    println!("age_basis:       {}", cfg.age_basis);
    println!("backoff_ms:      {}", cfg.backoff_ms);
    Ok(())
}

fn update(home: &Path, apply: impl FnOnce(&mut TrackerConfig)) -> Result<()> {
    let mut cfg = config::load_at(home).context("failed to load tracker config")?;
    apply(&mut cfg);
    config::save_at(home, &cfg).context("failed to save tracker config")?;
    Ok(())
}
