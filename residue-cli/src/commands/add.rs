//! `residue add <path>...`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use residue_tracker::{AddOutcome, FileTracker};

/// Record files the agent created.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Files to track. Relative paths are resolved against the working directory.
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,
}

impl AddArgs {
    pub fn run(self, home: &Path) -> Result<()> {
        let tracker = FileTracker::open_at(home).context("failed to open tracker")?;
        let cwd = std::env::current_dir().context("cannot read working directory")?;

        for path in self.paths {
            let absolute = if path.is_absolute() { path } else { cwd.join(path) };
            let outcome = tracker
                .try_add(absolute.as_path())
                .with_context(|| format!("failed to track '{}'", absolute.display()))?;
            match outcome {
                AddOutcome::Recorded => println!("✓ Tracking {}", absolute.display()),
                AddOutcome::DroppedDuringSweep => {
                    println!("· Skipped {} (sweep in progress)", absolute.display())
                }
            }
        }
        Ok(())
    }
}
