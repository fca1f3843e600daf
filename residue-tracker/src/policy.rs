//! Age policy sources.
//!
//! The sweep asks its [`RetentionSource`] for the threshold at the start of
//! every pass and never caches the answer, so an operator can change
//! retention between sweeps without restarting the agent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use residue_core::{config, types::RetentionThreshold};

/// Where the sweep reads the current retention threshold from.
pub trait RetentionSource: Send + Sync {
    fn threshold(&self) -> RetentionThreshold;
}

/// A fixed threshold.
impl RetentionSource for RetentionThreshold {
    fn threshold(&self) -> RetentionThreshold {
        *self
    }
}

impl<T: RetentionSource + ?Sized> RetentionSource for Arc<T> {
    fn threshold(&self) -> RetentionThreshold {
        (**self).threshold()
    }
}

// ---------------------------------------------------------------------------
// SharedRetention
// ---------------------------------------------------------------------------

const DISABLED_SENTINEL: i64 = -1;

/// A threshold another thread can change at runtime. Clones share the value.
#[derive(Debug, Clone)]
pub struct SharedRetention {
    hours: Arc<AtomicI64>,
}

impl SharedRetention {
    pub fn new(initial: RetentionThreshold) -> Self {
        Self {
            hours: Arc::new(AtomicI64::new(encode(initial))),
        }
    }

    pub fn set(&self, threshold: RetentionThreshold) {
        self.hours.store(encode(threshold), Ordering::Release);
    }
}

impl RetentionSource for SharedRetention {
    fn threshold(&self) -> RetentionThreshold {
        // Only `encode` writes here, so decoding cannot fail.
        RetentionThreshold::from_hours(self.hours.load(Ordering::Acquire))
            .unwrap_or(RetentionThreshold::Disabled)
    }
}

fn encode(threshold: RetentionThreshold) -> i64 {
    match threshold {
        RetentionThreshold::Hours(h) => i64::from(h),
        RetentionThreshold::Disabled => DISABLED_SENTINEL,
    }
}

// ---------------------------------------------------------------------------
// ConfigFileRetention
// ---------------------------------------------------------------------------

/// Re-reads `retention_hours` from the tracker config file on every call.
///
/// A config that cannot be read or parsed yields `Disabled`: when in doubt,
/// delete nothing.
#[derive(Debug, Clone)]
pub struct ConfigFileRetention {
    path: PathBuf,
}

impl ConfigFileRetention {
    /// Watch `<home>/.residue/config.yaml`.
    pub fn at(home: &Path) -> Self {
        Self::from_path(config::config_path_at(home))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RetentionSource for ConfigFileRetention {
    fn threshold(&self) -> RetentionThreshold {
        match config::load_from(&self.path) {
            Ok(config) => config.retention_hours,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable tracker config, sweeping disabled for this pass",
                );
                RetentionThreshold::Disabled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn shared_retention_updates_are_visible_to_clones() {
        let shared = SharedRetention::new(RetentionThreshold::Hours(24));
        let seen_by_sweep = shared.clone();
        assert_eq!(seen_by_sweep.threshold(), RetentionThreshold::Hours(24));

        shared.set(RetentionThreshold::Disabled);
        assert_eq!(seen_by_sweep.threshold(), RetentionThreshold::Disabled);

        shared.set(RetentionThreshold::Hours(0));
        assert_eq!(seen_by_sweep.threshold(), RetentionThreshold::Hours(0));
    }

    #[test]
    fn config_file_is_reread_on_every_call() {
        let home = TempDir::new().unwrap();
        let source = ConfigFileRetention::at(home.path());
        assert_eq!(source.threshold(), RetentionThreshold::Disabled);

        std::fs::create_dir_all(source.path().parent().unwrap()).unwrap();
        std::fs::write(source.path(), "retention_hours: 8\n").unwrap();
        assert_eq!(source.threshold(), RetentionThreshold::Hours(8));

        std::fs::write(source.path(), "retention_hours: -1\n").unwrap();
        assert_eq!(source.threshold(), RetentionThreshold::Disabled);
    }

    #[test]
    fn malformed_config_disables_sweeping() {
        let home = TempDir::new().unwrap();
        let source = ConfigFileRetention::at(home.path());
        std::fs::create_dir_all(source.path().parent().unwrap()).unwrap();
        std::fs::write(source.path(), "retention_hours: {{{\n").unwrap();
        assert_eq!(source.threshold(), RetentionThreshold::Disabled);
    }
}
