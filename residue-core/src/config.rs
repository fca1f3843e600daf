//! Tracker configuration stored at `<home>/.residue/config.yaml`.
//!
//! Every field is optional. An absent file yields [`TrackerConfig::default`],
//! whose retention is `Disabled`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, RegistryError};
use crate::registry::residue_root;
use crate::types::{AgeBasis, RetentionThreshold};

pub const CONFIG_FILE: &str = "config.yaml";

/// Producers that lose the race against a sweep sleep this long.
pub const DEFAULT_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub retention_hours: RetentionThreshold,
    pub backoff_ms: u64,
    pub age_basis: AgeBasis,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            retention_hours: RetentionThreshold::Disabled,
            backoff_ms: DEFAULT_BACKOFF_MS,
            age_basis: AgeBasis::default(),
        }
    }
}

impl TrackerConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// `<home>/.residue/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    residue_root(home).join(CONFIG_FILE)
}

/// Load the config file at `path`, falling back to defaults when absent.
///
/// Returns `RegistryError::Parse` (with path + line context) if malformed.
pub fn load_from(path: &Path) -> Result<TrackerConfig, RegistryError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no tracker config, using defaults");
        return Ok(TrackerConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(TrackerConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.residue/config.yaml`.
pub fn load_at(home: &Path) -> Result<TrackerConfig, RegistryError> {
    load_from(&config_path_at(home))
}

/// Atomically save the config: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(home: &Path, config: &TrackerConfig) -> Result<(), RegistryError> {
    let path = config_path_at(home);
    let dir = residue_root(home);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}
