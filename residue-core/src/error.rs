//! Error types for residue-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from registry and config operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (config save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load. Includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// An entry that cannot be stored as a single registry line.
    #[error("invalid registry entry {entry:?}: {reason}")]
    InvalidEntry { entry: String, reason: &'static str },
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
