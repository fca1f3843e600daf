//! Error types for residue-tracker.

use std::path::PathBuf;

use thiserror::Error;

use residue_core::error::RegistryError;

/// Errors surfaced by the fallible tracker entry points
/// ([`FileTracker::try_add`](crate::FileTracker::try_add),
/// [`FileTracker::sweep`](crate::FileTracker::sweep)).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// An error from the registry store.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`TrackerError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TrackerError {
    TrackerError::Io {
        path: path.into(),
        source,
    }
}
