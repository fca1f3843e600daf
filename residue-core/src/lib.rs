//! Residue core library: domain types, registry persistence, config, errors.
//!
//! Public API surface:
//! - [`types`]: tracked paths and the retention threshold
//! - [`error`]: [`RegistryError`]
//! - [`registry`]: path-per-line registry store
//! - [`config`]: YAML tracker config under `~/.residue/`

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::TrackerConfig;
pub use error::RegistryError;
pub use types::{AgeBasis, RetentionThreshold, TrackedPath};
