//! # residue-tracker
//!
//! Writer guard, age policy, and sweep engine around the residue registry.
//!
//! Build one [`FileTracker`] at startup and share it (`Arc<FileTracker>`)
//! with every producer, which calls [`FileTracker::add`] after creating a
//! file, and with whatever scheduler calls [`FileTracker::flush`].

pub mod error;
pub mod guard;
pub mod policy;
pub mod probe;
pub mod sweep;
pub mod tracker;

pub use error::TrackerError;
pub use policy::{ConfigFileRetention, RetentionSource, SharedRetention};
pub use sweep::{EntryVerdict, SweepReport, SweepStatus};
pub use tracker::{AddOutcome, FileTracker};
