//! The process-wide file retention tracker.
//!
//! ## Synchronization
//!
//! Two primitives guard the one registry file:
//!
//! - `append_lock` (a `Mutex<()>`) serializes producer appends, and is also
//!   taken by the sweep for the duration of its rewrite so that an append
//!   which passed the probe just before the pass began cannot land in the
//!   file being replaced.
//! - `sweep_flag` (see [`crate::guard`]) marks a pass in progress. Producers
//!   only ever `load` it; a producer that sees it set sleeps for `backoff`
//!   and drops its entry instead of waiting for the pass.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime};

use residue_core::{config, registry, types::AgeBasis, RegistryError, TrackedPath};

use crate::error::TrackerError;
use crate::guard::SweepFlag;
use crate::policy::{ConfigFileRetention, RetentionSource};
use crate::sweep::{self, SweepStatus};

/// Producers that lose the race against a sweep sleep this long by default.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(config::DEFAULT_BACKOFF_MS);

type Clock = Box<dyn Fn() -> SystemTime + Send + Sync>;

/// What happened to one [`FileTracker::try_add`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The entry was appended to the registry.
    Recorded,
    /// A sweep held ownership; the caller backed off and the entry was dropped.
    DroppedDuringSweep,
}

pub struct FileTracker {
    registry_path: PathBuf,
    policy: Box<dyn RetentionSource>,
    age_basis: AgeBasis,
    backoff: Duration,
    append_lock: Mutex<()>,
    sweep_flag: SweepFlag,
    clock: Clock,
}

impl std::fmt::Debug for FileTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTracker")
            .field("registry_path", &self.registry_path)
            .field("age_basis", &self.age_basis)
            .field("backoff", &self.backoff)
            .field("sweeping", &self.sweep_flag.is_held())
            .finish_non_exhaustive()
    }
}

impl FileTracker {
    /// A tracker over `registry_path` reading retention from `policy`.
    ///
    /// Nothing is created on disk until the first [`add`](Self::add).
    pub fn new(registry_path: impl Into<PathBuf>, policy: impl RetentionSource + 'static) -> Self {
        Self {
            registry_path: registry_path.into(),
            policy: Box::new(policy),
            age_basis: AgeBasis::default(),
            backoff: DEFAULT_BACKOFF,
            append_lock: Mutex::new(()),
            sweep_flag: SweepFlag::new(),
            clock: Box::new(SystemTime::now),
        }
    }

    /// Open the tracker for `<home>/.residue/`.
    ///
    /// Creates the run directory, takes backoff and age basis from the config
    /// file once, and re-reads retention from that file on every sweep.
    pub fn open_at(home: &Path) -> Result<Self, TrackerError> {
        registry::ensure_run_dir_at(home)?;
        let cfg = config::load_at(home)?;
        Ok(Self::new(
            registry::registry_path_at(home),
            ConfigFileRetention::at(home),
        )
        .with_backoff(cfg.backoff())
        .with_age_basis(cfg.age_basis))
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_age_basis(mut self, basis: AgeBasis) -> Self {
        self.age_basis = basis;
        self
    }

    /// Replace the wall clock used to age files. Called once per pass.
    pub fn with_clock(mut self, clock: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn age_basis(&self) -> AgeBasis {
        self.age_basis
    }

    /// Non-blocking probe of sweep activity.
    pub fn is_sweeping(&self) -> bool {
        self.sweep_flag.is_held()
    }

    /// Entries currently in the registry, in file order.
    pub fn entries(&self) -> Result<Vec<TrackedPath>, TrackerError> {
        Ok(registry::read_entries(&self.registry_path)?)
    }

    // -----------------------------------------------------------------------
    // Producers
    // -----------------------------------------------------------------------

    /// Record that `path` was created and may later need cleanup.
    ///
    /// Never fails and never panics: tracking is advisory, so problems are
    /// logged at trace level and the entry is lost.
    pub fn add(&self, path: impl Into<TrackedPath>) {
        let entry = path.into();
        match self.try_add(entry.clone()) {
            Ok(AddOutcome::Recorded) => {}
            Ok(AddOutcome::DroppedDuringSweep) => {
                tracing::trace!(path = %entry, "sweep in progress, entry not tracked");
            }
            Err(err) => {
                tracing::trace!(path = %entry, error = %err, "failed to track file");
            }
        }
    }

    /// [`add`](Self::add), reporting what happened.
    pub fn try_add(&self, path: impl Into<TrackedPath>) -> Result<AddOutcome, TrackerError> {
        let entry = path.into();
        if !entry.is_line_safe() {
            return Err(RegistryError::InvalidEntry {
                entry: entry.0,
                reason: "contains a line terminator",
            }
            .into());
        }

        if !self.registry_path.exists() {
            registry::touch(&self.registry_path)?;
        }

        if self.sweep_flag.is_held() {
            thread::sleep(self.backoff);
            return Ok(AddOutcome::DroppedDuringSweep);
        }

        let _appends = self.lock_appends();
        registry::append(&self.registry_path, &entry)?;
        Ok(AddOutcome::Recorded)
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    /// Run one retention pass, absorbing every error.
    ///
    /// Intended to be called by an external scheduler; the tracker has no
    /// timer of its own.
    pub fn flush(&self) {
        match self.sweep() {
            Ok(SweepStatus::Completed(report)) => {
                tracing::info!(
                    registry = %self.registry_path.display(),
                    scanned = report.scanned,
                    deleted = report.deleted.len(),
                    dropped = report.dropped.len(),
                    delete_failed = report.delete_failed.len(),
                    "retention sweep completed",
                );
            }
            Ok(SweepStatus::Busy) => {
                tracing::debug!("retention sweep already running, skipping");
            }
            Ok(status) => {
                tracing::trace!(status = ?status, "retention sweep skipped");
            }
            Err(err) => {
                tracing::error!(
                    registry = %self.registry_path.display(),
                    error = %err,
                    "retention sweep aborted",
                );
            }
        }
    }

    /// Run one retention pass and report what it did.
    ///
    /// 1. Read the threshold; stop if disabled.
    /// 2. Stop if there is no registry.
    /// 3. Take sweep ownership for the rest of the pass (or report `Busy`).
    /// 4. Evaluate every entry, deleting aged files.
    /// 5. If anything was resolved, compact it out of the registry.
    ///
    /// Only a failure to read or rewrite the registry itself aborts the pass,
    /// leaving the registry as it was before the failing step. Problems with
    /// individual entries become verdicts in the report.
    pub fn sweep(&self) -> Result<SweepStatus, TrackerError> {
        let Some(max_age) = self.policy.threshold().as_duration() else {
            return Ok(SweepStatus::Disabled);
        };
        if !self.registry_path.exists() {
            return Ok(SweepStatus::NoRegistry);
        }
        let Some(_ownership) = self.sweep_flag.try_acquire() else {
            return Ok(SweepStatus::Busy);
        };

        tracing::trace!(registry = %self.registry_path.display(), "sweeping registry");
        let now = (self.clock)();
        let entries = registry::read_entries(&self.registry_path)?;
        let mut report = sweep::scan(&entries, max_age, self.age_basis, now);

        let resolved = report.resolved();
        if !resolved.is_empty() {
            let _appends = self.lock_appends();
            report.rewrite = Some(registry::rewrite_without(&self.registry_path, &resolved)?);
        }

        Ok(SweepStatus::Completed(report))
    }

    fn lock_appends(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no bad state.
        self.append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
