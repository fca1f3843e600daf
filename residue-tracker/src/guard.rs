//! Sweep ownership flag observed by producers.
//!
//! The flag is a bare `AtomicBool` so that the producers' "is a sweep
//! running?" probe is a single load and can never block. Ownership is taken
//! with `compare_exchange` and released when the [`SweepGuard`] drops, which
//! also covers early returns and panics inside a pass.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SweepFlag {
    held: AtomicBool,
}

impl SweepFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking probe: is a sweep currently holding ownership?
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Take ownership, or `None` if another sweep already holds it.
    pub fn try_acquire(&self) -> Option<SweepGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard { flag: self })
    }
}

/// Exclusive sweep ownership; the flag clears on drop.
#[derive(Debug)]
pub struct SweepGuard<'a> {
    flag: &'a SweepFlag,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.flag.held.store(false, Ordering::Release);
    }
}
