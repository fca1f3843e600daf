//! Sweep engine: decide the fate of every registry entry.
//!
//! Verdict precedence for one entry:
//! 1. `Dropped`: the path can never be validated (malformed, access denied)
//! 2. `Missing`: nothing on disk; the entry stays tracked
//! 3. `Retained`: age at or below the threshold
//! 4. `Deleted`: older than the threshold and removed
//! 5. `DeleteFailed`: older than the threshold, removal failed; retried next pass
//!
//! `Deleted` and `Dropped` entries are *resolved* and get compacted out of the
//! registry. Everything else stays.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use residue_core::{registry::RewriteStats, types::AgeBasis, TrackedPath};

use crate::probe::{self, FileProbe};

/// Per-entry decision of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryVerdict {
    Deleted,
    Dropped,
    Retained,
    Missing,
    DeleteFailed,
}

impl EntryVerdict {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Deleted | Self::Dropped)
    }
}

/// What one completed pass did. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Registry lines examined, duplicates included.
    pub scanned: usize,
    pub deleted: Vec<TrackedPath>,
    pub dropped: Vec<TrackedPath>,
    pub delete_failed: Vec<TrackedPath>,
    pub retained: usize,
    pub missing: usize,
    /// Present only when resolved entries forced a registry rewrite.
    pub rewrite: Option<RewriteStats>,
}

impl SweepReport {
    /// Entries to compact out of the registry.
    pub fn resolved(&self) -> HashSet<TrackedPath> {
        self.deleted.iter().chain(&self.dropped).cloned().collect()
    }

    fn record(&mut self, entry: &TrackedPath, verdict: EntryVerdict) {
        match verdict {
            EntryVerdict::Deleted => self.deleted.push(entry.clone()),
            EntryVerdict::Dropped => self.dropped.push(entry.clone()),
            EntryVerdict::DeleteFailed => self.delete_failed.push(entry.clone()),
            EntryVerdict::Retained => self.retained += 1,
            EntryVerdict::Missing => self.missing += 1,
        }
    }
}

/// Result of asking the tracker for a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepStatus {
    /// Retention is disabled; the registry was not touched.
    Disabled,
    /// No registry file exists yet.
    NoRegistry,
    /// Another pass holds ownership.
    Busy,
    Completed(SweepReport),
}

/// Evaluate every entry, deleting aged files.
///
/// Duplicate lines are evaluated once; repeats inherit the first verdict.
/// Per-entry failures become verdicts, so one bad entry never stops the pass.
pub fn scan(
    entries: &[TrackedPath],
    max_age: Duration,
    basis: AgeBasis,
    now: SystemTime,
) -> SweepReport {
    let mut report = SweepReport::default();
    let mut seen: HashMap<&TrackedPath, EntryVerdict> = HashMap::new();

    for entry in entries {
        report.scanned += 1;
        if let Some(verdict) = seen.get(entry) {
            if !verdict.is_resolved() {
                report.record(entry, *verdict);
            }
            continue;
        }
        let verdict = evaluate(entry, max_age, basis, now);
        report.record(entry, verdict);
        seen.insert(entry, verdict);
    }

    report
}

/// Decide, and if warranted delete, a single tracked file.
pub fn evaluate(
    entry: &TrackedPath,
    max_age: Duration,
    basis: AgeBasis,
    now: SystemTime,
) -> EntryVerdict {
    let path = entry.as_path();
    let stamp = match probe::probe(path, basis) {
        FileProbe::Present { stamp } => stamp,
        FileProbe::NotFound => {
            tracing::trace!(path = %entry, "tracked file already gone");
            return EntryVerdict::Missing;
        }
        FileProbe::AccessDenied => {
            tracing::trace!(path = %entry, "tracked file inaccessible, dropping entry");
            return EntryVerdict::Dropped;
        }
        FileProbe::Malformed { reason } => {
            tracing::trace!(path = %entry, reason = %reason, "malformed entry, dropping");
            return EntryVerdict::Dropped;
        }
    };

    let age = probe::age(stamp, now);
    tracing::trace!(path = %entry, age_secs = age.as_secs(), "delete evaluation");
    if age <= max_age {
        return EntryVerdict::Retained;
    }

    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %entry, age_secs = age.as_secs(), "deleted aged file");
            EntryVerdict::Deleted
        }
        Err(err) if err.kind() == ErrorKind::NotFound => EntryVerdict::Missing,
        Err(err) => {
            tracing::debug!(path = %entry, error = %err, "could not delete aged file");
            EntryVerdict::DeleteFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::path::Path;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn aged_file(dir: &TempDir, name: &str, age: Duration) -> TrackedPath {
        let path = dir.path().join(name);
        fs::write(&path, b"residue").unwrap();
        let stamp = SystemTime::now() - age;
        set_file_mtime(&path, FileTime::from_system_time(stamp)).unwrap();
        TrackedPath::from(path.as_path())
    }

    #[test]
    fn aged_file_is_deleted() {
        let dir = TempDir::new().unwrap();
        let p1 = aged_file(&dir, "p1.docx", 10 * HOUR);
        let verdict = evaluate(&p1, 5 * HOUR, AgeBasis::Modified, SystemTime::now());
        assert_eq!(verdict, EntryVerdict::Deleted);
        assert!(!p1.as_path().exists());
    }

    #[test]
    fn young_file_is_retained() {
        let dir = TempDir::new().unwrap();
        let p2 = aged_file(&dir, "p2.docx", HOUR);
        let verdict = evaluate(&p2, 5 * HOUR, AgeBasis::Modified, SystemTime::now());
        assert_eq!(verdict, EntryVerdict::Retained);
        assert!(p2.as_path().exists());
    }

    #[test]
    fn age_equal_to_threshold_is_retained() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edge.txt");
        fs::write(&path, b"x").unwrap();
        let stamp = SystemTime::now() - 2 * HOUR;
        set_file_mtime(&path, FileTime::from_system_time(stamp)).unwrap();

        // Evaluate at exactly stamp + threshold, read back from disk to avoid
        // sub-second truncation by the filesystem.
        let on_disk = fs::metadata(&path).unwrap().modified().unwrap();
        let entry = TrackedPath::from(path.as_path());
        let verdict = evaluate(&entry, 2 * HOUR, AgeBasis::Modified, on_disk + 2 * HOUR);
        assert_eq!(verdict, EntryVerdict::Retained);
    }

    #[test]
    fn zero_hour_threshold_deletes_anything_older_than_now() {
        let dir = TempDir::new().unwrap();
        let entry = aged_file(&dir, "fresh.txt", Duration::from_secs(5));
        let verdict = evaluate(&entry, Duration::ZERO, AgeBasis::Modified, SystemTime::now());
        assert_eq!(verdict, EntryVerdict::Deleted);
    }

    #[test]
    fn missing_file_stays_tracked() {
        let dir = TempDir::new().unwrap();
        let entry = TrackedPath::from(dir.path().join("gone.txt").as_path());
        let verdict = evaluate(&entry, HOUR, AgeBasis::Created, SystemTime::now());
        assert_eq!(verdict, EntryVerdict::Missing);
        assert!(!verdict.is_resolved());
    }

    #[test]
    fn blank_entry_is_dropped() {
        let verdict = evaluate(&TrackedPath::from(""), HOUR, AgeBasis::Created, SystemTime::now());
        assert_eq!(verdict, EntryVerdict::Dropped);
    }

    #[test]
    fn directories_are_never_deleted() {
        let dir = TempDir::new().unwrap();
        let entry = TrackedPath::from(dir.path());
        let verdict =
            evaluate(&entry, Duration::ZERO, AgeBasis::Modified, SystemTime::now() + HOUR);
        assert_eq!(verdict, EntryVerdict::Dropped);
        assert!(Path::new(entry.as_str()).is_dir());
    }

    #[test]
    fn scan_resolves_duplicates_once() {
        let dir = TempDir::new().unwrap();
        let old = aged_file(&dir, "old.xlsx", 10 * HOUR);
        let young = aged_file(&dir, "young.xlsx", HOUR);
        let entries = vec![old.clone(), young.clone(), old.clone()];

        let report = scan(&entries, 5 * HOUR, AgeBasis::Modified, SystemTime::now());
        assert_eq!(report.scanned, 3);
        assert_eq!(report.deleted, vec![old.clone()]);
        assert_eq!(report.retained, 1);
        assert_eq!(report.missing, 0, "the repeat must not be re-probed as missing");
        assert_eq!(report.resolved(), HashSet::from([old]));
    }

    #[cfg(unix)]
    #[test]
    fn delete_failure_keeps_entry_tracked() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let path = locked.join("held.docx");
        fs::write(&path, b"x").unwrap();
        let stamp = SystemTime::now() - 10 * HOUR;
        set_file_mtime(&path, FileTime::from_system_time(stamp)).unwrap();
        // Read + search but no write on the parent: unlink fails with EACCES.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let entry = TrackedPath::from(path.as_path());
        let verdict = evaluate(&entry, HOUR, AgeBasis::Modified, SystemTime::now());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores directory permissions; only assert where they apply.
        if path.exists() {
            assert_eq!(verdict, EntryVerdict::DeleteFailed);
        }
    }

    #[cfg(unix)]
    #[test]
    fn inaccessible_file_is_dropped_without_deletion() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let sealed = dir.path().join("sealed");
        fs::create_dir(&sealed).unwrap();
        let path = sealed.join("hidden.docx");
        fs::write(&path, b"x").unwrap();
        // No search permission on the parent: stat fails with EACCES.
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();

        let entry = TrackedPath::from(path.as_path());
        let verdict = evaluate(&entry, Duration::ZERO, AgeBasis::Modified, SystemTime::now() + HOUR);
        let readable_anyway = fs::metadata(&path).is_ok();
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores directory permissions; only assert where they apply.
        if !readable_anyway {
            assert_eq!(verdict, EntryVerdict::Dropped);
            assert!(path.exists(), "an inaccessible file is never deleted");
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_does_not_stop_the_scan() {
        let dir = TempDir::new().unwrap();
        let looped = dir.path().join("loop");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let looped = TrackedPath::from(looped.as_path());
        let old = aged_file(&dir, "old.docx", 10 * HOUR);

        let report = scan(
            &[looped.clone(), old.clone()],
            HOUR,
            AgeBasis::Modified,
            SystemTime::now(),
        );
        assert_eq!(report.dropped, vec![looped]);
        assert_eq!(report.deleted, vec![old.clone()]);
        assert!(!old.as_path().exists());
    }
}
