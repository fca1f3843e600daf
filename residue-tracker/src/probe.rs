//! Resolve a tracked path to an age stamp.
//!
//! Every failure is reported as a value. A single odd entry (a symlink loop,
//! a name the OS rejects) must never stop the sweep from cleaning up the rest.

use std::fs::{self, Metadata};
use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::{Duration, SystemTime};

use residue_core::types::AgeBasis;

/// Outcome of resolving one tracked path.
#[derive(Debug)]
pub enum FileProbe {
    /// A regular file, stamped with the timestamp that defines its age.
    Present { stamp: SystemTime },
    /// Nothing at the path any more.
    NotFound,
    /// The path exists but we are not allowed to inspect it.
    AccessDenied,
    /// The entry cannot be validated: blank, bad syntax, not a regular
    /// file, or any other lookup failure.
    Malformed { reason: String },
}

/// Look up `path` and classify the result.
pub fn probe(path: &Path, basis: AgeBasis) -> FileProbe {
    if path.as_os_str().is_empty() {
        return FileProbe::Malformed {
            reason: "empty path".to_string(),
        };
    }

    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) => return classify(err),
    };
    if !meta.is_file() {
        return FileProbe::Malformed {
            reason: "not a regular file".to_string(),
        };
    }

    match stamp(&meta, basis) {
        Ok(stamp) => FileProbe::Present { stamp },
        Err(err) => FileProbe::Malformed {
            reason: format!("no usable timestamp: {err}"),
        },
    }
}

/// Elapsed wall-clock time between `stamp` and `now`.
///
/// A stamp in the future (clock skew, restored backups) counts as age zero.
pub fn age(stamp: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(stamp).unwrap_or_default()
}

fn stamp(meta: &Metadata, basis: AgeBasis) -> io::Result<SystemTime> {
    match basis {
        // Not every filesystem records a birth time.
        AgeBasis::Created => meta.created().or_else(|_| meta.modified()),
        AgeBasis::Modified => meta.modified(),
    }
}

fn classify(err: io::Error) -> FileProbe {
    match err.kind() {
        ErrorKind::NotFound => FileProbe::NotFound,
        ErrorKind::PermissionDenied => FileProbe::AccessDenied,
        _ => FileProbe::Malformed {
            reason: err.to_string(),
        },
    }
}
