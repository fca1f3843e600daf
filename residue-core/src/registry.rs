//! Path-per-line registry of files the agent has created.
//!
//! # Storage layout
//!
//! ```text
//! ~/.residue/
//!   config.yaml                 (tracker config, see `config`)
//!   run/                        (mode 0700, created on first open)
//!     files-created.log         (one tracked path per line, no header)
//! ```
//!
//! # API pattern
//!
//! Path helpers take an explicit `home` (`registry_path_at(home)`), so tests
//! run against a `TempDir`. [`home`] resolves the real one via
//! `dirs::home_dir()`.
//!
//! The store functions themselves take the registry file path directly and do
//! no locking. Serializing appends against rewrites is the caller's job.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, RegistryError};
use crate::types::TrackedPath;

pub const RESIDUE_DIR: &str = ".residue";
pub const RUN_DIR: &str = "run";
pub const REGISTRY_FILE: &str = "files-created.log";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.residue/`
pub fn residue_root(home: &Path) -> PathBuf {
    home.join(RESIDUE_DIR)
}

/// `<home>/.residue/run/`. Pure, no I/O.
pub fn run_dir(home: &Path) -> PathBuf {
    residue_root(home).join(RUN_DIR)
}

/// `<home>/.residue/run/files-created.log`. Pure, no I/O.
pub fn registry_path_at(home: &Path) -> PathBuf {
    run_dir(home).join(REGISTRY_FILE)
}

/// Create `<home>/.residue/run/` (mode `0700`) if it does not yet exist.
pub fn ensure_run_dir_at(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = run_dir(home);
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// The user's home directory, the default parent of `.residue/`.
pub fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// 2. Append
// ---------------------------------------------------------------------------

/// Create an empty registry at `path` if none exists. Never truncates.
pub fn touch(path: &Path) -> Result<(), RegistryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Append one entry as a complete line.
///
/// The line and its terminator go out in a single `write_all` on an
/// append-mode handle, so readers see the whole line or nothing of it.
pub fn append(path: &Path, entry: &TrackedPath) -> Result<(), RegistryError> {
    if !entry.is_line_safe() {
        return Err(RegistryError::InvalidEntry {
            entry: entry.0.clone(),
            reason: "contains a line terminator",
        });
    }

    let mut line = String::with_capacity(entry.0.len() + 1);
    line.push_str(&entry.0);
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| io_err(path, e))?;
    file.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Read every entry in file order. A missing registry reads as empty.
///
/// Entries that are not valid UTF-8 are decoded lossily for evaluation only;
/// [`rewrite_without`] never removes them and writes their original bytes
/// back, so they stay tracked unchanged.
pub fn read_entries(path: &Path) -> Result<Vec<TrackedPath>, RegistryError> {
    let bytes = read_raw(path)?;
    Ok(raw_lines(&bytes)
        .map(|line| TrackedPath(String::from_utf8_lossy(entry_bytes(line)).into_owned()))
        .collect())
}

fn read_raw(path: &Path) -> Result<Vec<u8>, RegistryError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Registry lines without their `\n`. A final line without a terminator is
/// still a line.
fn raw_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let mut lines = body.split(|b| *b == b'\n');
    if bytes.is_empty() {
        // `split` on an empty slice still yields one empty item.
        lines.next();
    }
    lines
}

/// The entry a raw line holds, ignoring a `\r` left by Windows line endings.
fn entry_bytes(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

// ---------------------------------------------------------------------------
// 4. Rewrite (atomic)
// ---------------------------------------------------------------------------

/// Counts from one [`rewrite_without`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub kept: usize,
    pub removed: usize,
}

/// Drop every line equal to a member of `resolved`, keeping the rest in order.
///
/// The current on-disk contents are re-read, so entries appended since the
/// caller last looked are preserved. Lines are matched and written back as raw
/// bytes; a kept line is reproduced exactly. Write flow: remainder →
/// `<name>.tmp` sibling → `chmod 0600` → `rename`. When nothing matches, the
/// file is left untouched.
pub fn rewrite_without(
    path: &Path,
    resolved: &HashSet<TrackedPath>,
) -> Result<RewriteStats, RegistryError> {
    let bytes = read_raw(path)?;
    let mut stats = RewriteStats::default();
    let mut contents = Vec::with_capacity(bytes.len());
    for line in raw_lines(&bytes) {
        let is_resolved = std::str::from_utf8(entry_bytes(line))
            .map(|entry| resolved.contains(entry))
            .unwrap_or(false);
        if is_resolved {
            stats.removed += 1;
        } else {
            stats.kept += 1;
            contents.extend_from_slice(line);
            contents.push(b'\n');
        }
    }
    if stats.removed == 0 {
        return Ok(stats);
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(stats)
}

/// `<registry>.tmp` in the same directory (same filesystem for `rename`).
pub fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| REGISTRY_FILE.to_string());
    path.with_file_name(format!("{name}.tmp"))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
