//! Domain types for the retention registry.
//!
//! A [`TrackedPath`] is kept as the exact string the producer handed in, since
//! the registry compares and removes entries by line equality.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// TrackedPath
// ---------------------------------------------------------------------------

/// A file path recorded as created by the agent, subject to retention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackedPath(pub String);

impl TrackedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// A registry line holds exactly one path, so terminators are not allowed.
    pub fn is_line_safe(&self) -> bool {
        !self.0.contains(['\n', '\r'])
    }
}

impl fmt::Display for TrackedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// Lets a `HashSet<TrackedPath>` be queried with a `&str` registry line.
impl Borrow<str> for TrackedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackedPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackedPath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&Path> for TrackedPath {
    fn from(p: &Path) -> Self {
        Self(p.to_string_lossy().into_owned())
    }
}

// ---------------------------------------------------------------------------
// RetentionThreshold
// ---------------------------------------------------------------------------

/// Maximum file age before a tracked file becomes eligible for deletion.
///
/// `Disabled` suspends sweeping entirely. It is the default so that a fresh
/// install never deletes anything until an operator opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionThreshold {
    Hours(u32),
    #[default]
    Disabled,
}

impl RetentionThreshold {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// The threshold as elapsed time, or `None` when sweeping is disabled.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Hours(h) => Some(Duration::from_secs(u64::from(*h) * 60 * 60)),
            Self::Disabled => None,
        }
    }

    /// Legacy integer encoding: any negative value is the disable sentinel.
    pub fn from_hours(hours: i64) -> Result<Self, String> {
        if hours < 0 {
            return Ok(Self::Disabled);
        }
        u32::try_from(hours)
            .map(Self::Hours)
            .map_err(|_| format!("retention of {hours} hours is out of range"))
    }
}

impl fmt::Display for RetentionThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours(h) => write!(f, "{h}h"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for RetentionThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "off" | "never" => Ok(Self::Disabled),
            other => {
                let digits = other.strip_suffix('h').unwrap_or(other);
                let hours: i64 = digits.parse().map_err(|_| {
                    format!("invalid retention '{s}'; expected hours (e.g. 24) or 'disabled'")
                })?;
                Self::from_hours(hours)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThresholdCompat {
    Hours(i64),
    Keyword(String),
}

impl<'de> Deserialize<'de> for RetentionThreshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ThresholdCompat::deserialize(deserializer)? {
            ThresholdCompat::Hours(h) => Self::from_hours(h).map_err(D::Error::custom),
            ThresholdCompat::Keyword(s) => s.parse().map_err(D::Error::custom),
        }
    }
}

impl Serialize for RetentionThreshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Hours(h) => serializer.serialize_u32(*h),
            Self::Disabled => serializer.serialize_str("disabled"),
        }
    }
}

// ---------------------------------------------------------------------------
// AgeBasis
// ---------------------------------------------------------------------------

/// Which filesystem timestamp defines a tracked file's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBasis {
    /// Birth time; falls back to the modification time where the filesystem
    /// does not report one.
    #[default]
    Created,
    Modified,
}

impl fmt::Display for AgeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Modified => f.write_str("modified"),
        }
    }
}
