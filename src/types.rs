//! Shared primitive aliases and enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tracked account name on the judge platform (case-sensitive).
pub type Username = String;
/// Seconds since the Unix epoch.
pub type UnixSeconds = u64;
/// Monotonic refresh-cycle generation number.
pub type Generation = u64;

/// Problem difficulty bucket as reported by the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// Easy problem.
    Easy,
    /// Medium problem.
    Medium,
    /// Hard problem.
    Hard,
    /// Lookup failed or the judge reported something unrecognized.
    #[default]
    Unknown,
}

impl Difficulty {
    /// Parses the judge's difficulty string, falling back to [`Difficulty::Unknown`].
    pub fn from_remote(s: &str) -> Self {
        match s {
            "Easy" => Self::Easy,
            "Medium" => Self::Medium,
            "Hard" => Self::Hard,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Process-wide selection of the recency window used for "recent solves".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FilterMode {
    /// Rolling window of the last 24 hours.
    #[default]
    Last24Hours,
    /// Since local midnight today.
    Today,
}

impl FilterMode {
    /// Stable string form used in the key-value store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last24Hours => "24hours",
            Self::Today => "today",
        }
    }
}

/// Error for an unrecognized [`FilterMode`] string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterModeError(pub String);

impl fmt::Display for ParseFilterModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized filter mode: {}", self.0)
    }
}

impl std::error::Error for ParseFilterModeError {}

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24hours" => Ok(Self::Last24Hours),
            "today" => Ok(Self::Today),
            other => Err(ParseFilterModeError(other.to_string())),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-username refresh status tracked by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RefreshState {
    /// No refresh in flight; last one (if any) succeeded.
    #[default]
    Idle,
    /// A refresh for this username is in flight.
    Loading,
    /// The last refresh failed; prior stats, if any, are retained.
    Error,
}
