//! Domain records: per-user statistics snapshots and judge payloads.

use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, UnixSeconds, Username};

/// Cumulative accepted-problem counts by difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AcceptedCounts {
    /// Easy problems solved, all time.
    pub easy: u32,
    /// Medium problems solved, all time.
    pub medium: u32,
    /// Hard problems solved, all time.
    pub hard: u32,
}

impl AcceptedCounts {
    /// Sum across all difficulties, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.easy
            .saturating_add(self.medium)
            .saturating_add(self.hard)
    }
}

/// One accepted submission as returned by the judge's recent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Problem title.
    pub title: String,
    /// Acceptance time.
    pub timestamp: UnixSeconds,
    /// URL slug identifying the problem.
    pub title_slug: String,
}

/// One unique recently-solved problem after windowing and dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProblem {
    /// Problem title (unique within a [`UserStats`]).
    pub title: String,
    /// Latest acceptance time for this title within the window.
    pub timestamp: UnixSeconds,
    /// URL slug identifying the problem.
    pub title_slug: String,
    /// Resolved difficulty, [`Difficulty::Unknown`] when the lookup failed.
    pub difficulty: Difficulty,
}

/// Immutable per-username statistics snapshot.
///
/// Recomputed wholesale on every refresh; never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Easy problems solved, all time.
    pub easy_solved: u32,
    /// Medium problems solved, all time.
    pub medium_solved: u32,
    /// Hard problems solved, all time.
    pub hard_solved: u32,
    /// Sum of the three difficulty counts.
    pub total_solved: u32,
    /// Count of distinct problems accepted within the recency window.
    pub recent_solved: u32,
    /// Unique recent problems, newest first, one entry per title.
    pub recent_problems: Vec<RecentProblem>,
    /// Leading slice of `recent_problems` sized for card display.
    pub recent_problems_for_display: Vec<RecentProblem>,
}

/// The judge's daily challenge problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    /// Challenge date as reported by the judge (e.g. `2026-08-31`).
    pub date: String,
    /// Problem title.
    pub title: String,
    /// URL slug identifying the problem.
    pub title_slug: String,
    /// Problem difficulty.
    pub difficulty: Difficulty,
    /// Relative link to the problem page.
    pub link: String,
}

/// Daily challenge plus per-tracked-user solved flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStatus {
    /// The active daily challenge.
    pub challenge: DailyChallenge,
    /// `(username, solved)` pairs in tracked order; a failed per-user
    /// check degrades to `false`.
    pub solved: Vec<(Username, bool)>,
}
