//! Runtime event stream payloads.

use crate::types::{FilterMode, Generation, UnixSeconds, Username};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A username passed validation and joined the tracked set.
    UserAdded {
        /// The added username.
        username: Username,
    },
    /// A username left the tracked set; its stats were discarded.
    UserRemoved {
        /// The removed username.
        username: Username,
    },
    /// A refresh cycle was dispatched for the whole tracked set.
    CycleStarted {
        /// Generation of the dispatched cycle.
        generation: Generation,
        /// Number of usernames in the cycle.
        users: usize,
    },
    /// One username's stats snapshot was committed.
    UserRefreshed {
        /// The refreshed username.
        username: Username,
    },
    /// One username's refresh failed; prior stats, if any, are retained.
    UserRefreshFailed {
        /// The failed username.
        username: Username,
        /// Failure rendered for display.
        error: String,
    },
    /// Every refresh in the cycle settled.
    CycleCompleted {
        /// Generation of the completed cycle.
        generation: Generation,
        /// Usernames whose snapshots committed.
        succeeded: usize,
        /// Usernames whose refresh failed.
        failed: usize,
        /// When the next periodic cycle is due.
        next_refresh_at: UnixSeconds,
    },
    /// The recency filter changed; a full reload follows.
    FilterModeChanged {
        /// The new mode.
        mode: FilterMode,
    },
    /// The tracked list was re-derived from the store after an external
    /// write (e.g. the sign-in merge).
    TrackedListReplaced {
        /// Size of the re-derived list.
        users: usize,
    },
}
