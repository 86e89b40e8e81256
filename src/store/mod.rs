//! Local persistence: an observable key-value store for the tracked set,
//! the own-identity username, and the filter mode.
//!
//! The store is owned here and injected into the runtime; nothing reads
//! it as ambient global state. Every successful write broadcasts a
//! [`StoreChange`] so all in-process consumers stay in sync.

/// In-memory backend.
pub mod memory;
/// SQLite-backed backend.
pub mod sqlite;

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::types::{FilterMode, Username};

/// Key holding the tracked-username list as a JSON array.
pub const TRACKED_USERS_KEY: &str = "tracked-users";
/// Key holding the own-identity username as a plain string.
pub const OWN_IDENTITY_KEY: &str = "own-identity";
/// Key holding the filter mode as its stable string form.
pub const FILTER_MODE_KEY: &str = "filter-mode";

/// Local persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value did not decode.
    #[error("stored value decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// String key-value backend behind [`TrackedStore`].
pub trait KvBackend: Send + 'static {
    /// Reads `key`, `None` when absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Writes `value` under `key`, replacing any prior value.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// Which logical value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// The tracked-username list was replaced.
    TrackedUsers,
    /// The own-identity username was replaced.
    OwnIdentity,
    /// The filter mode was replaced.
    FilterMode,
}

struct Shared {
    backend: Mutex<Box<dyn KvBackend>>,
    changes: broadcast::Sender<StoreChange>,
}

/// Observable store over a [`KvBackend`]. Cheap to clone; clones share
/// the backend and the change broadcast.
#[derive(Clone)]
pub struct TrackedStore {
    shared: Arc<Shared>,
}

impl TrackedStore {
    /// Wraps `backend` in an observable store.
    pub fn new(backend: impl KvBackend) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                backend: Mutex::new(Box::new(backend)),
                changes,
            }),
        }
    }

    /// Subscribes to change notifications. Writes that happen before the
    /// subscription are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.shared.changes.subscribe()
    }

    /// Reads the tracked-username list; absent reads as empty.
    pub fn tracked_users(&self) -> StoreResult<Vec<Username>> {
        match self.backend().get(TRACKED_USERS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the tracked-username list and notifies subscribers.
    ///
    /// The write completes (or fails) before any notification, so a
    /// notified reader always observes the new list.
    pub fn set_tracked_users(&self, users: &[Username]) -> StoreResult<()> {
        let raw = serde_json::to_string(users)?;
        self.backend().set(TRACKED_USERS_KEY, &raw)?;
        let _ = self.shared.changes.send(StoreChange::TrackedUsers);
        Ok(())
    }

    /// Reads the own-identity username; absent or empty reads as `None`.
    pub fn own_identity(&self) -> StoreResult<Option<Username>> {
        Ok(self
            .backend()
            .get(OWN_IDENTITY_KEY)?
            .filter(|s| !s.is_empty()))
    }

    /// Replaces the own-identity username and notifies subscribers.
    pub fn set_own_identity(&self, username: &str) -> StoreResult<()> {
        self.backend().set(OWN_IDENTITY_KEY, username)?;
        let _ = self.shared.changes.send(StoreChange::OwnIdentity);
        Ok(())
    }

    /// Reads the filter mode; absent or unrecognized reads as the default.
    pub fn filter_mode(&self) -> StoreResult<FilterMode> {
        let mode = match self.backend().get(FILTER_MODE_KEY)? {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(%err, "stored filter mode unrecognized, using default");
                FilterMode::default()
            }),
            None => FilterMode::default(),
        };
        Ok(mode)
    }

    /// Replaces the filter mode and notifies subscribers.
    pub fn set_filter_mode(&self, mode: FilterMode) -> StoreResult<()> {
        self.backend().set(FILTER_MODE_KEY, mode.as_str())?;
        let _ = self.shared.changes.send(StoreChange::FilterMode);
        Ok(())
    }

    fn backend(&self) -> MutexGuard<'_, Box<dyn KvBackend>> {
        self.shared
            .backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
