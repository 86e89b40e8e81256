//! Tracked-set reconciliation between local and cloud persistence.
//!
//! Runs once at the guest-to-authenticated transition (and optionally on
//! init for an already-authenticated session). Local persistence failure
//! is fatal; cloud write failure is logged and the session degrades to
//! local-only.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cloud::{CloudError, DocStore, UserPatch, UserRecord};
use crate::runtime::events::WatchEvent;
use crate::store::{StoreError, TrackedStore};
use crate::types::Username;

/// Sign-in sync failures. Only local persistence aborts the sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store read or write failed; sync cannot proceed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Cloud read failed before any merge happened.
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Deduplicated union of the two tracked lists: local entries in their
/// original order, then cloud-only entries in cloud order. Idempotent
/// and order-stable on repeat calls.
pub fn merge_tracked(local: &[Username], cloud: &[Username]) -> Vec<Username> {
    let mut merged: Vec<Username> = Vec::with_capacity(local.len() + cloud.len());
    for name in local.iter().chain(cloud) {
        if !merged.iter().any(|m| m == name) {
            merged.push(name.clone());
        }
    }
    merged
}

/// Reconciles local and cloud state for `uid` at sign-in.
///
/// Merges the tracked lists, writes the merged list back to both sides,
/// and reconciles the own-identity username in whichever direction has
/// a value. The store's change broadcast makes the runtime re-derive its
/// input. Returns the merged list.
pub async fn sign_in_sync<D: DocStore>(
    store: &TrackedStore,
    cloud: &D,
    uid: &str,
) -> Result<Vec<Username>, SyncError> {
    let local = store.tracked_users()?;
    let record = cloud
        .ensure_user(uid, UserRecord::default())
        .await?;

    let merged = merge_tracked(&local, &record.tracked_users);
    info!(
        uid,
        local = local.len(),
        cloud = record.tracked_users.len(),
        merged = merged.len(),
        "sign-in tracked-set merge"
    );

    // Local write is authoritative for the session; its failure aborts.
    store.set_tracked_users(&merged)?;

    let local_identity = store.own_identity()?;
    let mut patch = UserPatch {
        tracked_users: Some(merged.clone()),
        ..UserPatch::default()
    };
    match (&local_identity, record.own_identity.is_empty()) {
        (Some(identity), true) => patch.own_identity = Some(identity.clone()),
        (None, false) => store.set_own_identity(&record.own_identity)?,
        _ => {}
    }

    if let Err(err) = cloud.update_user(uid, patch).await {
        // Degrade to guest-like behavior; local remains authoritative.
        warn!(uid, %err, "cloud write failed during sign-in merge");
    }

    Ok(merged)
}

/// Mirrors runtime add/remove operations into the cloud tracked list for
/// an authenticated session. Best-effort: failures are logged, never
/// surfaced. The task ends when the runtime's event stream closes.
pub fn spawn_cloud_mirror<D: DocStore>(
    mut events: tokio::sync::broadcast::Receiver<WatchEvent>,
    cloud: Arc<D>,
    uid: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(WatchEvent::UserAdded { username }) => {
                    if let Err(err) = cloud.tracked_add(&uid, &username).await {
                        warn!(uid, %username, %err, "cloud tracked-add failed");
                    }
                }
                Ok(WatchEvent::UserRemoved { username }) => {
                    if let Err(err) = cloud.tracked_remove(&uid, &username).await {
                        warn!(uid, %username, %err, "cloud tracked-remove failed");
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(uid, skipped, "cloud mirror lagged behind event stream");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
