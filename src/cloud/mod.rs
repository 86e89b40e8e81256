//! Cloud persistence collaborator: an opaque user-record document store
//! with partial-merge updates, array union/remove on the tracked list,
//! and the best-effort social layer (friend requests, direct chat).

/// In-memory compare-and-set reference implementation.
pub mod memory;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{UnixSeconds, Username};

/// Cloud store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CloudError {
    /// The named document does not exist.
    #[error("no such document: {0}")]
    Missing(String),
    /// A conditional update lost its race and retries were exhausted.
    #[error("update conflict on {0}")]
    Conflict(String),
    /// The store could not be reached or rejected the request.
    #[error("cloud store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for cloud operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Per-account document in the cloud store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserRecord {
    /// Display name inside the app.
    pub username: String,
    /// Account email.
    pub email: String,
    /// The account's own judge username.
    pub own_identity: String,
    /// Judge usernames this account tracks.
    pub tracked_users: Vec<Username>,
    /// Account ids of confirmed friends.
    pub friends: Vec<String>,
}

/// Sparse update where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    /// Optional replacement display name.
    pub username: Option<String>,
    /// Optional replacement email.
    pub email: Option<String>,
    /// Optional replacement own judge username.
    pub own_identity: Option<String>,
    /// Optional replacement tracked list.
    pub tracked_users: Option<Vec<Username>>,
    /// Optional replacement friends list.
    pub friends: Option<Vec<String>>,
}

impl UserPatch {
    /// Applies this patch in place to `record`.
    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(v) = &self.username {
            record.username = v.clone();
        }
        if let Some(v) = &self.email {
            record.email = v.clone();
        }
        if let Some(v) = &self.own_identity {
            record.own_identity = v.clone();
        }
        if let Some(v) = &self.tracked_users {
            record.tracked_users = v.clone();
        }
        if let Some(v) = &self.friends {
            record.friends = v.clone();
        }
    }
}

/// Lifecycle of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Sent, not yet answered.
    Pending,
    /// Accepted; both sides are linked.
    Accepted,
    /// Declined by the recipient.
    Declined,
}

/// One friend request document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Request document id.
    pub id: String,
    /// Sender account id.
    pub from_user: String,
    /// Recipient account id.
    pub to_user: String,
    /// Current status.
    pub status: RequestStatus,
    /// Creation time.
    pub created_at: UnixSeconds,
}

/// One direct-chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message document id.
    pub id: String,
    /// Sender account id.
    pub from_user: String,
    /// Recipient account id.
    pub to_user: String,
    /// Message body.
    pub body: String,
    /// Send time.
    pub timestamp: UnixSeconds,
    /// Whether the recipient has read the message.
    pub read: bool,
}

/// Stable chat id for an account pair: the lexicographically smaller id
/// first, joined with `_`.
pub fn chat_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// The document store interface the core requires. All social operations
/// are best-effort; only the user-record and tracked-list operations
/// participate in the sign-in merge.
pub trait DocStore: Send + Sync + 'static {
    /// Reads the user record for `uid`, `None` when absent.
    fn get_user(&self, uid: &str) -> impl Future<Output = CloudResult<Option<UserRecord>>> + Send;

    /// Returns the record for `uid`, creating it from `initial` when
    /// absent. Never overwrites an existing record.
    fn ensure_user(
        &self,
        uid: &str,
        initial: UserRecord,
    ) -> impl Future<Output = CloudResult<UserRecord>> + Send;

    /// Partial-merge update of an existing record.
    fn update_user(
        &self,
        uid: &str,
        patch: UserPatch,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// Adds `username` to the tracked list if absent (array union).
    fn tracked_add(
        &self,
        uid: &str,
        username: &str,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// Removes `username` from the tracked list if present (array remove).
    fn tracked_remove(
        &self,
        uid: &str,
        username: &str,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// Creates a pending friend request and returns its id.
    fn send_friend_request(
        &self,
        from_uid: &str,
        to_uid: &str,
    ) -> impl Future<Output = CloudResult<String>> + Send;

    /// Pending requests addressed to `uid`.
    fn pending_requests(
        &self,
        uid: &str,
    ) -> impl Future<Output = CloudResult<Vec<FriendRequest>>> + Send;

    /// Accepts a request and links both accounts' friend lists.
    fn accept_friend_request(
        &self,
        request_id: &str,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// Declines a request.
    fn decline_friend_request(
        &self,
        request_id: &str,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// Appends a chat message and returns its id.
    fn send_message(
        &self,
        from_uid: &str,
        to_uid: &str,
        body: &str,
    ) -> impl Future<Output = CloudResult<String>> + Send;

    /// Up to `limit` messages for the pair, oldest first.
    fn messages(
        &self,
        uid_a: &str,
        uid_b: &str,
        limit: usize,
    ) -> impl Future<Output = CloudResult<Vec<ChatMessage>>> + Send;

    /// Marks messages addressed to `reader_uid` in the pair's chat as read.
    fn mark_read(
        &self,
        uid_a: &str,
        uid_b: &str,
        reader_uid: &str,
    ) -> impl Future<Output = CloudResult<()>> + Send;
}
