//! In-memory [`DocStore`] with versioned documents and client-side
//! compare-and-set on the tracked list.

use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::UnixSeconds;

use super::{
    ChatMessage, CloudError, CloudResult, DocStore, FriendRequest, RequestStatus, UserPatch,
    UserRecord, chat_id,
};

const MAX_CAS_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    record: UserRecord,
}

#[derive(Debug, Default)]
struct State {
    docs: HashMap<String, VersionedDoc>,
    requests: HashMap<String, FriendRequest>,
    chats: HashMap<String, Vec<ChatMessage>>,
    next_id: u64,
}

/// Reference [`DocStore`] backed by process memory.
///
/// Tracked-list mutations are read-modify-write with a per-document
/// version check and bounded retry, the shape a remote store without a
/// server-side array-union primitive requires.
#[derive(Debug, Default)]
pub struct MemoryDocStore {
    state: Mutex<State>,
}

impl MemoryDocStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate_tracked(
        &self,
        uid: &str,
        apply: impl Fn(&mut Vec<String>) -> bool,
    ) -> CloudResult<()> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            // Read and release before computing, so the commit below is a
            // genuine version compare.
            let (version, mut tracked) = {
                let state = self.state.lock().await;
                let doc = state
                    .docs
                    .get(uid)
                    .ok_or_else(|| CloudError::Missing(uid.to_string()))?;
                (doc.version, doc.record.tracked_users.clone())
            };

            if !apply(&mut tracked) {
                return Ok(());
            }

            let mut state = self.state.lock().await;
            let doc = state
                .docs
                .get_mut(uid)
                .ok_or_else(|| CloudError::Missing(uid.to_string()))?;
            if doc.version == version {
                doc.record.tracked_users = tracked;
                doc.version += 1;
                return Ok(());
            }
            debug!(uid, attempt, "tracked-list CAS lost, retrying");
        }
        Err(CloudError::Conflict(uid.to_string()))
    }

    async fn take_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }
}

impl DocStore for MemoryDocStore {
    async fn get_user(&self, uid: &str) -> CloudResult<Option<UserRecord>> {
        let state = self.state.lock().await;
        Ok(state.docs.get(uid).map(|doc| doc.record.clone()))
    }

    async fn ensure_user(&self, uid: &str, initial: UserRecord) -> CloudResult<UserRecord> {
        let mut state = self.state.lock().await;
        let doc = state
            .docs
            .entry(uid.to_string())
            .or_insert_with(|| VersionedDoc {
                version: 1,
                record: initial,
            });
        Ok(doc.record.clone())
    }

    async fn update_user(&self, uid: &str, patch: UserPatch) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        let doc = state
            .docs
            .get_mut(uid)
            .ok_or_else(|| CloudError::Missing(uid.to_string()))?;
        patch.apply_to(&mut doc.record);
        doc.version += 1;
        Ok(())
    }

    async fn tracked_add(&self, uid: &str, username: &str) -> CloudResult<()> {
        self.mutate_tracked(uid, |tracked| {
            if tracked.iter().any(|u| u == username) {
                false
            } else {
                tracked.push(username.to_string());
                true
            }
        })
        .await
    }

    async fn tracked_remove(&self, uid: &str, username: &str) -> CloudResult<()> {
        self.mutate_tracked(uid, |tracked| {
            let before = tracked.len();
            tracked.retain(|u| u != username);
            tracked.len() != before
        })
        .await
    }

    async fn send_friend_request(&self, from_uid: &str, to_uid: &str) -> CloudResult<String> {
        let id = self.take_id("req").await;
        let mut state = self.state.lock().await;
        state.requests.insert(
            id.clone(),
            FriendRequest {
                id: id.clone(),
                from_user: from_uid.to_string(),
                to_user: to_uid.to_string(),
                status: RequestStatus::Pending,
                created_at: now_unix(),
            },
        );
        Ok(id)
    }

    async fn pending_requests(&self, uid: &str) -> CloudResult<Vec<FriendRequest>> {
        let state = self.state.lock().await;
        let mut pending: Vec<FriendRequest> = state
            .requests
            .values()
            .filter(|r| r.to_user == uid && r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn accept_friend_request(&self, request_id: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .get_mut(request_id)
            .ok_or_else(|| CloudError::Missing(request_id.to_string()))?;
        if request.status != RequestStatus::Pending {
            return Ok(());
        }
        request.status = RequestStatus::Accepted;
        let (from, to) = (request.from_user.clone(), request.to_user.clone());

        for (uid, friend) in [(&from, &to), (&to, &from)] {
            if let Some(doc) = state.docs.get_mut(uid.as_str())
                && !doc.record.friends.iter().any(|f| f == friend)
            {
                doc.record.friends.push(friend.clone());
                doc.version += 1;
            }
        }
        Ok(())
    }

    async fn decline_friend_request(&self, request_id: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .get_mut(request_id)
            .ok_or_else(|| CloudError::Missing(request_id.to_string()))?;
        if request.status == RequestStatus::Pending {
            request.status = RequestStatus::Declined;
        }
        Ok(())
    }

    async fn send_message(&self, from_uid: &str, to_uid: &str, body: &str) -> CloudResult<String> {
        let id = self.take_id("msg").await;
        let mut state = self.state.lock().await;
        let message = ChatMessage {
            id: id.clone(),
            from_user: from_uid.to_string(),
            to_user: to_uid.to_string(),
            body: body.to_string(),
            timestamp: now_unix(),
            read: false,
        };
        state
            .chats
            .entry(chat_id(from_uid, to_uid))
            .or_default()
            .push(message);
        Ok(id)
    }

    async fn messages(&self, uid_a: &str, uid_b: &str, limit: usize) -> CloudResult<Vec<ChatMessage>> {
        let state = self.state.lock().await;
        let messages = state
            .chats
            .get(&chat_id(uid_a, uid_b))
            .map(|m| m.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(messages)
    }

    async fn mark_read(&self, uid_a: &str, uid_b: &str, reader_uid: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        if let Some(messages) = state.chats.get_mut(&chat_id(uid_a, uid_b)) {
            for message in messages.iter_mut().filter(|m| m.to_user == reader_uid) {
                message.read = true;
            }
        }
        Ok(())
    }
}

fn now_unix() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
