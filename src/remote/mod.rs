//! Remote judge query client: trait seam and failure taxonomy.

/// GraphQL transport implementation over reqwest.
pub mod graphql;

use std::future::Future;

use thiserror::Error;

use crate::stats::{AcceptedCounts, DailyChallenge, Submission};
use crate::types::Difficulty;

/// Failure modes of the remote query client.
///
/// `Network` and `Malformed` are equivalent for retry purposes; both mean
/// the query produced nothing usable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level failure; the request never completed.
    #[error("network failure: {0}")]
    Network(String),
    /// The judge answered, but not in the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The queried entity does not exist.
    #[error("not found")]
    NotFound,
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

/// Result alias for remote queries.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Single chokepoint for outbound judge queries. No business logic lives
/// behind this trait; it resolves queries and normalizes failures.
pub trait JudgeClient: Send + Sync + 'static {
    /// Cumulative accepted counts by difficulty for `username`.
    fn accepted_counts(
        &self,
        username: &str,
    ) -> impl Future<Output = RemoteResult<AcceptedCounts>> + Send;

    /// Up to `limit` most recent accepted submissions for `username`,
    /// newest first.
    fn recent_accepted(
        &self,
        username: &str,
        limit: u32,
    ) -> impl Future<Output = RemoteResult<Vec<Submission>>> + Send;

    /// Difficulty of the problem named by `title_slug`.
    ///
    /// Best-effort: any failure degrades to [`Difficulty::Unknown`]
    /// rather than propagating.
    fn problem_difficulty(&self, title_slug: &str) -> impl Future<Output = Difficulty> + Send;

    /// Whether `username` names an existing account.
    ///
    /// Returns `false` on any transport failure, indistinguishable from
    /// "does not exist". Callers that need the distinction cannot get it
    /// from this surface; the behavior mirrors the add-user validation
    /// policy and is deliberate.
    fn user_exists(&self, username: &str) -> impl Future<Output = bool> + Send;

    /// The judge's active daily challenge.
    fn daily_challenge(&self) -> impl Future<Output = RemoteResult<DailyChallenge>> + Send;
}
