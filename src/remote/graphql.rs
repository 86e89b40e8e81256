//! GraphQL transport for the judge's single query endpoint.
//!
//! Every query is an HTTP POST with body `{"query": ..., "variables": ...}`.
//! Response decoding is split into pure `parse_*` functions over
//! [`serde_json::Value`] so the shapes are testable without I/O.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::stats::{AcceptedCounts, DailyChallenge, Submission};
use crate::types::Difficulty;

use super::{JudgeClient, RemoteError, RemoteResult};

/// Public judge endpoint used by [`GraphqlJudgeClient::leetcode`].
pub const DEFAULT_ENDPOINT: &str = "https://leetcode.com/graphql";

const ACCEPTED_COUNTS_QUERY: &str = "\
query userStats($username: String!) {
  matchedUser(username: $username) {
    submitStats {
      acSubmissionNum {
        difficulty
        count
      }
    }
  }
}";

const RECENT_ACCEPTED_QUERY: &str = "\
query recentAcSubmissions($username: String!, $limit: Int!) {
  recentAcSubmissionList(username: $username, limit: $limit) {
    id
    title
    timestamp
    titleSlug
  }
}";

const PROBLEM_DIFFICULTY_QUERY: &str = "\
query questionDetails($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    difficulty
  }
}";

const USER_EXISTS_QUERY: &str = "\
query userExists($username: String!) {
  matchedUser(username: $username) {
    username
  }
}";

const DAILY_CHALLENGE_QUERY: &str = "\
query questionOfToday {
  activeDailyCodingChallengeQuestion {
    date
    link
    question {
      title
      titleSlug
      difficulty
    }
  }
}";

/// [`JudgeClient`] implementation over a single GraphQL POST endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlJudgeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GraphqlJudgeClient {
    /// Creates a client against `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates a client against the public judge endpoint.
    pub fn leetcode() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }

    /// Issues one query and returns the `data` object.
    async fn query(&self, query: &str, variables: Value) -> RemoteResult<Value> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Malformed(format!("http status {status}")));
        }

        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors") {
            return Err(RemoteError::Malformed(format!("graphql errors: {errors}")));
        }
        match body.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(RemoteError::Malformed("response missing data".to_string())),
        }
    }
}

impl JudgeClient for GraphqlJudgeClient {
    async fn accepted_counts(&self, username: &str) -> RemoteResult<AcceptedCounts> {
        let data = self
            .query(ACCEPTED_COUNTS_QUERY, json!({ "username": username }))
            .await?;
        parse_accepted_counts(&data)
    }

    async fn recent_accepted(&self, username: &str, limit: u32) -> RemoteResult<Vec<Submission>> {
        let data = self
            .query(
                RECENT_ACCEPTED_QUERY,
                json!({ "username": username, "limit": limit }),
            )
            .await?;
        parse_recent_accepted(&data)
    }

    async fn problem_difficulty(&self, title_slug: &str) -> Difficulty {
        let result = self
            .query(PROBLEM_DIFFICULTY_QUERY, json!({ "titleSlug": title_slug }))
            .await;
        match result {
            Ok(data) => parse_problem_difficulty(&data),
            Err(err) => {
                debug!(%title_slug, %err, "difficulty lookup failed, using Unknown");
                Difficulty::Unknown
            }
        }
    }

    async fn user_exists(&self, username: &str) -> bool {
        match self
            .query(USER_EXISTS_QUERY, json!({ "username": username }))
            .await
        {
            Ok(data) => parse_user_exists(&data),
            Err(err) => {
                // Conflated with "does not exist" at the trait surface.
                warn!(%username, %err, "existence check failed, treating as missing");
                false
            }
        }
    }

    async fn daily_challenge(&self) -> RemoteResult<DailyChallenge> {
        let data = self.query(DAILY_CHALLENGE_QUERY, json!({})).await?;
        parse_daily_challenge(&data)
    }
}

/// Decodes `matchedUser.submitStats.acSubmissionNum` into counts.
pub fn parse_accepted_counts(data: &Value) -> RemoteResult<AcceptedCounts> {
    let entries = data
        .pointer("/matchedUser/submitStats/acSubmissionNum")
        .and_then(Value::as_array)
        .ok_or_else(|| RemoteError::Malformed("missing acSubmissionNum".to_string()))?;

    let mut counts = AcceptedCounts::default();
    for entry in entries {
        let count = entry
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(u64::from(u32::MAX)) as u32;
        match entry.get("difficulty").and_then(Value::as_str) {
            Some("Easy") => counts.easy = count,
            Some("Medium") => counts.medium = count,
            Some("Hard") => counts.hard = count,
            // "All" and anything unrecognized carry no information here.
            _ => {}
        }
    }
    Ok(counts)
}

/// Decodes `recentAcSubmissionList` into submissions, newest first.
pub fn parse_recent_accepted(data: &Value) -> RemoteResult<Vec<Submission>> {
    let entries = data
        .pointer("/recentAcSubmissionList")
        .and_then(Value::as_array)
        .ok_or_else(|| RemoteError::Malformed("missing recentAcSubmissionList".to_string()))?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let title = entry
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::Malformed("submission missing title".to_string()))?;
        let title_slug = entry
            .get("titleSlug")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::Malformed("submission missing titleSlug".to_string()))?;
        let timestamp = entry
            .get("timestamp")
            .and_then(timestamp_value)
            .ok_or_else(|| RemoteError::Malformed("submission missing timestamp".to_string()))?;
        out.push(Submission {
            title: title.to_string(),
            timestamp,
            title_slug: title_slug.to_string(),
        });
    }
    Ok(out)
}

/// Decodes `question.difficulty`, defaulting to [`Difficulty::Unknown`].
pub fn parse_problem_difficulty(data: &Value) -> Difficulty {
    data.pointer("/question/difficulty")
        .and_then(Value::as_str)
        .map(Difficulty::from_remote)
        .unwrap_or_default()
}

/// True when `matchedUser` resolved to a non-null object.
pub fn parse_user_exists(data: &Value) -> bool {
    data.get("matchedUser").is_some_and(|v| !v.is_null())
}

/// Decodes `activeDailyCodingChallengeQuestion` into a challenge record.
pub fn parse_daily_challenge(data: &Value) -> RemoteResult<DailyChallenge> {
    let node = match data.get("activeDailyCodingChallengeQuestion") {
        Some(node) if !node.is_null() => node,
        _ => return Err(RemoteError::NotFound),
    };

    let question = node
        .get("question")
        .filter(|q| !q.is_null())
        .ok_or_else(|| RemoteError::Malformed("daily challenge missing question".to_string()))?;
    let title = question
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteError::Malformed("daily challenge missing title".to_string()))?;
    let title_slug = question
        .get("titleSlug")
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteError::Malformed("daily challenge missing titleSlug".to_string()))?;

    Ok(DailyChallenge {
        date: node
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        link: node
            .get("link")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        title: title.to_string(),
        title_slug: title_slug.to_string(),
        difficulty: question
            .get("difficulty")
            .and_then(Value::as_str)
            .map(Difficulty::from_remote)
            .unwrap_or_default(),
    })
}

// The judge serializes submission timestamps as strings in some responses
// and integers in others.
fn timestamp_value(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
