//! Stats aggregation: one [`UserStats`] snapshot per username.
//!
//! The aggregation is all-or-nothing at its first step: cumulative counts
//! and the recent-submission list must both resolve, or no snapshot is
//! produced. Per-problem difficulty lookups after that point are absorbed
//! individually.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use hashbrown::HashMap;
use tokio::task::JoinSet;
use tracing::debug;

use crate::remote::{JudgeClient, RemoteResult};
use crate::stats::{RecentProblem, Submission, UserStats};
use crate::types::{Difficulty, FilterMode, UnixSeconds};

/// Seconds in the rolling recency window.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Explicit immutable recency window `[start, end]` in unix seconds.
///
/// Computed by the caller and passed in; aggregation never reads ambient
/// filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    /// Inclusive lower bound.
    pub start: UnixSeconds,
    /// Inclusive upper bound, normally "now".
    pub end: UnixSeconds,
}

impl RecencyWindow {
    /// Window for `mode` ending at `now`.
    ///
    /// `Today` starts at local midnight, clamped to `now - 24h` so it is
    /// always a subset of the rolling 24h fetch.
    pub fn for_mode(mode: FilterMode, now: UnixSeconds) -> Self {
        let day_ago = now.saturating_sub(SECONDS_PER_DAY);
        let start = match mode {
            FilterMode::Last24Hours => day_ago,
            FilterMode::Today => local_midnight(now).map_or(day_ago, |m| m.max(day_ago)),
        };
        Self { start, end: now }
    }

    /// Explicit window, mainly for tests and replays.
    pub fn since(start: UnixSeconds, end: UnixSeconds) -> Self {
        Self { start, end }
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: UnixSeconds) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Filters `submissions` to the window and keeps, per title, only the
/// entry with the maximum timestamp. Output is sorted newest first with
/// ties broken by title ascending for determinism.
pub fn dedup_latest(submissions: &[Submission], window: RecencyWindow) -> Vec<Submission> {
    let mut by_title: HashMap<&str, &Submission> = HashMap::new();
    for sub in submissions.iter().filter(|s| window.contains(s.timestamp)) {
        match by_title.get(sub.title.as_str()) {
            Some(kept) if kept.timestamp >= sub.timestamp => {}
            _ => {
                by_title.insert(&sub.title, sub);
            }
        }
    }

    let mut out: Vec<Submission> = by_title.into_values().cloned().collect();
    out.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.title.cmp(&b.title))
    });
    out
}

/// Fetches and assembles one [`UserStats`] snapshot for `username`.
///
/// Counts and the recent list are queried concurrently; either failure
/// aborts the whole aggregation. Difficulty lookups for the surviving
/// unique problems run concurrently and fall back to
/// [`Difficulty::Unknown`] per problem.
pub async fn fetch_user_stats<C: JudgeClient>(
    client: Arc<C>,
    username: &str,
    window: RecencyWindow,
    fetch_limit: u32,
    display_limit: usize,
) -> RemoteResult<UserStats> {
    let (counts, submissions) = tokio::join!(
        client.accepted_counts(username),
        client.recent_accepted(username, fetch_limit),
    );
    let counts = counts?;
    let submissions = submissions?;

    let unique = dedup_latest(&submissions, window);

    let mut lookups = JoinSet::new();
    for (idx, sub) in unique.iter().enumerate() {
        let client = Arc::clone(&client);
        let slug = sub.title_slug.clone();
        lookups.spawn(async move { (idx, client.problem_difficulty(&slug).await) });
    }

    let mut difficulties = vec![Difficulty::Unknown; unique.len()];
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((idx, difficulty)) => difficulties[idx] = difficulty,
            Err(err) => debug!(%username, %err, "difficulty lookup task failed"),
        }
    }

    let recent_problems: Vec<RecentProblem> = unique
        .into_iter()
        .zip(difficulties)
        .map(|(sub, difficulty)| RecentProblem {
            title: sub.title,
            timestamp: sub.timestamp,
            title_slug: sub.title_slug,
            difficulty,
        })
        .collect();

    let display = recent_problems
        .iter()
        .take(display_limit)
        .cloned()
        .collect();

    Ok(UserStats {
        easy_solved: counts.easy,
        medium_solved: counts.medium,
        hard_solved: counts.hard,
        total_solved: counts.total(),
        recent_solved: recent_problems.len() as u32,
        recent_problems_for_display: display,
        recent_problems,
    })
}

/// Whether `username`'s recent accepted submissions include `title_slug`.
///
/// Best-effort: a failed fetch reads as "not solved".
pub async fn check_solved<C: JudgeClient>(
    client: &C,
    username: &str,
    title_slug: &str,
    fetch_limit: u32,
) -> bool {
    match client.recent_accepted(username, fetch_limit).await {
        Ok(submissions) => submissions.iter().any(|s| s.title_slug == title_slug),
        Err(err) => {
            debug!(%username, %title_slug, %err, "solved check failed, assuming unsolved");
            false
        }
    }
}

/// Merges every user's recent problems into one newest-first feed of at
/// most `limit` entries, tagged with the solving username.
pub fn latest_across<'a, I>(users: I, limit: usize) -> Vec<(String, RecentProblem)>
where
    I: IntoIterator<Item = (&'a str, &'a UserStats)>,
{
    let mut feed: Vec<(String, RecentProblem)> = users
        .into_iter()
        .flat_map(|(name, stats)| {
            stats
                .recent_problems
                .iter()
                .map(move |p| (name.to_string(), p.clone()))
        })
        .collect();

    feed.sort_by(|a, b| {
        b.1.timestamp
            .cmp(&a.1.timestamp)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.title.cmp(&b.1.title))
    });
    feed.truncate(limit);
    feed
}

fn local_midnight(now: UnixSeconds) -> Option<UnixSeconds> {
    let now = i64::try_from(now).ok()?;
    let local = Local.timestamp_opt(now, 0).single()?;
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .single()?;
    u64::try_from(midnight.timestamp()).ok()
}
