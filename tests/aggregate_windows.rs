use std::sync::{Arc, Mutex};

use leetwatch::{
    aggregate::{RecencyWindow, SECONDS_PER_DAY, check_solved, dedup_latest, fetch_user_stats, latest_across},
    remote::{JudgeClient, RemoteError, RemoteResult},
    stats::{AcceptedCounts, DailyChallenge, RecentProblem, Submission, UserStats},
    types::{Difficulty, FilterMode},
};

fn sub(title: &str, ts: u64) -> Submission {
    Submission {
        title: title.to_string(),
        timestamp: ts,
        title_slug: title.to_lowercase().replace(' ', "-"),
    }
}

struct FixtureJudge {
    counts: RemoteResult<AcceptedCounts>,
    recent: RemoteResult<Vec<Submission>>,
    difficulties: Mutex<Vec<(String, Difficulty)>>,
}

impl FixtureJudge {
    fn new(counts: RemoteResult<AcceptedCounts>, recent: RemoteResult<Vec<Submission>>) -> Self {
        Self {
            counts,
            recent,
            difficulties: Mutex::new(Vec::new()),
        }
    }

    fn with_difficulty(self, slug: &str, difficulty: Difficulty) -> Self {
        self.difficulties
            .lock()
            .expect("lock")
            .push((slug.to_string(), difficulty));
        self
    }
}

impl JudgeClient for FixtureJudge {
    async fn accepted_counts(&self, _username: &str) -> RemoteResult<AcceptedCounts> {
        self.counts.clone()
    }

    async fn recent_accepted(&self, _username: &str, _limit: u32) -> RemoteResult<Vec<Submission>> {
        self.recent.clone()
    }

    async fn problem_difficulty(&self, title_slug: &str) -> Difficulty {
        self.difficulties
            .lock()
            .expect("lock")
            .iter()
            .find(|(slug, _)| slug == title_slug)
            .map(|(_, d)| *d)
            .unwrap_or(Difficulty::Unknown)
    }

    async fn user_exists(&self, _username: &str) -> bool {
        true
    }

    async fn daily_challenge(&self) -> RemoteResult<DailyChallenge> {
        Err(RemoteError::NotFound)
    }
}

const NOW: u64 = 1_700_000_000;

#[tokio::test]
async fn duplicate_titles_keep_latest_timestamp() {
    let client = Arc::new(FixtureJudge::new(
        Ok(AcceptedCounts {
            easy: 2,
            medium: 1,
            hard: 0,
        }),
        Ok(vec![sub("Two Sum", NOW - 100), sub("Two Sum", NOW - 110)]),
    ));

    let window = RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW);
    let stats = fetch_user_stats(client, "alice", window, 100, 3)
        .await
        .expect("stats");

    assert_eq!(stats.recent_solved, 1);
    assert_eq!(stats.recent_problems.len(), 1);
    assert_eq!(stats.recent_problems[0].title, "Two Sum");
    assert_eq!(stats.recent_problems[0].timestamp, NOW - 100);
}

#[tokio::test]
async fn totals_add_up_and_display_is_a_prefix() {
    let client = Arc::new(FixtureJudge::new(
        Ok(AcceptedCounts {
            easy: 5,
            medium: 3,
            hard: 2,
        }),
        Ok(vec![
            sub("A", NOW - 10),
            sub("B", NOW - 20),
            sub("C", NOW - 30),
            sub("D", NOW - 40),
            sub("E", NOW - 50),
        ]),
    ));

    let window = RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW);
    let stats = fetch_user_stats(client, "alice", window, 100, 3)
        .await
        .expect("stats");

    assert_eq!(stats.total_solved, 10);
    assert_eq!(
        stats.total_solved,
        stats.easy_solved + stats.medium_solved + stats.hard_solved
    );
    assert_eq!(stats.recent_solved, 5);
    assert_eq!(stats.recent_problems_for_display.len(), 3);
    assert_eq!(
        stats.recent_problems_for_display[..],
        stats.recent_problems[..3]
    );
    // Newest first.
    let timestamps: Vec<u64> = stats.recent_problems.iter().map(|p| p.timestamp).collect();
    assert_eq!(timestamps, vec![NOW - 10, NOW - 20, NOW - 30, NOW - 40, NOW - 50]);
}

#[test]
fn totals_saturate_instead_of_overflowing() {
    let counts = AcceptedCounts {
        easy: u32::MAX,
        medium: 7,
        hard: 9,
    };
    assert_eq!(counts.total(), u32::MAX);
}

#[tokio::test]
async fn counts_failure_aborts_the_whole_aggregation() {
    let client = Arc::new(FixtureJudge::new(
        Err(RemoteError::Network("connection refused".to_string())),
        Ok(vec![sub("A", NOW - 10)]),
    ));

    let window = RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW);
    let result = fetch_user_stats(client, "alice", window, 100, 3).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn recent_failure_aborts_the_whole_aggregation() {
    let client = Arc::new(FixtureJudge::new(
        Ok(AcceptedCounts::default()),
        Err(RemoteError::Malformed("missing data".to_string())),
    ));

    let window = RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW);
    let result = fetch_user_stats(client, "alice", window, 100, 3).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_difficulty_degrades_to_unknown_without_aborting() {
    let client = Arc::new(
        FixtureJudge::new(
            Ok(AcceptedCounts::default()),
            Ok(vec![sub("Known One", NOW - 10), sub("Mystery", NOW - 20)]),
        )
        .with_difficulty("known-one", Difficulty::Medium),
    );

    let window = RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW);
    let stats = fetch_user_stats(client, "alice", window, 100, 3)
        .await
        .expect("stats");

    assert_eq!(stats.recent_problems[0].difficulty, Difficulty::Medium);
    assert_eq!(stats.recent_problems[1].difficulty, Difficulty::Unknown);
}

#[tokio::test]
async fn narrower_window_never_increases_recent_count() {
    let submissions = vec![
        sub("A", NOW - 100),
        sub("B", NOW - 40_000),
        sub("C", NOW - 80_000),
    ];

    let full_day = dedup_latest(&submissions, RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW));
    // "today" starting mid-window keeps a subset.
    let since_morning = dedup_latest(&submissions, RecencyWindow::since(NOW - 50_000, NOW));

    assert_eq!(full_day.len(), 3);
    assert_eq!(since_morning.len(), 2);
    assert!(since_morning.len() <= full_day.len());

    // Identical coverage keeps the count unchanged.
    let same = dedup_latest(&submissions, RecencyWindow::since(NOW - SECONDS_PER_DAY, NOW));
    assert_eq!(same.len(), full_day.len());
}

#[test]
fn today_window_is_clamped_inside_the_24h_fetch() {
    let window = RecencyWindow::for_mode(FilterMode::Today, NOW);
    assert!(window.start >= NOW - SECONDS_PER_DAY);
    assert!(window.start <= window.end);
    assert_eq!(window.end, NOW);
}

#[tokio::test]
async fn check_solved_matches_slug_and_absorbs_failure() {
    let client = FixtureJudge::new(
        Ok(AcceptedCounts::default()),
        Ok(vec![sub("Two Sum", NOW - 10)]),
    );
    assert!(check_solved(&client, "alice", "two-sum", 100).await);
    assert!(!check_solved(&client, "alice", "three-sum", 100).await);

    let failing = FixtureJudge::new(
        Ok(AcceptedCounts::default()),
        Err(RemoteError::Network("down".to_string())),
    );
    assert!(!check_solved(&failing, "alice", "two-sum", 100).await);
}

#[test]
fn latest_across_merges_users_newest_first() {
    let problem = |title: &str, ts: u64| RecentProblem {
        title: title.to_string(),
        timestamp: ts,
        title_slug: title.to_lowercase(),
        difficulty: Difficulty::Easy,
    };
    let stats = |problems: Vec<RecentProblem>| UserStats {
        easy_solved: 0,
        medium_solved: 0,
        hard_solved: 0,
        total_solved: 0,
        recent_solved: problems.len() as u32,
        recent_problems_for_display: problems.iter().take(3).cloned().collect(),
        recent_problems: problems,
    };

    let alice = stats(vec![problem("A", 300), problem("B", 100)]);
    let bob = stats(vec![problem("C", 200)]);

    let feed = latest_across([("alice", &alice), ("bob", &bob)], 2);
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0], ("alice".to_string(), problem("A", 300)));
    assert_eq!(feed[1], ("bob".to_string(), problem("C", 200)));
}
