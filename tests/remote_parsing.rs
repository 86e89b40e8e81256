use serde_json::json;

use leetwatch::remote::RemoteError;
use leetwatch::remote::graphql::{
    parse_accepted_counts, parse_daily_challenge, parse_problem_difficulty, parse_recent_accepted,
    parse_user_exists,
};
use leetwatch::stats::AcceptedCounts;
use leetwatch::types::Difficulty;

#[test]
fn accepted_counts_pick_the_three_difficulties() {
    let data = json!({
        "matchedUser": {
            "submitStats": {
                "acSubmissionNum": [
                    { "difficulty": "All", "count": 120 },
                    { "difficulty": "Easy", "count": 60 },
                    { "difficulty": "Medium", "count": 45 },
                    { "difficulty": "Hard", "count": 15 }
                ]
            }
        }
    });

    let counts = parse_accepted_counts(&data).expect("counts");
    assert_eq!(
        counts,
        AcceptedCounts {
            easy: 60,
            medium: 45,
            hard: 15
        }
    );
    assert_eq!(counts.total(), 120);
}

#[test]
fn accepted_counts_reject_a_null_user() {
    let data = json!({ "matchedUser": null });
    let err = parse_accepted_counts(&data).expect_err("must fail");
    assert!(matches!(err, RemoteError::Malformed(_)));
}

#[test]
fn recent_accepted_decodes_both_timestamp_encodings() {
    let data = json!({
        "recentAcSubmissionList": [
            { "id": "1", "title": "Two Sum", "timestamp": "1700000100", "titleSlug": "two-sum" },
            { "id": "2", "title": "LRU Cache", "timestamp": 1700000200u64, "titleSlug": "lru-cache" }
        ]
    });

    let submissions = parse_recent_accepted(&data).expect("submissions");
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].title, "Two Sum");
    assert_eq!(submissions[0].timestamp, 1_700_000_100);
    assert_eq!(submissions[1].title_slug, "lru-cache");
    assert_eq!(submissions[1].timestamp, 1_700_000_200);
}

#[test]
fn recent_accepted_rejects_a_bad_timestamp() {
    let data = json!({
        "recentAcSubmissionList": [
            { "title": "Two Sum", "timestamp": "not-a-number", "titleSlug": "two-sum" }
        ]
    });
    assert!(parse_recent_accepted(&data).is_err());

    let data = json!({ "recentAcSubmissionList": null });
    assert!(parse_recent_accepted(&data).is_err());
}

#[test]
fn recent_accepted_allows_an_empty_list() {
    let data = json!({ "recentAcSubmissionList": [] });
    assert!(parse_recent_accepted(&data).expect("empty").is_empty());
}

#[test]
fn difficulty_parses_known_names_and_degrades() {
    let data = json!({ "question": { "difficulty": "Hard" } });
    assert_eq!(parse_problem_difficulty(&data), Difficulty::Hard);

    let data = json!({ "question": { "difficulty": "Impossible" } });
    assert_eq!(parse_problem_difficulty(&data), Difficulty::Unknown);

    let data = json!({ "question": null });
    assert_eq!(parse_problem_difficulty(&data), Difficulty::Unknown);
}

#[test]
fn user_exists_requires_a_non_null_match() {
    assert!(parse_user_exists(
        &json!({ "matchedUser": { "username": "alice" } })
    ));
    assert!(!parse_user_exists(&json!({ "matchedUser": null })));
    assert!(!parse_user_exists(&json!({})));
}

#[test]
fn daily_challenge_decodes_the_active_question() {
    let data = json!({
        "activeDailyCodingChallengeQuestion": {
            "date": "2026-08-31",
            "link": "/problems/two-sum/",
            "question": {
                "title": "Two Sum",
                "titleSlug": "two-sum",
                "difficulty": "Easy"
            }
        }
    });

    let challenge = parse_daily_challenge(&data).expect("challenge");
    assert_eq!(challenge.date, "2026-08-31");
    assert_eq!(challenge.title, "Two Sum");
    assert_eq!(challenge.title_slug, "two-sum");
    assert_eq!(challenge.difficulty, Difficulty::Easy);
    assert_eq!(challenge.link, "/problems/two-sum/");
}

#[test]
fn missing_daily_challenge_reads_as_not_found() {
    let err = parse_daily_challenge(&json!({ "activeDailyCodingChallengeQuestion": null }))
        .expect_err("must fail");
    assert_eq!(err, RemoteError::NotFound);

    let err = parse_daily_challenge(&json!({})).expect_err("must fail");
    assert_eq!(err, RemoteError::NotFound);
}
