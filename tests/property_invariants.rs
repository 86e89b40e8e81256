use std::collections::BTreeSet;

use proptest::prelude::*;

use leetwatch::{
    aggregate::{RecencyWindow, dedup_latest},
    stats::Submission,
    sync::merge_tracked,
    types::FilterMode,
};

const BASE: u64 = 1_700_000_000;

fn submission_strategy() -> impl Strategy<Value = Submission> {
    // A small title pool forces duplicate titles.
    (0u8..12, 0u64..200_000).prop_map(|(title_idx, offset)| Submission {
        title: format!("Problem {title_idx}"),
        timestamp: BASE + offset,
        title_slug: format!("problem-{title_idx}"),
    })
}

fn window_strategy() -> impl Strategy<Value = RecencyWindow> {
    (0u64..200_000, 0u64..200_000).prop_map(|(a, b)| {
        RecencyWindow::since(BASE + a.min(b), BASE + a.max(b))
    })
}

fn username_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((0u8..16).prop_map(|i| format!("user{i}")), 0..24)
}

proptest! {
    #[test]
    fn dedup_keeps_one_latest_entry_per_title(
        submissions in prop::collection::vec(submission_strategy(), 0..100),
        window in window_strategy(),
    ) {
        let kept = dedup_latest(&submissions, window);

        // One entry per title.
        let titles: BTreeSet<&str> = kept.iter().map(|s| s.title.as_str()).collect();
        prop_assert_eq!(titles.len(), kept.len());

        // Everything kept is in the window, at that title's max timestamp.
        for entry in &kept {
            prop_assert!(window.contains(entry.timestamp));
            let max_in_window = submissions
                .iter()
                .filter(|s| s.title == entry.title && window.contains(s.timestamp))
                .map(|s| s.timestamp)
                .max();
            prop_assert_eq!(Some(entry.timestamp), max_in_window);
        }

        // Every in-window title survives.
        let in_window: BTreeSet<&str> = submissions
            .iter()
            .filter(|s| window.contains(s.timestamp))
            .map(|s| s.title.as_str())
            .collect();
        prop_assert_eq!(in_window.len(), kept.len());

        // Newest first, ties by title ascending.
        for pair in kept.windows(2) {
            prop_assert!(
                pair[0].timestamp > pair[1].timestamp
                    || (pair[0].timestamp == pair[1].timestamp && pair[0].title < pair[1].title)
            );
        }
    }

    #[test]
    fn narrowing_the_window_never_adds_entries(
        submissions in prop::collection::vec(submission_strategy(), 0..100),
        window in window_strategy(),
        shrink in 0u64..100_000,
    ) {
        let wide = dedup_latest(&submissions, window);
        let narrow_window = RecencyWindow::since(
            (window.start + shrink).min(window.end),
            window.end,
        );
        let narrow = dedup_latest(&submissions, narrow_window);

        prop_assert!(narrow.len() <= wide.len());
        // Everything narrow kept is also in the wide result.
        let wide_titles: BTreeSet<&str> = wide.iter().map(|s| s.title.as_str()).collect();
        for entry in &narrow {
            prop_assert!(wide_titles.contains(entry.title.as_str()));
        }
    }

    #[test]
    fn merge_is_an_order_stable_dedup_union(
        local in username_strategy(),
        cloud in username_strategy(),
    ) {
        let merged = merge_tracked(&local, &cloud);

        // No duplicates.
        let unique: BTreeSet<&String> = merged.iter().collect();
        prop_assert_eq!(unique.len(), merged.len());

        // Exactly the union of both inputs.
        let expected: BTreeSet<&String> = local.iter().chain(&cloud).collect();
        prop_assert_eq!(unique, expected);

        // Local entries keep their relative order at the front.
        let local_positions: Vec<usize> = local
            .iter()
            .filter_map(|name| merged.iter().position(|m| m == name))
            .collect();
        for pair in local_positions.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }

        // Idempotent against either side.
        prop_assert_eq!(&merge_tracked(&merged, &cloud), &merged);
        prop_assert_eq!(&merge_tracked(&merged, &local), &merged);
    }

    #[test]
    fn filter_mode_string_form_round_trips(mode in prop_oneof![
        Just(FilterMode::Last24Hours),
        Just(FilterMode::Today),
    ]) {
        let parsed: FilterMode = mode.as_str().parse().expect("stable form parses");
        prop_assert_eq!(parsed, mode);
    }
}
