use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use roadmap_tool::calculations::stacking::{
    assign_lanes, assign_lanes_by_workstream, assign_lanes_with_policy, validate_no_overlaps,
};
use roadmap_tool::dates::intervals_overlap;
use roadmap_tool::{OverlapPolicy, StackingError, Task};
use std::collections::BTreeSet;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
    Task::new(id, "Engineering", id, start, end)
}

fn random_tasks(rng: &mut StdRng, count: usize) -> Vec<Task> {
    let base = d(2025, 1, 1);
    (0..count)
        .map(|idx| {
            let start = base + Duration::days(rng.gen_range(0..90));
            let end = start + Duration::days(rng.gen_range(0..21));
            t(&format!("T{idx:03}"), start, end)
        })
        .collect()
}

fn max_active_on_any_day(tasks: &[Task]) -> usize {
    let Some(first) = tasks.iter().map(|task| task.start_date).min() else {
        return 0;
    };
    let last = tasks.iter().map(|task| task.end_date).max().unwrap_or(first);
    let mut best = 0;
    let mut day = first;
    while day <= last {
        let active = tasks
            .iter()
            .filter(|task| task.start_date <= day && day <= task.end_date)
            .count();
        best = best.max(active);
        day += Duration::days(1);
    }
    best
}

#[test]
fn empty_input_has_no_lanes() {
    let lanes = assign_lanes(&[]).unwrap();
    assert!(lanes.is_empty());
    assert_eq!(lanes.max_lanes(), 0);
}

#[test]
fn single_task_uses_lane_zero() {
    let lanes = assign_lanes(&[t("A", d(2025, 3, 1), d(2025, 3, 9))]).unwrap();
    assert_eq!(lanes.lane_of("A"), Some(0));
    assert_eq!(lanes.max_lanes(), 1);
}

#[test]
fn shared_boundary_day_forces_separate_lanes() {
    let tasks = vec![
        t("A", d(2025, 10, 1), d(2025, 10, 1)),
        t("B", d(2025, 10, 1), d(2025, 10, 5)),
    ];
    let lanes = assign_lanes(&tasks).unwrap();
    assert_ne!(lanes.lane_of("A"), lanes.lane_of("B"));
    assert_eq!(lanes.max_lanes(), 2);
}

#[test]
fn next_day_start_reuses_lane() {
    let tasks = vec![
        t("A", d(2025, 10, 1), d(2025, 10, 1)),
        t("C", d(2025, 10, 2), d(2025, 10, 10)),
    ];
    let lanes = assign_lanes(&tasks).unwrap();
    assert_eq!(lanes.lane_of("A"), Some(0));
    assert_eq!(lanes.lane_of("C"), Some(0));
    assert_eq!(lanes.max_lanes(), 1);
}

#[test]
fn overlapping_and_sequential_tasks_pack_into_two_lanes() {
    let tasks = vec![
        t("A", d(2025, 1, 1), d(2025, 1, 10)),
        t("B", d(2025, 1, 5), d(2025, 1, 12)),
        t("C", d(2025, 1, 11), d(2025, 1, 20)),
        t("D", d(2025, 1, 13), d(2025, 1, 15)),
    ];
    let lanes = assign_lanes(&tasks).unwrap();
    assert_eq!(lanes.lane_of("A"), Some(0));
    assert_eq!(lanes.lane_of("B"), Some(1));
    assert_eq!(lanes.lane_of("C"), Some(0));
    assert_eq!(lanes.lane_of("D"), Some(1));
    assert_eq!(lanes.max_lanes(), 2);
}

#[test]
fn identical_intervals_are_ordered_by_id() {
    let tasks = vec![
        t("beta", d(2025, 6, 1), d(2025, 6, 3)),
        t("alpha", d(2025, 6, 1), d(2025, 6, 3)),
        t("gamma", d(2025, 6, 1), d(2025, 6, 3)),
    ];
    let lanes = assign_lanes(&tasks).unwrap();
    assert_eq!(lanes.lane_of("alpha"), Some(0));
    assert_eq!(lanes.lane_of("beta"), Some(1));
    assert_eq!(lanes.lane_of("gamma"), Some(2));
}

#[test]
fn touching_allowed_policy_shares_boundary_day() {
    let tasks = vec![
        t("A", d(2025, 10, 1), d(2025, 10, 1)),
        t("B", d(2025, 10, 1), d(2025, 10, 5)),
    ];
    let lanes = assign_lanes_with_policy(&tasks, OverlapPolicy::TouchingAllowed).unwrap();
    assert_eq!(lanes.lane_of("A"), Some(0));
    assert_eq!(lanes.lane_of("B"), Some(0));
    assert_eq!(lanes.max_lanes(), 1);
}

#[test]
fn inverted_interval_is_rejected() {
    let tasks = vec![
        t("ok", d(2025, 2, 1), d(2025, 2, 2)),
        t("bad", d(2025, 2, 10), d(2025, 2, 5)),
    ];
    let err = assign_lanes(&tasks).unwrap_err();
    assert_eq!(
        err,
        StackingError::MalformedInterval {
            id: "bad".into(),
            start: d(2025, 2, 10),
            end: d(2025, 2, 5),
        }
    );
}

#[test]
fn lane_count_matches_peak_daily_load() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..50 {
        let tasks = random_tasks(&mut rng, 1 + round % 25);
        let lanes = assign_lanes(&tasks).unwrap();
        assert_eq!(
            lanes.max_lanes(),
            max_active_on_any_day(&tasks),
            "round {round} used more lanes than needed"
        );
    }
}

#[test]
fn random_sets_never_share_a_lane_on_the_same_day() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..30 {
        let tasks = random_tasks(&mut rng, 20);
        let lanes = assign_lanes(&tasks).unwrap();
        for (i, a) in tasks.iter().enumerate() {
            for b in tasks.iter().skip(i + 1) {
                if intervals_overlap(a.start_date, a.end_date, b.start_date, b.end_date) {
                    assert_ne!(lanes.lane_of(&a.id), lanes.lane_of(&b.id));
                }
            }
        }
        let by_ws = assign_lanes_by_workstream(&tasks, OverlapPolicy::TouchingOverlaps).unwrap();
        validate_no_overlaps(&tasks, &by_ws, OverlapPolicy::TouchingOverlaps).unwrap();
    }
}

#[test]
fn shuffled_input_yields_identical_assignment() {
    let mut rng = StdRng::seed_from_u64(23);
    let tasks = random_tasks(&mut rng, 40);
    let expected = assign_lanes(&tasks).unwrap();
    for _ in 0..20 {
        let mut shuffled = tasks.clone();
        shuffled.shuffle(&mut rng);
        assert_eq!(assign_lanes(&shuffled).unwrap(), expected);
    }
}

#[test]
fn used_lanes_are_dense() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..30 {
        let tasks = random_tasks(&mut rng, 15);
        let lanes = assign_lanes(&tasks).unwrap();
        let used: BTreeSet<usize> = lanes.iter().map(|(_, lane)| lane).collect();
        let expected: BTreeSet<usize> = (0..lanes.max_lanes()).collect();
        assert_eq!(used, expected);
    }
}

#[test]
fn workstreams_are_stacked_independently() {
    let mut tasks = vec![
        t("E1", d(2025, 4, 1), d(2025, 4, 30)),
        t("E2", d(2025, 4, 10), d(2025, 4, 20)),
    ];
    tasks.push(Task::new("F1", "Finance", "F1", d(2025, 4, 1), d(2025, 4, 30)));

    let lanes = assign_lanes_by_workstream(&tasks, OverlapPolicy::default()).unwrap();
    assert_eq!(lanes.keys().cloned().collect::<Vec<_>>(), vec!["Engineering", "Finance"]);
    assert_eq!(lanes["Engineering"].max_lanes(), 2);
    assert_eq!(lanes["Finance"].max_lanes(), 1);
    assert_eq!(lanes["Finance"].lane_of("F1"), Some(0));
}

#[test]
fn interleaved_workstreams_match_stacking_each_group_alone() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut tasks = random_tasks(&mut rng, 40);
    for (idx, task) in tasks.iter_mut().enumerate() {
        task.workstream = ["Engineering", "Finance", "Ops"][idx % 3].to_string();
    }

    let by_ws = assign_lanes_by_workstream(&tasks, OverlapPolicy::default()).unwrap();
    for (workstream, assignment) in &by_ws {
        let group: Vec<Task> = tasks
            .iter()
            .filter(|task| &task.workstream == workstream)
            .cloned()
            .collect();
        assert_eq!(assignment, &assign_lanes(&group).unwrap());
    }
}

#[test]
fn malformed_task_in_one_workstream_fails_the_whole_stack() {
    let tasks = vec![
        t("E1", d(2025, 4, 1), d(2025, 4, 30)),
        Task::new("F1", "Finance", "F1", d(2025, 4, 30), d(2025, 4, 1)),
    ];
    let err = assign_lanes_by_workstream(&tasks, OverlapPolicy::default()).unwrap_err();
    assert!(matches!(err, StackingError::MalformedInterval { id, .. } if id == "F1"));
}

#[test]
fn validator_reports_missing_lane() {
    let tasks = vec![t("A", d(2025, 1, 1), d(2025, 1, 2))];
    let err = validate_no_overlaps(&tasks, &Default::default(), OverlapPolicy::default())
        .unwrap_err();
    assert_eq!(err, StackingError::MissingLane { id: "A".into() });
}
