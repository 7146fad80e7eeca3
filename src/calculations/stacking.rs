//! Greedy interval partitioning of tasks into sublanes.
//!
//! Tasks are sorted by `(start_date, end_date, id)` and each one is placed in
//! the lowest-indexed lane whose last task has already finished. For interval
//! graphs this first-fit order is optimal: a new lane is only opened when every
//! existing lane is busy on the task's start day, so the lane count equals the
//! largest number of tasks active on a single day.

use crate::task::Task;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Whether two tasks that meet on a boundary day may share a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// A task ending on day D blocks its lane until D + 1.
    #[default]
    TouchingOverlaps,
    /// A task may start in a lane on the same day the previous task ends.
    TouchingAllowed,
}

impl OverlapPolicy {
    fn lane_is_free(&self, lane_end: NaiveDate, start: NaiveDate) -> bool {
        match self {
            OverlapPolicy::TouchingOverlaps => lane_end < start,
            OverlapPolicy::TouchingAllowed => lane_end <= start,
        }
    }

    fn conflicts(&self, earlier_end: NaiveDate, later_start: NaiveDate) -> bool {
        !self.lane_is_free(earlier_end, later_start)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackingError {
    #[error("task {id} ends {end} before it starts {start}")]
    MalformedInterval {
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("task {id} has no sublane assigned")]
    MissingLane { id: String },
    #[error("overlap detected in workstream={workstream}, sublane={lane}: {first} vs {second}")]
    LaneOverlap {
        workstream: String,
        lane: usize,
        first: String,
        second: String,
    },
}

/// Lane index per task id for one workstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneAssignment {
    lanes: BTreeMap<String, usize>,
    max_lanes: usize,
}

impl LaneAssignment {
    pub fn lane_of(&self, task_id: &str) -> Option<usize> {
        self.lanes.get(task_id).copied()
    }

    /// Number of lanes in use; sizes the workstream's band. Zero when empty.
    pub fn max_lanes(&self) -> usize {
        self.max_lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.lanes.iter().map(|(id, lane)| (id.as_str(), *lane))
    }
}

pub fn assign_lanes(tasks: &[Task]) -> Result<LaneAssignment, StackingError> {
    assign_lanes_with_policy(tasks, OverlapPolicy::TouchingOverlaps)
}

pub fn assign_lanes_with_policy(
    tasks: &[Task],
    policy: OverlapPolicy,
) -> Result<LaneAssignment, StackingError> {
    stack_refs(tasks.iter().collect(), policy)
}

fn stack_refs(
    mut ordered: Vec<&Task>,
    policy: OverlapPolicy,
) -> Result<LaneAssignment, StackingError> {
    if let Some(bad) = ordered.iter().find(|t| t.end_date < t.start_date) {
        return Err(StackingError::MalformedInterval {
            id: bad.id.clone(),
            start: bad.start_date,
            end: bad.end_date,
        });
    }

    ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut lane_end_dates: Vec<NaiveDate> = Vec::new();
    let mut lanes = BTreeMap::new();

    for task in ordered {
        let free = lane_end_dates
            .iter()
            .position(|&lane_end| policy.lane_is_free(lane_end, task.start_date));
        let lane = match free {
            Some(idx) => {
                // Keep the later end in case a nested task ever lands here.
                lane_end_dates[idx] = lane_end_dates[idx].max(task.end_date);
                idx
            }
            None => {
                lane_end_dates.push(task.end_date);
                lane_end_dates.len() - 1
            }
        };
        lanes.insert(task.id.clone(), lane);
    }

    Ok(LaneAssignment {
        lanes,
        max_lanes: lane_end_dates.len(),
    })
}

/// Stacks every workstream independently. Groups run in parallel; the result
/// is keyed by workstream name so its order never depends on the thread pool.
pub fn assign_lanes_by_workstream(
    tasks: &[Task],
    policy: OverlapPolicy,
) -> Result<BTreeMap<String, LaneAssignment>, StackingError> {
    let mut grouped: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        grouped
            .entry(task.workstream.as_str())
            .or_default()
            .push(task);
    }

    let stacked: Vec<(String, LaneAssignment)> = grouped
        .into_par_iter()
        .map(|(workstream, group)| -> Result<(String, LaneAssignment), StackingError> {
            let count = group.len();
            let assignment = stack_refs(group, policy)?;
            debug!(
                workstream,
                tasks = count,
                lanes = assignment.max_lanes(),
                "stacked workstream"
            );
            Ok((workstream.to_string(), assignment))
        })
        .collect::<Result<Vec<_>, StackingError>>()?;

    Ok(stacked.into_iter().collect())
}

/// Confirms no two tasks sharing a `(workstream, lane)` conflict under `policy`.
pub fn validate_no_overlaps(
    tasks: &[Task],
    lanes: &BTreeMap<String, LaneAssignment>,
    policy: OverlapPolicy,
) -> Result<(), StackingError> {
    let mut by_lane: HashMap<(&str, usize), Vec<&Task>> = HashMap::new();
    for task in tasks {
        let lane = lanes
            .get(&task.workstream)
            .and_then(|assignment| assignment.lane_of(&task.id))
            .ok_or_else(|| StackingError::MissingLane {
                id: task.id.clone(),
            })?;
        by_lane
            .entry((task.workstream.as_str(), lane))
            .or_default()
            .push(task);
    }

    let mut keys: Vec<(&str, usize)> = by_lane.keys().copied().collect();
    keys.sort();
    for key in keys {
        let mut lane_tasks = by_lane.remove(&key).unwrap_or_default();
        lane_tasks.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for pair in lane_tasks.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if policy.conflicts(prev.end_date, cur.start_date) {
                return Err(StackingError::LaneOverlap {
                    workstream: key.0.to_string(),
                    lane: key.1,
                    first: prev.id.clone(),
                    second: cur.id.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(id, "WS", id, start, end)
    }

    #[test]
    fn nested_task_reuses_lane_without_shrinking_end() {
        let tasks = vec![
            t("A", d(2025, 1, 1), d(2025, 1, 31)),
            t("B", d(2025, 1, 2), d(2025, 1, 3)),
            t("C", d(2025, 1, 4), d(2025, 1, 5)),
        ];
        let lanes = assign_lanes(&tasks).unwrap();
        assert_eq!(lanes.lane_of("A"), Some(0));
        assert_eq!(lanes.lane_of("B"), Some(1));
        assert_eq!(lanes.lane_of("C"), Some(1));
        assert_eq!(lanes.max_lanes(), 2);
    }

    #[test]
    fn validator_flags_shared_lane_conflict() {
        let tasks = vec![
            t("A", d(2025, 1, 1), d(2025, 1, 10)),
            t("B", d(2025, 1, 10), d(2025, 1, 12)),
        ];
        let relaxed = assign_lanes_by_workstream(&tasks, OverlapPolicy::TouchingAllowed).unwrap();
        assert!(validate_no_overlaps(&tasks, &relaxed, OverlapPolicy::TouchingAllowed).is_ok());

        let err = validate_no_overlaps(&tasks, &relaxed, OverlapPolicy::TouchingOverlaps)
            .unwrap_err();
        assert_eq!(
            err,
            StackingError::LaneOverlap {
                workstream: "WS".into(),
                lane: 0,
                first: "A".into(),
                second: "B".into(),
            }
        );
    }
}
