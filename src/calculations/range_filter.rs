use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tasks ready for stacking plus what the filter did to get there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilterOutcome {
    pub visible: Vec<Task>,
    /// Ids of tasks shortened to fit the overall range.
    pub clamped: Vec<String>,
    /// Ids of tasks lying entirely outside the overall range.
    pub out_of_range: Vec<String>,
    /// Out-of-range ids that were dropped from `visible`.
    pub hidden: Vec<String>,
    pub warnings: Vec<String>,
}

/// Applies the chart's out-of-range policy before stacking: tasks entirely
/// outside `[start, end]` are hidden unless `include_out_of_range` is set, and
/// tasks straddling a range edge are clamped to it.
pub fn filter_to_range(
    tasks: &[Task],
    start: NaiveDate,
    end: NaiveDate,
    include_out_of_range: bool,
) -> RangeFilterOutcome {
    let mut outcome = RangeFilterOutcome::default();

    for task in tasks {
        if task.end_date < start || task.start_date > end {
            let message = format!(
                "{}: '{}' is outside the overall date range.",
                task.id, task.title
            );
            warn!(task = %task.id, "task outside overall range");
            outcome.warnings.push(message);
            outcome.out_of_range.push(task.id.clone());
            if include_out_of_range {
                outcome.visible.push(task.clone());
            } else {
                outcome.hidden.push(task.id.clone());
            }
            continue;
        }

        let clamped_start = task.start_date.max(start);
        let clamped_end = task.end_date.min(end);
        if clamped_start != task.start_date || clamped_end != task.end_date {
            warn!(task = %task.id, "task clamped to overall range");
            outcome.warnings.push(format!(
                "{}: '{}' is partially outside range; clamped in the chart.",
                task.id, task.title
            ));
            outcome.clamped.push(task.id.clone());
            let mut clamped = task.clone();
            clamped.start_date = clamped_start;
            clamped.end_date = clamped_end;
            outcome.visible.push(clamped);
        } else {
            outcome.visible.push(task.clone());
        }
    }

    outcome
}
