use crate::dates;
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Planned,
    InProgress,
    Done,
    Risk,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Risk => "risk",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(TaskStatus::Planned),
            "in_progress" | "in progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "risk" => Ok(TaskStatus::Risk),
            other => Err(format!(
                "invalid status '{other}' (expected planned, in_progress, done or risk)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Block,
    Milestone,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Block => "block",
            TaskType::Milestone => "milestone",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "block" => Ok(TaskType::Block),
            "milestone" => Ok(TaskType::Milestone),
            other => Err(format!(
                "invalid type '{other}' (expected block or milestone)"
            )),
        }
    }
}

/// A block or milestone drawn inside a workstream's band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub workstream: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, rename = "type")]
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        workstream: impl Into<String>,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            workstream: workstream.into(),
            title: title.into(),
            start_date,
            end_date,
            status: None,
            task_type: TaskType::Block,
            color_override: None,
            owner: None,
            hyperlink: None,
            description: None,
        }
    }

    pub fn milestone(
        id: impl Into<String>,
        workstream: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let mut task = Self::new(id, workstream, title, date, date);
        task.task_type = TaskType::Milestone;
        task
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_milestone(&self) -> bool {
        self.task_type == TaskType::Milestone
    }

    /// Number of calendar days covered, counting both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Stacking order key; `id` breaks ties between identical date pairs.
    pub fn sort_key(&self) -> (NaiveDate, NaiveDate, &str) {
        (self.start_date, self.end_date, self.id.as_str())
    }

    pub fn to_dataframe_row(&self, sublane: Option<usize>) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(10);

        let id_data: [&str; 1] = [self.id.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("id"), id_data).into_column());

        let workstream_data: [&str; 1] = [self.workstream.as_str()];
        columns.push(
            Series::new(PlSmallStr::from_static("workstream"), workstream_data).into_column(),
        );

        let title_data: [&str; 1] = [self.title.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("title"), title_data).into_column());

        columns.push(Self::series_from_date("start_date", self.start_date)?.into_column());
        columns.push(Self::series_from_date("end_date", self.end_date)?.into_column());

        let status: [Option<&str>; 1] = [self.status.as_ref().map(TaskStatus::as_str)];
        columns.push(Series::new(PlSmallStr::from_static("status"), status).into_column());

        let task_type: [&str; 1] = [self.task_type.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("type"), task_type).into_column());

        let owner: [Option<&str>; 1] = [self.owner.as_deref()];
        columns.push(Series::new(PlSmallStr::from_static("owner"), owner).into_column());

        let lane: [Option<i64>; 1] = [sublane.map(|lane| lane as i64)];
        columns.push(Series::new(PlSmallStr::from_static("sublane"), lane).into_column());

        DataFrame::new(columns)
    }

    pub fn from_dataframe_row(df: &DataFrame, row_idx: usize) -> PolarsResult<Self> {
        let id = df
            .column("id")?
            .str()?
            .get(row_idx)
            .ok_or_else(|| PolarsError::ComputeError("task row missing id".into()))?
            .to_string();

        let workstream = df
            .column("workstream")?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        let title = df
            .column("title")?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        let start_date = Self::date_from_series(df.column("start_date")?.date()?, row_idx)
            .ok_or_else(|| {
                PolarsError::ComputeError(format!("task {id} missing start_date").into())
            })?;
        let end_date = Self::date_from_series(df.column("end_date")?.date()?, row_idx)
            .ok_or_else(|| {
                PolarsError::ComputeError(format!("task {id} missing end_date").into())
            })?;

        let status = match df.column("status")?.str()?.get(row_idx) {
            Some(raw) => Some(
                TaskStatus::from_str(raw).map_err(|err| PolarsError::ComputeError(err.into()))?,
            ),
            None => None,
        };
        let task_type = match df.column("type")?.str()?.get(row_idx) {
            Some(raw) => {
                TaskType::from_str(raw).map_err(|err| PolarsError::ComputeError(err.into()))?
            }
            None => TaskType::Block,
        };

        let mut task = Task::new(id, workstream, title, start_date, end_date);
        task.status = status;
        task.task_type = task_type;
        task.owner = df
            .column("owner")?
            .str()?
            .get(row_idx)
            .map(ToOwned::to_owned);
        Ok(task)
    }

    fn series_from_date(name: &str, date: NaiveDate) -> PolarsResult<Series> {
        let data: [Option<i32>; 1] = [Some(dates::epoch_days(date))];
        Series::new(name.into(), data).cast(&DataType::Date)
    }

    fn date_from_series(chunked: &DateChunked, row_idx: usize) -> Option<NaiveDate> {
        chunked.get(row_idx).and_then(dates::from_epoch_days)
    }
}
