use crate::calculations::bands::{self, BandLayout};
use crate::calculations::range_filter::{self, RangeFilterOutcome};
use crate::calculations::stacking::{self, LaneAssignment, StackingError};
use crate::calculations::timeline::{self, Granularity, TimelineError, TimelineScale};
use crate::dates::WeekStart;
use crate::settings::Settings;
use crate::task::Task;
use crate::task_validation::{self, RoadmapValidationError};
use crate::workstream::{self, Workstream};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RoadmapError {
    #[error("invalid roadmap: {0}")]
    Validation(#[from] RoadmapValidationError),
    #[error(transparent)]
    Stacking(#[from] StackingError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error("{0}")]
    Conflict(String),
    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),
}

/// Everything a renderer needs to draw the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapLayout {
    pub timeline: TimelineScale,
    /// Workstreams in display order.
    pub workstreams: Vec<Workstream>,
    /// Tasks after range clamping, in input order.
    pub tasks: Vec<Task>,
    pub lanes: BTreeMap<String, LaneAssignment>,
    pub bands: BandLayout,
    pub warnings: Vec<String>,
    pub clamped: Vec<String>,
    pub hidden: Vec<String>,
}

impl RoadmapLayout {
    pub fn lane_of(&self, task: &Task) -> Option<usize> {
        self.lanes
            .get(&task.workstream)
            .and_then(|assignment| assignment.lane_of(&task.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub task_count: usize,
    pub visible_count: usize,
    pub hidden_count: usize,
    pub clamped_count: usize,
    pub workstream_count: usize,
    pub total_lanes: usize,
    pub granularity: Granularity,
    pub tick_count: usize,
}

impl LayoutSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("visible={}", self.visible_count));
        if self.hidden_count > 0 {
            parts.push(format!("hidden={}", self.hidden_count));
        }
        if self.clamped_count > 0 {
            parts.push(format!("clamped={}", self.clamped_count));
        }
        parts.push(format!("workstreams={}", self.workstream_count));
        parts.push(format!("lanes={}", self.total_lanes));
        parts.push(format!("scale={}", self.granularity));
        parts.push(format!("ticks={}", self.tick_count));
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roadmap {
    settings: Settings,
    workstreams: Vec<Workstream>,
    tasks: Vec<Task>,
}

impl Roadmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_settings(settings: Settings) -> Self {
        Self {
            settings,
            workstreams: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Builds a roadmap from loaded records, rejecting anything the stacking
    /// engine should never see.
    pub fn from_parts(
        settings: Settings,
        workstreams: Vec<Workstream>,
        tasks: Vec<Task>,
    ) -> Result<Self, RoadmapError> {
        task_validation::validate_roadmap(&settings, &workstreams, &tasks)?;
        Ok(Self {
            settings,
            workstreams,
            tasks,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) -> Result<(), RoadmapError> {
        task_validation::validate_settings(&settings)?;
        self.settings = settings;
        Ok(())
    }

    fn update_settings_with<F>(&mut self, mutator: F) -> Result<(), RoadmapError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.clone();
        mutator(&mut settings);
        self.set_settings(settings)
    }

    pub fn set_overall_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), RoadmapError> {
        self.update_settings_with(|settings| {
            settings.overall_start_date = start;
            settings.overall_end_date = end;
        })
    }

    pub fn set_chart_title(&mut self, title: impl Into<String>) -> Result<(), RoadmapError> {
        let title = title.into();
        self.update_settings_with(|settings| settings.chart_title = title)
    }

    pub fn set_week_start(&mut self, week_start: WeekStart) -> Result<(), RoadmapError> {
        self.update_settings_with(|settings| settings.week_start_day = week_start)
    }

    /// Workstreams in input order.
    pub fn workstreams(&self) -> &[Workstream] {
        &self.workstreams
    }

    pub fn ordered_workstreams(&self) -> Vec<Workstream> {
        workstream::ordered_workstreams(&self.workstreams)
    }

    pub fn upsert_workstream(&mut self, ws: Workstream) -> Result<(), RoadmapError> {
        if ws.name.trim().is_empty() {
            return Err(RoadmapValidationError::new("workstream name is required").into());
        }
        match self.workstreams.iter_mut().find(|existing| existing.name == ws.name) {
            Some(existing) => *existing = ws,
            None => self.workstreams.push(ws),
        }
        Ok(())
    }

    pub fn delete_workstream(&mut self, name: &str) -> Result<bool, RoadmapError> {
        if self.tasks.iter().any(|task| task.workstream == name) {
            return Err(RoadmapError::Conflict(format!(
                "workstream '{name}' still has tasks"
            )));
        }
        let before = self.workstreams.len();
        self.workstreams.retain(|ws| ws.name != name);
        Ok(self.workstreams.len() != before)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn upsert_task(&mut self, task: Task) -> Result<(), RoadmapError> {
        task_validation::validate_task(&task)?;
        if !self.workstreams.iter().any(|ws| ws.name == task.workstream) {
            return Err(RoadmapValidationError::new(format!(
                "task {} references unknown workstream '{}'",
                task.id, task.workstream
            ))
            .into());
        }
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        Ok(())
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != task_id);
        self.tasks.len() != before
    }

    fn filtered_tasks(&self) -> RangeFilterOutcome {
        range_filter::filter_to_range(
            &self.tasks,
            self.settings.overall_start_date,
            self.settings.overall_end_date,
            self.settings.include_out_of_range,
        )
    }

    pub fn lanes(&self) -> Result<BTreeMap<String, LaneAssignment>, RoadmapError> {
        let filtered = self.filtered_tasks();
        Ok(stacking::assign_lanes_by_workstream(
            &filtered.visible,
            self.settings.overlap_policy,
        )?)
    }

    pub fn timeline(&self) -> Result<TimelineScale, RoadmapError> {
        Ok(timeline::select_scale(
            self.settings.overall_start_date,
            self.settings.overall_end_date,
            self.settings.week_start_day,
        )?)
    }

    pub fn layout(&self) -> Result<RoadmapLayout, RoadmapError> {
        task_validation::validate_roadmap(&self.settings, &self.workstreams, &self.tasks)?;
        let timeline = self.timeline()?;

        let filtered = self.filtered_tasks();
        let lanes =
            stacking::assign_lanes_by_workstream(&filtered.visible, self.settings.overlap_policy)?;
        let ordered = self.ordered_workstreams();
        let bands = bands::compute_bands(
            &ordered,
            &lanes,
            bands::DEFAULT_GROUP_GAP,
            bands::DEFAULT_MIN_ROWS,
        );
        debug!(
            workstreams = ordered.len(),
            visible = filtered.visible.len(),
            hidden = filtered.hidden.len(),
            "computed roadmap layout"
        );

        Ok(RoadmapLayout {
            timeline,
            workstreams: ordered,
            tasks: filtered.visible,
            lanes,
            bands,
            warnings: filtered.warnings,
            clamped: filtered.clamped,
            hidden: filtered.hidden,
        })
    }

    pub fn refresh(&self) -> Result<LayoutSummary, RoadmapError> {
        let layout = self.layout()?;
        let summary = LayoutSummary {
            task_count: self.tasks.len(),
            visible_count: layout.tasks.len(),
            hidden_count: layout.hidden.len(),
            clamped_count: layout.clamped.len(),
            workstream_count: layout.workstreams.len(),
            total_lanes: layout.lanes.values().map(LaneAssignment::max_lanes).sum(),
            granularity: layout.timeline.granularity,
            tick_count: layout.timeline.ticks.len(),
        };
        info!(summary = %summary.to_cli_summary(), "roadmap refreshed");
        Ok(summary)
    }

    fn default_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("id".into(), DataType::String),
            Field::new("workstream".into(), DataType::String),
            Field::new("title".into(), DataType::String),
            Field::new("start_date".into(), DataType::Date),
            Field::new("end_date".into(), DataType::Date),
            Field::new("status".into(), DataType::String),
            Field::new("type".into(), DataType::String),
            Field::new("owner".into(), DataType::String),
            Field::new("sublane".into(), DataType::Int64),
        ])
    }

    /// Task table in input order with each task's sublane; hidden tasks have
    /// a null sublane.
    pub fn dataframe(&self) -> Result<DataFrame, RoadmapError> {
        let lanes = self.lanes()?;
        let mut df = DataFrame::empty_with_schema(&Self::default_schema());
        for task in &self.tasks {
            let sublane = lanes
                .get(&task.workstream)
                .and_then(|assignment| assignment.lane_of(&task.id));
            let row = task.to_dataframe_row(sublane)?;
            df = df.vstack(&row)?;
        }
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_schema_matches_task_rows() {
        let schema = Roadmap::default_schema();
        let row = Task::new("A", "WS", "A", d(2026, 1, 1), d(2026, 1, 2))
            .to_dataframe_row(Some(0))
            .unwrap();
        let names: Vec<String> = row
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        for name in &names {
            assert!(schema.contains(name.as_str()), "missing column {name}");
        }
        assert_eq!(schema.len(), names.len());
    }

    #[test]
    fn upsert_task_requires_known_workstream() {
        let mut roadmap = Roadmap::new();
        let err = roadmap
            .upsert_task(Task::new("A", "Ghost", "A", d(2025, 2, 1), d(2025, 2, 2)))
            .unwrap_err();
        assert!(matches!(err, RoadmapError::Validation(_)));
    }
}
