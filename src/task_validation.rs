use crate::settings::Settings;
use crate::task::Task;
use crate::workstream::Workstream;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RoadmapValidationError {
    message: String,
}

impl RoadmapValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), RoadmapValidationError> {
    if settings.chart_title.trim().is_empty() {
        return Err(RoadmapValidationError::new("chart_title is required"));
    }
    if settings.timezone.trim().is_empty() {
        return Err(RoadmapValidationError::new("timezone is required"));
    }
    if settings.overall_end_date < settings.overall_start_date {
        return Err(RoadmapValidationError::new(format!(
            "overall_end_date {} must be on or after overall_start_date {}",
            settings.overall_end_date, settings.overall_start_date
        )));
    }
    Ok(())
}

pub fn validate_task(task: &Task) -> Result<(), RoadmapValidationError> {
    if task.id.trim().is_empty() {
        return Err(RoadmapValidationError::new("task id is required"));
    }
    if task.workstream.trim().is_empty() {
        return Err(RoadmapValidationError::new(format!(
            "task {} requires a workstream",
            task.id
        )));
    }
    if task.title.trim().is_empty() {
        return Err(RoadmapValidationError::new(format!(
            "task {} requires a title",
            task.id
        )));
    }
    if task.end_date < task.start_date {
        return Err(RoadmapValidationError::new(format!(
            "task {} end_date {} must be on or after start_date {}",
            task.id, task.end_date, task.start_date
        )));
    }
    Ok(())
}

pub fn validate_workstreams(workstreams: &[Workstream]) -> Result<(), RoadmapValidationError> {
    let mut seen = HashSet::with_capacity(workstreams.len());
    for ws in workstreams {
        if ws.name.trim().is_empty() {
            return Err(RoadmapValidationError::new("workstream name is required"));
        }
        if !seen.insert(ws.name.as_str()) {
            return Err(RoadmapValidationError::new(format!(
                "workstream names must be unique (duplicate '{}')",
                ws.name
            )));
        }
    }
    Ok(())
}

pub fn validate_task_collection(
    tasks: &[Task],
    workstreams: &[Workstream],
) -> Result<(), RoadmapValidationError> {
    let known: HashSet<&str> = workstreams.iter().map(|ws| ws.name.as_str()).collect();
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        validate_task(task)?;
        if !seen_ids.insert(task.id.as_str()) {
            return Err(RoadmapValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if !known.contains(task.workstream.as_str()) {
            return Err(RoadmapValidationError::new(format!(
                "task {} references unknown workstream '{}'",
                task.id, task.workstream
            )));
        }
    }
    Ok(())
}

pub fn validate_roadmap(
    settings: &Settings,
    workstreams: &[Workstream],
    tasks: &[Task],
) -> Result<(), RoadmapValidationError> {
    validate_settings(settings)?;
    validate_workstreams(workstreams)?;
    validate_task_collection(tasks, workstreams)
}
