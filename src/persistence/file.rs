use super::{PersistenceError, PersistenceResult};
use crate::roadmap::Roadmap;
use crate::settings::Settings;
use crate::task::{Task, TaskStatus, TaskType};
use crate::workstream::Workstream;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const WORKSTREAMS_CSV: &str = "workstreams.csv";
pub const TASKS_CSV: &str = "tasks.csv";

#[derive(Serialize, Deserialize)]
struct RoadmapSnapshot {
    settings: Settings,
    #[serde(default)]
    workstreams: Vec<Workstream>,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl RoadmapSnapshot {
    fn from_roadmap(roadmap: &Roadmap) -> PersistenceResult<Self> {
        super::validate_roadmap(roadmap)?;
        Ok(Self {
            settings: roadmap.settings().clone(),
            workstreams: roadmap.workstreams().to_vec(),
            tasks: roadmap.tasks().to_vec(),
        })
    }

    fn into_roadmap(self) -> PersistenceResult<Roadmap> {
        Ok(Roadmap::from_parts(
            self.settings,
            self.workstreams,
            self.tasks,
        )?)
    }
}

pub fn save_roadmap_to_json<P: AsRef<Path>>(roadmap: &Roadmap, path: P) -> PersistenceResult<()> {
    let snapshot = RoadmapSnapshot::from_roadmap(roadmap)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), tasks = snapshot.tasks.len(), "saved roadmap json");
    Ok(())
}

pub fn load_roadmap_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Roadmap> {
    let file = File::open(path.as_ref())?;
    let snapshot: RoadmapSnapshot = serde_json::from_reader(file)?;
    let roadmap = snapshot.into_roadmap()?;
    info!(path = %path.as_ref().display(), tasks = roadmap.tasks().len(), "loaded roadmap json");
    Ok(roadmap)
}

#[derive(Default, Serialize, Deserialize)]
struct WorkstreamCsvRecord {
    workstream: String,
    #[serde(default)]
    order: String,
    #[serde(default)]
    color: String,
}

impl From<&Workstream> for WorkstreamCsvRecord {
    fn from(ws: &Workstream) -> Self {
        Self {
            workstream: ws.name.clone(),
            order: ws.order.map(|v| v.to_string()).unwrap_or_default(),
            color: ws.color.clone().unwrap_or_default(),
        }
    }
}

impl WorkstreamCsvRecord {
    fn into_workstream(self) -> PersistenceResult<Workstream> {
        Ok(Workstream {
            name: self.workstream.trim().to_string(),
            order: parse_i64(&self.order)?,
            color: parse_string_option(self.color),
        })
    }
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: String,
    workstream: String,
    title: String,
    #[serde(default)]
    description: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    color_override: String,
    #[serde(default, rename = "type")]
    task_type: String,
    #[serde(default)]
    hyperlink: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            workstream: task.workstream.clone(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            start_date: format_date(task.start_date),
            end_date: format_date(task.end_date),
            status: task.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            owner: task.owner.clone().unwrap_or_default(),
            color_override: task.color_override.clone().unwrap_or_default(),
            task_type: task.task_type.as_str().to_string(),
            hyperlink: task.hyperlink.clone().unwrap_or_default(),
        }
    }
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let start_date = parse_date(&self.start_date)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("task {} is missing start_date", self.id))
        })?;
        let end_date = parse_date(&self.end_date)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("task {} is missing end_date", self.id))
        })?;
        let status = if self.status.trim().is_empty() {
            None
        } else {
            Some(
                self.status
                    .parse::<TaskStatus>()
                    .map_err(PersistenceError::InvalidData)?,
            )
        };
        let task_type = self
            .task_type
            .parse::<TaskType>()
            .map_err(PersistenceError::InvalidData)?;

        let mut task = Task::new(
            self.id.trim(),
            self.workstream.trim(),
            self.title,
            start_date,
            end_date,
        );
        task.status = status;
        task.task_type = task_type;
        task.description = parse_string_option(self.description);
        task.owner = parse_string_option(self.owner);
        task.color_override = parse_string_option(self.color_override);
        task.hyperlink = parse_string_option(self.hyperlink);
        Ok(task)
    }
}

pub fn save_workstreams_to_csv<P: AsRef<Path>>(
    workstreams: &[Workstream],
    path: P,
) -> PersistenceResult<()> {
    super::validate_workstreams(workstreams)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for ws in workstreams {
        writer.serialize(WorkstreamCsvRecord::from(ws))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_workstreams_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Workstream>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut workstreams = Vec::new();
    for record in reader.deserialize::<WorkstreamCsvRecord>() {
        let record = record?;
        if record.workstream.trim().is_empty() {
            continue;
        }
        workstreams.push(record.into_workstream()?);
    }
    super::validate_workstreams(&workstreams)?;
    Ok(workstreams)
}

pub fn save_tasks_to_csv<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    super::validate_tasks(tasks)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in tasks {
        writer.serialize(TaskCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        let record = record?;
        if record.id.trim().is_empty() {
            continue;
        }
        tasks.push(record.into_task()?);
    }
    super::validate_tasks(&tasks)?;
    Ok(tasks)
}

/// Writes `workstreams.csv` and `tasks.csv` into `dir`, creating it if needed.
pub fn save_roadmap_to_csv_dir<P: AsRef<Path>>(roadmap: &Roadmap, dir: P) -> PersistenceResult<()> {
    super::validate_roadmap(roadmap)?;
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    save_workstreams_to_csv(roadmap.workstreams(), dir.join(WORKSTREAMS_CSV))?;
    save_tasks_to_csv(roadmap.tasks(), dir.join(TASKS_CSV))?;
    info!(dir = %dir.display(), tasks = roadmap.tasks().len(), "saved roadmap csv");
    Ok(())
}

/// CSV files carry no settings, so the caller supplies them.
pub fn load_roadmap_from_csv_dir<P: AsRef<Path>>(
    settings: Settings,
    dir: P,
) -> PersistenceResult<Roadmap> {
    let dir = dir.as_ref();
    let workstreams = load_workstreams_from_csv(dir.join(WORKSTREAMS_CSV))?;
    let tasks = load_tasks_from_csv(dir.join(TASKS_CSV))?;
    let roadmap = Roadmap::from_parts(settings, workstreams, tasks)?;
    info!(dir = %dir.display(), tasks = roadmap.tasks().len(), "loaded roadmap csv");
    Ok(roadmap)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
