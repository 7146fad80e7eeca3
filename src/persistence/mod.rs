use crate::roadmap::{Roadmap, RoadmapError};
use crate::task::Task;
use crate::task_validation;
use crate::workstream::Workstream;
use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<RoadmapError> for PersistenceError {
    fn from(value: RoadmapError) -> Self {
        match value {
            RoadmapError::DataFrame(err) => Self::DataFrame(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait RoadmapStore {
    fn save_roadmap(&self, roadmap: &Roadmap) -> PersistenceResult<()>;
    fn load_roadmap(&self) -> PersistenceResult<Option<Roadmap>>;
}

pub fn validate_tasks(tasks: &[Task]) -> PersistenceResult<()> {
    for task in tasks {
        task_validation::validate_task(task)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
    }
    Ok(())
}

pub fn validate_workstreams(workstreams: &[Workstream]) -> PersistenceResult<()> {
    task_validation::validate_workstreams(workstreams)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn validate_roadmap(roadmap: &Roadmap) -> PersistenceResult<()> {
    task_validation::validate_roadmap(roadmap.settings(), roadmap.workstreams(), roadmap.tasks())
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_roadmap_from_csv_dir, load_roadmap_from_json, load_tasks_from_csv,
    load_workstreams_from_csv, save_roadmap_to_csv_dir, save_roadmap_to_json, save_tasks_to_csv,
    save_workstreams_to_csv,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRoadmapStore;
