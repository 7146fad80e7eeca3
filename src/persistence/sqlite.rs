use super::{PersistenceError, PersistenceResult, RoadmapStore};
use crate::roadmap::Roadmap;
use crate::settings::Settings;
use crate::task::Task;
use crate::workstream::Workstream;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SqliteRoadmapStore {
    connection: Mutex<Connection>,
}

impl SqliteRoadmapStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS roadmap_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                settings_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workstreams (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                workstream_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn save_settings(tx: &Transaction, settings: &Settings) -> PersistenceResult<()> {
        let json = serde_json::to_string(settings)?;
        tx.execute("DELETE FROM roadmap_settings", [])?;
        tx.execute(
            "INSERT INTO roadmap_settings (id, settings_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_workstreams(tx: &Transaction, workstreams: &[Workstream]) -> PersistenceResult<()> {
        tx.execute("DELETE FROM workstreams", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO workstreams (position, name, workstream_json) VALUES (?1, ?2, ?3)",
        )?;
        for (position, ws) in workstreams.iter().enumerate() {
            let json = serde_json::to_string(ws)?;
            stmt.execute(params![position as i64, ws.name, json])?;
        }
        Ok(())
    }

    fn save_tasks(tx: &Transaction, tasks: &[Task]) -> PersistenceResult<()> {
        tx.execute("DELETE FROM tasks", [])?;
        let mut stmt =
            tx.prepare("INSERT INTO tasks (position, id, task_json) VALUES (?1, ?2, ?3)")?;
        for (position, task) in tasks.iter().enumerate() {
            let json = serde_json::to_string(task)?;
            stmt.execute(params![position as i64, task.id, json])?;
        }
        Ok(())
    }

    fn load_json_rows<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        sql: &str,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for json in rows {
            let json = json?;
            items.push(serde_json::from_str(&json)?);
        }
        Ok(items)
    }
}

impl RoadmapStore for SqliteRoadmapStore {
    fn save_roadmap(&self, roadmap: &Roadmap) -> PersistenceResult<()> {
        super::validate_roadmap(roadmap)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_settings(&tx, roadmap.settings())?;
        Self::save_workstreams(&tx, roadmap.workstreams())?;
        Self::save_tasks(&tx, roadmap.tasks())?;
        tx.commit()?;
        info!(tasks = roadmap.tasks().len(), "saved roadmap to sqlite");
        Ok(())
    }

    fn load_roadmap(&self) -> PersistenceResult<Option<Roadmap>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT settings_json FROM roadmap_settings WHERE id = 1")?;
        let settings_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(settings_json) = settings_json else {
            return Ok(None);
        };
        let settings: Settings = serde_json::from_str(&settings_json)?;

        let workstreams: Vec<Workstream> = Self::load_json_rows(
            &conn,
            "SELECT workstream_json FROM workstreams ORDER BY position ASC",
        )?;
        let tasks: Vec<Task> =
            Self::load_json_rows(&conn, "SELECT task_json FROM tasks ORDER BY position ASC")?;

        let roadmap = Roadmap::from_parts(settings, workstreams, tasks)?;
        Ok(Some(roadmap))
    }
}
