use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{Roadmap, RoadmapError, RoadmapLayout, Settings, Task, TimelineScale, Workstream};

#[derive(Clone)]
pub struct AppState {
    roadmap: Arc<RwLock<Roadmap>>,
}

impl AppState {
    pub fn new(roadmap: Roadmap) -> Self {
        Self {
            roadmap: Arc::new(RwLock::new(roadmap)),
        }
    }

    fn roadmap(&self) -> Arc<RwLock<Roadmap>> {
        self.roadmap.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<RoadmapError> for ApiError {
    fn from(value: RoadmapError) -> Self {
        match value {
            RoadmapError::Conflict(message) => ApiError::Conflict(message),
            RoadmapError::DataFrame(err) => ApiError::Internal(err.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        if status.is_server_error() {
            warn!(%message, "request failed");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/workstreams", get(list_workstreams).post(create_workstream))
        .route("/workstreams/:name", delete(delete_workstream))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/layout", get(get_layout))
        .route("/timeline", get(get_timeline))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, roadmap: Roadmap) -> std::io::Result<()> {
    let state = AppState::new(roadmap);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "roadmap-tool HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let roadmap = state.roadmap();
    let settings = roadmap.read().settings().clone();
    Json(settings)
}

async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    let roadmap = state.roadmap();
    let current = {
        let mut guard = roadmap.write();
        guard.set_settings(settings)?;
        guard.settings().clone()
    };
    Ok(Json(current))
}

async fn list_workstreams(State(state): State<AppState>) -> Json<Vec<Workstream>> {
    let roadmap = state.roadmap();
    let workstreams = roadmap.read().workstreams().to_vec();
    Json(workstreams)
}

async fn create_workstream(
    State(state): State<AppState>,
    Json(ws): Json<Workstream>,
) -> Result<(StatusCode, Json<Workstream>), ApiError> {
    let roadmap = state.roadmap();
    {
        let mut guard = roadmap.write();
        if guard.workstreams().iter().any(|existing| existing.name == ws.name) {
            return Err(ApiError::Conflict(format!(
                "workstream '{}' already exists",
                ws.name
            )));
        }
        guard.upsert_workstream(ws.clone())?;
    }
    Ok((StatusCode::CREATED, Json(ws)))
}

async fn delete_workstream(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let roadmap = state.roadmap();
    let removed = roadmap.write().delete_workstream(&name)?;
    if !removed {
        return Err(ApiError::not_found(format!("workstream '{name}' not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let roadmap = state.roadmap();
    let tasks = roadmap.read().tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let roadmap = state.roadmap();
    let result = roadmap.read().find_task(&task_id).cloned();
    match result {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

async fn create_task(
    State(state): State<AppState>,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let roadmap = state.roadmap();
    let created = {
        let mut guard = roadmap.write();
        if guard.find_task(&task.id).is_some() {
            return Err(ApiError::Conflict(format!(
                "task {} already exists",
                task.id
            )));
        }
        guard.upsert_task(task.clone())?;
        guard
            .find_task(&task.id)
            .cloned()
            .ok_or_else(|| ApiError::internal("task not found after creation"))?
    };
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(task): Json<Task>,
) -> Result<Json<Task>, ApiError> {
    if task.id != task_id {
        return Err(ApiError::invalid(
            "task id in payload does not match path parameter",
        ));
    }
    let roadmap = state.roadmap();
    let updated = {
        let mut guard = roadmap.write();
        if guard.find_task(&task_id).is_none() {
            return Err(ApiError::not_found(format!("task {task_id} not found")));
        }
        guard.upsert_task(task)?;
        guard
            .find_task(&task_id)
            .cloned()
            .ok_or_else(|| ApiError::internal("task not found after update"))?
    };
    Ok(Json(updated))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let roadmap = state.roadmap();
    let removed = roadmap.write().delete_task(&task_id);
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_layout(State(state): State<AppState>) -> Result<Json<RoadmapLayout>, ApiError> {
    let roadmap = state.roadmap();
    let layout = roadmap.read().layout()?;
    Ok(Json(layout))
}

async fn get_timeline(State(state): State<AppState>) -> Result<Json<TimelineScale>, ApiError> {
    let roadmap = state.roadmap();
    let timeline = roadmap.read().timeline()?;
    Ok(Json(timeline))
}
