use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{
        models::{now, Subtask},
        repos::subtask::{CreateSubtask, DeleteSubtask, SubtaskChangeSet, UpdateSubtask},
    },
    error::ApiError,
    routes::AppState,
    validation::Validator,
};

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubtaskRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
}

/// POST /api/tasks/:task/subtasks
pub async fn store(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    payload: Result<Json<CreateSubtaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Subtask>), ApiError> {
    let Json(request) = payload?;
    let mut validator = Validator::default();
    let title = validator.required_string("title", request.title);
    validator.finish()?;

    let subtask = state
        .db
        .run(move |conn| Subtask::create(conn, &task_id, &title))
        .await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

/// PUT /api/subtasks/:subtask
pub async fn update(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
    payload: Result<Json<UpdateSubtaskRequest>, JsonRejection>,
) -> Result<Json<Subtask>, ApiError> {
    let Json(request) = payload?;
    let mut validator = Validator::default();
    let title = validator.optional_string("title", request.title);
    validator.finish()?;

    let change_set = SubtaskChangeSet {
        title,
        is_completed: request.is_completed,
        updated_at: now(),
    };
    let subtask = state
        .db
        .run(move |conn| Subtask::update(conn, &subtask_id, change_set))
        .await?;
    Ok(Json(subtask))
}

/// DELETE /api/subtasks/:subtask
pub async fn destroy(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(move |conn| Subtask::delete(conn, &subtask_id))
        .await?;
    Ok(Json(json!({ "message": "Subtask deleted successfully" })))
}
