use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{
        models::Task,
        repos::task::{
            load_column_tasks, load_task, CreateTask, DeleteTask, TaskChangeSet, UpdateTask,
        },
    },
    error::ApiError,
    routes::AppState,
    validation::{nullable_text, present, Validator},
    views::TaskView,
};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub column_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub order: Option<Option<i64>>,
}

impl UpdateTaskRequest {
    fn validate(self) -> Result<TaskChangeSet, ApiError> {
        let mut validator = Validator::default();
        let title = validator.optional_string("title", self.title);
        let column_id = validator.not_null("column_id", self.column_id, "a string");
        let order = validator.not_null("order", self.order, "an integer");
        validator.finish()?;

        Ok(TaskChangeSet {
            title,
            description: self.description.map(nullable_text),
            column_id: column_id.map(|id| id.trim().to_string()),
            order,
        })
    }
}

/// GET /api/columns/:column/tasks
pub async fn index(
    State(state): State<AppState>,
    Path(column_id): Path<String>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let tasks = state
        .db
        .run(move |conn| load_column_tasks(conn, &column_id))
        .await?;
    Ok(Json(tasks))
}

/// POST /api/columns/:column/tasks
pub async fn store(
    State(state): State<AppState>,
    Path(column_id): Path<String>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let Json(request) = payload?;
    let mut validator = Validator::default();
    let title = validator.required_string("title", request.title);
    validator.finish()?;
    let description = nullable_text(request.description);

    let task = state
        .db
        .run(move |conn| {
            let task = Task::create(conn, &column_id, &title, description.as_deref())?;
            load_task(conn, task)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/:task
pub async fn show(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskView>, ApiError> {
    let task = state
        .db
        .run(move |conn| {
            let task = Task::find(conn, &task_id)?;
            load_task(conn, task)
        })
        .await?;
    Ok(Json(task))
}

/// PUT /api/tasks/:task
///
/// Moving to another column and reordering within the current one both go
/// through here; see `UpdateTask`.
pub async fn update(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskView>, ApiError> {
    let Json(request) = payload?;
    let change_set = request.validate()?;

    let task = state
        .db
        .run(move |conn| {
            let task = Task::update(conn, &task_id, change_set)?;
            load_task(conn, task)
        })
        .await?;
    Ok(Json(task))
}

/// DELETE /api/tasks/:task
pub async fn destroy(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(move |conn| Task::delete(conn, &task_id))
        .await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}
