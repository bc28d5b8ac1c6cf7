use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{
        models::Column,
        repos::column::{ColumnChangeSet, CreateColumn, DeleteColumn, UpdateColumn},
    },
    error::ApiError,
    routes::AppState,
    validation::{present, Validator},
};

#[derive(Debug, Deserialize)]
pub struct CreateColumnRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateColumnRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub order: Option<Option<i64>>,
}

impl UpdateColumnRequest {
    fn validate(self) -> Result<ColumnChangeSet, ApiError> {
        let mut validator = Validator::default();
        let name = validator.optional_string("name", self.name);
        let order = validator.not_null("order", self.order, "an integer");
        validator.finish()?;
        Ok(ColumnChangeSet { name, order })
    }
}

/// POST /api/boards/:board/columns
pub async fn store(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    payload: Result<Json<CreateColumnRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Column>), ApiError> {
    let Json(request) = payload?;
    let mut validator = Validator::default();
    let name = validator.required_string("name", request.name);
    validator.finish()?;

    let column = state
        .db
        .run(move |conn| Column::create(conn, &board_id, &name))
        .await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// PUT /api/boards/:board/columns/:column
///
/// A new `order` shifts the columns between the old and new slot.
pub async fn update(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(String, String)>,
    payload: Result<Json<UpdateColumnRequest>, JsonRejection>,
) -> Result<Json<Column>, ApiError> {
    let Json(request) = payload?;
    let change_set = request.validate()?;

    let column = state
        .db
        .run(move |conn| Column::update(conn, &board_id, &column_id, change_set))
        .await?;
    Ok(Json(column))
}

/// DELETE /api/boards/:board/columns/:column
pub async fn destroy(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(move |conn| Column::delete(conn, &board_id, &column_id))
        .await?;
    Ok(Json(json!({ "message": "Column deleted successfully" })))
}
