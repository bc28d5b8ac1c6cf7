use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{
        models::{now, Board},
        repos::board::{load_board, load_tree, BoardChangeSet, CreateBoard, DeleteBoard, UpdateBoard},
    },
    error::ApiError,
    routes::AppState,
    validation::Validator,
    views::BoardView,
};

#[derive(Debug, Deserialize)]
pub struct BoardRequest {
    pub name: Option<String>,
}

impl BoardRequest {
    fn validate(self) -> Result<String, ApiError> {
        let mut validator = Validator::default();
        let name = validator.required_string("name", self.name);
        validator.finish()?;
        Ok(name)
    }
}

/// GET /api/boards
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<BoardView>>, ApiError> {
    let boards = state
        .db
        .run(|conn| {
            let boards = Board::all(conn)?;
            load_tree(conn, boards)
        })
        .await?;
    Ok(Json(boards))
}

/// POST /api/boards
pub async fn store(
    State(state): State<AppState>,
    payload: Result<Json<BoardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BoardView>), ApiError> {
    let Json(request) = payload?;
    let name = request.validate()?;

    let board = state
        .db
        .run(move |conn| {
            let board = Board::create(conn, &name)?;
            load_board(conn, board)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// GET /api/boards/:board
pub async fn show(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<Json<BoardView>, ApiError> {
    let board = state
        .db
        .run(move |conn| {
            let board = Board::find(conn, &board_id)?;
            load_board(conn, board)
        })
        .await?;
    Ok(Json(board))
}

/// PUT /api/boards/:board
pub async fn update(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    payload: Result<Json<BoardRequest>, JsonRejection>,
) -> Result<Json<Board>, ApiError> {
    let Json(request) = payload?;
    let name = request.validate()?;

    let change_set = BoardChangeSet {
        name: Some(name),
        updated_at: now(),
    };
    let board = state
        .db
        .run(move |conn| Board::update(conn, &board_id, change_set))
        .await?;
    Ok(Json(board))
}

/// DELETE /api/boards/:board
pub async fn destroy(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(move |conn| Board::delete(conn, &board_id))
        .await?;
    Ok(Json(json!({ "message": "Board deleted successfully" })))
}
