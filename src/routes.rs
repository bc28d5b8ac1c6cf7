use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    controllers::{boards, columns, subtasks, tasks},
    db::connection::Database,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/boards", get(boards::index).post(boards::store))
        .route(
            "/boards/:board",
            get(boards::show).put(boards::update).delete(boards::destroy),
        )
        .route("/boards/:board/columns", post(columns::store))
        .route(
            "/boards/:board/columns/:column",
            put(columns::update).delete(columns::destroy),
        )
        .route(
            "/columns/:column/tasks",
            get(tasks::index).post(tasks::store),
        )
        .route(
            "/tasks/:task",
            get(tasks::show).put(tasks::update).delete(tasks::destroy),
        )
        .route("/tasks/:task/subtasks", post(subtasks::store))
        .route(
            "/subtasks/:subtask",
            put(subtasks::update).delete(subtasks::destroy),
        )
}

/// Full application: `/api` routes, health probe, CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
