use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::reindex::ReindexError;

/// Field name to the messages raised against it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    #[error("{0}")]
    MalformedBody(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("ordering invariant violated: {0}")]
    Consistency(#[source] ReindexError),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Blocking(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

impl From<ReindexError> for ApiError {
    fn from(err: ReindexError) -> Self {
        match err {
            ReindexError::OutOfRange { .. } => ApiError::invalid("order", err.to_string()),
            _ => ApiError::Consistency(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(errors) => {
                let message = errors
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| self.to_string());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "message": message, "errors": errors }),
                )
            }
            ApiError::MalformedBody(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": message, "errors": {} }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "message": self.to_string() }),
            ),
            _ => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Server Error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_becomes_order_field_error() {
        let err: ApiError = ReindexError::OutOfRange { order: 9, max: 2 }.into();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors["order"], vec!["The order must be between 0 and 2."]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_density_violation_is_a_consistency_error() {
        let err: ApiError = ReindexError::NotDense { expected: 1, found: 2 }.into();
        assert!(matches!(err, ApiError::Consistency(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("Board").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::invalid("name", "The name field is required.")
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
