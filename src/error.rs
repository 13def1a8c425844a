use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Field name -> human-readable message. BTreeMap keeps response bodies in a
/// stable field order.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("order list does not match current children (missing: {missing:?}, unexpected: {unexpected:?})")]
    OrderConflict { missing: Vec<Uuid>, unexpected: Vec<Uuid> },
    #[error("{0}")]
    BadRequest(String),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("database error")]
    Db(#[from] sqlx::Error),
}

impl ApiError {
    /// Single-field validation failure.
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), message.to_string());
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response(),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            Self::OrderConflict { missing, unexpected } => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": "order list does not match current children",
                    "missing": missing,
                    "unexpected": unexpected,
                })),
            )
                .into_response(),
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            Self::Io(e) => {
                tracing::error!(error=%e, "file storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal error" })),
                )
                    .into_response()
            }
            Self::Db(e) => {
                tracing::error!(error=%e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
