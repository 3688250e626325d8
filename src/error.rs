use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Question {question_id} requires an answer")]
    Incomplete { question_id: u32 },

    #[error("Activity {0} is no longer available, please choose again")]
    ActivityUnavailable(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Too many {surface} requests, limit is {limit} per second")]
    RateLimited { surface: &'static str, limit: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let (status, code) = match &self {
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Incomplete { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::ActivityUnavailable(_) => (StatusCode::CONFLICT, "activity_unavailable"),
            Error::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            Error::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "invalid_json"),
            Error::Anyhow(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::Xlsx(_) => (StatusCode::INTERNAL_SERVER_ERROR, "export_failed"),
            Error::Config(_) | Error::Internal(_) | Error::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %message, "request failed");
                "An unexpected error occurred".to_string()
            }
            _ => message,
        };

        let body = Json(json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}
