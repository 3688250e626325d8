use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler(state = AppState)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.coordinator.snapshot();
    let body = json!({
        "status": "ok",
        "session_version": snapshot.version,
    });
    (StatusCode::OK, Json(body))
}
