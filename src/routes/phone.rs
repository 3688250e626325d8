use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::dto::phone_dto::{AuthorizeRequest, ScanRequest};
use crate::dto::session_dto::{PhoneView, TransitionResponse};
use crate::error::Result;
use crate::services::coordinator_service::PhoneClient;
use crate::AppState;

fn transition(phone: &PhoneClient, applied: bool) -> Json<TransitionResponse<PhoneView>> {
    Json(TransitionResponse {
        applied,
        session: phone.view(),
    })
}

pub async fn get_session(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.phone.view()))
}

/// Simulated camera scan of the pad's QR code.
pub async fn scan(
    State(state): State<AppState>,
    payload: Option<Json<ScanRequest>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let applied = state.phone.scan(payload.payload.as_deref());
    Ok(transition(&state.phone, applied))
}

pub async fn authorize(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<impl IntoResponse> {
    let applied = state.phone.authorize(payload.confirmed);
    Ok(transition(&state.phone, applied))
}

pub async fn dismiss(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let applied = state.phone.dismiss_failure();
    Ok(transition(&state.phone, applied))
}
