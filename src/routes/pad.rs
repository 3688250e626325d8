use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::dto::pad_dto::{
    ActivityListResponse, OpenChallengeRequest, RecommendationListQuery,
    RecommendationListResponse, RecommendationView, SelectOptionRequest, SessionPollQuery,
    SubmissionResponse,
};
use crate::dto::report_dto::ResultDetail;
use crate::dto::session_dto::{ActivitySummary, SessionSnapshot, TransitionResponse};
use crate::error::Result;
use crate::services::coordinator_service::PadClient;
use crate::services::session_service::SelectionIntent;
use crate::AppState;

const DEFAULT_POLL_WAIT_MS: u64 = 25_000;
const MAX_POLL_WAIT_MS: u64 = 30_000;

fn transition(pad: &PadClient, applied: bool) -> Json<TransitionResponse<SessionSnapshot>> {
    Json(TransitionResponse {
        applied,
        session: pad.snapshot(),
    })
}

/// Current session state. With `after_version` the call long-polls until the
/// session moves past that version or the wait elapses.
pub async fn get_session(
    State(state): State<AppState>,
    Query(query): Query<SessionPollQuery>,
) -> Result<impl IntoResponse> {
    let snapshot = match query.after_version {
        Some(after_version) => {
            let wait = query
                .wait_ms
                .unwrap_or(DEFAULT_POLL_WAIT_MS)
                .min(MAX_POLL_WAIT_MS);
            state
                .coordinator
                .wait_for_change(after_version, Duration::from_millis(wait))
                .await
        }
        None => state.pad.snapshot(),
    };
    Ok(Json(snapshot))
}

pub async fn list_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationListQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(10);

    let catalog = state.pad.catalog();
    let total = catalog.recommendations.len() as u32;
    let total_pages = total.div_ceil(per_page);
    let items = catalog
        .recommendations
        .iter()
        .skip((page - 1).saturating_mul(per_page) as usize)
        .take(per_page as usize)
        .map(RecommendationView::from)
        .collect();

    Ok(Json(RecommendationListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    }))
}

pub async fn open_challenge(
    State(state): State<AppState>,
    payload: Option<Json<OpenChallengeRequest>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let session = state
        .pad
        .open_challenge(payload.recommendation_id.as_deref())?;
    Ok(Json(TransitionResponse {
        applied: true,
        session,
    }))
}

pub async fn refresh_challenge(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let applied = state.pad.refresh_challenge();
    Ok(transition(&state.pad, applied))
}

pub async fn close_challenge(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let applied = state.pad.close_challenge();
    Ok(transition(&state.pad, applied))
}

pub async fn list_activities(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state
        .pad
        .activities()
        .iter()
        .map(ActivitySummary::from)
        .collect();
    Ok(Json(ActivityListResponse { items }))
}

pub async fn preview_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.pad.select_activity(&id, SelectionIntent::Preview)?;
    Ok(transition(&state.pad, true))
}

pub async fn fill_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.pad.select_activity(&id, SelectionIntent::Fill)?;
    Ok(transition(&state.pad, true))
}

pub async fn get_preview(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.pad.preview()?))
}

pub async fn start_fill(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.pad.start_fill()?;
    Ok(transition(&state.pad, true))
}

pub async fn back(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let applied = state.pad.back();
    Ok(transition(&state.pad, applied))
}

pub async fn view_report(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.pad.view_report()?;
    Ok(transition(&state.pad, true))
}

pub async fn get_questionnaire(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.pad.questionnaire()?))
}

pub async fn select_option(
    State(state): State<AppState>,
    Json(payload): Json<SelectOptionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.pad.select_option(payload.question_id, &payload.option)?;
    Ok(Json(state.pad.questionnaire()?))
}

pub async fn next_question(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.pad.next_question()?;
    Ok(Json(state.pad.questionnaire()?))
}

pub async fn previous_question(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.pad.previous_question()?;
    Ok(Json(state.pad.questionnaire()?))
}

pub async fn submit_questionnaire(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let record = state.pad.submit_questionnaire()?;
    let catalog = state.pad.catalog();
    let record = ResultDetail::build(&record, catalog.questions_for_title(&record.activity_name));
    Ok(Json(SubmissionResponse {
        applied: true,
        record,
        session: state.pad.snapshot(),
    }))
}
