pub mod health;
pub mod pad;
pub mod phone;
pub mod report;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth::{require_agent, AuthState};
use crate::middleware::cors::session_cors;
use crate::middleware::rate_limit::{limit_surface, Surface, SurfaceLimiter};
use crate::AppState;

/// Full HTTP surface: health, the agent's pad API and the customer's phone API.
pub fn app_router(state: AppState, config: &Config) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let pad_api = Router::new()
        .route("/api/pad/session", get(pad::get_session))
        .route("/api/pad/recommendations", get(pad::list_recommendations))
        .route(
            "/api/pad/challenge",
            post(pad::open_challenge).delete(pad::close_challenge),
        )
        .route("/api/pad/challenge/refresh", post(pad::refresh_challenge))
        .route("/api/pad/activities", get(pad::list_activities))
        .route("/api/pad/activities/:id/preview", post(pad::preview_activity))
        .route("/api/pad/activities/:id/fill", post(pad::fill_activity))
        .route("/api/pad/preview", get(pad::get_preview))
        .route("/api/pad/preview/start", post(pad::start_fill))
        .route("/api/pad/back", post(pad::back))
        .route("/api/pad/report", post(pad::view_report))
        .route("/api/pad/questionnaire", get(pad::get_questionnaire))
        .route("/api/pad/questionnaire/select", post(pad::select_option))
        .route("/api/pad/questionnaire/next", post(pad::next_question))
        .route("/api/pad/questionnaire/prev", post(pad::previous_question))
        .route("/api/pad/questionnaire/submit", post(pad::submit_questionnaire))
        .route("/api/pad/results", get(report::list_results))
        .route("/api/pad/results/export", get(report::export_results))
        .route("/api/pad/results/:id", get(report::get_result))
        .layer(axum::middleware::from_fn_with_state(
            AuthState::new(&config.jwt_secret),
            require_agent,
        ))
        .layer(axum::middleware::from_fn_with_state(
            SurfaceLimiter::new(Surface::Pad, config.pad_rps),
            limit_surface,
        ));

    let phone_api = Router::new()
        .route("/api/phone/session", get(phone::get_session))
        .route("/api/phone/scan", post(phone::scan))
        .route("/api/phone/authorize", post(phone::authorize))
        .route("/api/phone/dismiss", post(phone::dismiss))
        .layer(axum::middleware::from_fn_with_state(
            SurfaceLimiter::new(Surface::Phone, config.public_rps),
            limit_surface,
        ));

    base_routes
        .merge(pad_api)
        .merge(phone_api)
        .with_state(state)
        .layer(session_cors())
        .layer(TraceLayer::new_for_http())
}
