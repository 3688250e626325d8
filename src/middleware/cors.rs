use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The pad and phone front ends are served from other origins.
pub fn session_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
}
