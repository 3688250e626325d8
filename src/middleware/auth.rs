use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const AGENT_ROLE: &str = "agent";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Verification key shared by the protected routes.
#[derive(Clone)]
pub struct AuthState {
    key: Arc<DecodingKey>,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        }
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_token(req: &Request) -> std::result::Result<&str, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"))
}

pub async fn require_roles(
    state: &AuthState,
    mut req: Request,
    next: Next,
    allowed: &[&str],
) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(token, &state.key, &validation) {
        Ok(data) => {
            let role = data.claims.role.clone().unwrap_or_default();
            if !allowed.is_empty() && !allowed.iter().any(|r| r.eq_ignore_ascii_case(&role)) {
                tracing::warn!(sub = %data.claims.sub, %role, "pad request with insufficient role");
                return reject(StatusCode::FORBIDDEN, "forbidden");
            }
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected");
            reject(StatusCode::UNAUTHORIZED, "invalid_token")
        }
    }
}

/// Guards the agent's pad routes.
pub async fn require_agent(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[AGENT_ROLE]).await
}
