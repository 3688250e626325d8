use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

const WINDOW: Duration = Duration::from_secs(1);

/// Which device a request budget belongs to. The pad and the phone poll
/// independently, so one flooding the server must not starve the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Pad,
    Phone,
}

impl Surface {
    pub fn label(self) -> &'static str {
        match self {
            Surface::Pad => "pad",
            Surface::Phone => "phone",
        }
    }
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    admitted: u32,
}

/// Fixed one-second request budget for a single surface.
#[derive(Clone, Debug)]
pub struct SurfaceLimiter {
    surface: Surface,
    per_second: u32,
    window: Arc<Mutex<Window>>,
}

impl SurfaceLimiter {
    pub fn new(surface: Surface, per_second: u32) -> Self {
        Self {
            surface,
            per_second: per_second.max(1),
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                admitted: 0,
            })),
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn per_second(&self) -> u32 {
        self.per_second
    }

    /// Admits one request at `now`, or returns how long until the window resets.
    fn admit(&self, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let elapsed = now.saturating_duration_since(window.opened_at);
        if elapsed >= WINDOW {
            window.opened_at = now;
            window.admitted = 0;
        }
        if window.admitted >= self.per_second {
            return Err(WINDOW.saturating_sub(now.saturating_duration_since(window.opened_at)));
        }
        window.admitted += 1;
        Ok(())
    }

    fn rejection(&self, retry_in: Duration) -> Response {
        let mut response = Error::RateLimited {
            surface: self.surface.label(),
            limit: self.per_second,
        }
        .into_response();
        // Whole seconds, rounded up so clients never retry inside the window.
        let retry_secs = retry_in.as_millis().div_ceil(1000).max(1) as u64;
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
        response
    }
}

pub async fn limit_surface(
    State(limiter): State<SurfaceLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Err(retry_in) = limiter.admit(Instant::now()) {
        tracing::warn!(
            surface = limiter.surface.label(),
            limit = limiter.per_second,
            retry_ms = retry_in.as_millis() as u64,
            path = %req.uri().path(),
            "request budget exhausted"
        );
        return limiter.rejection(retry_in);
    }
    next.run(req).await
}
