//! Admin API rate limiting.
//!
//! The ingest/settle operations fan out to the upstream feed, so a runaway
//! scheduler hammering the admin surface would hammer the feed too. One
//! global in-memory limiter in front of the router keeps that bounded.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Global rate limiter shared by every admin route
pub type AdminRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build the admin limiter from the configured requests-per-minute budget.
/// A zero budget falls back to one request per minute rather than panicking
/// on a bad env var.
pub fn admin_rate_limiter(requests_per_minute: u32) -> AdminRateLimiter {
    let per_minute =
        NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::new(1).unwrap());
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Middleware applying the limiter to a request.
pub async fn rate_limit_middleware(
    limiter: AdminRateLimiter,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Admin rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.",
            )
                .into_response()
        }
    }
}
