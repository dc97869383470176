use std::num::NonZeroU32;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;

use crate::AppState;
use crate::config::ResilienceConfig;

/// Global token bucket for the generation routes.
///
/// Not keyed by client address: one bucket is shared by every caller.
pub struct GenerationLimiter {
    inner: DefaultDirectRateLimiter,
}

impl std::fmt::Debug for GenerationLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationLimiter").finish_non_exhaustive()
    }
}

impl GenerationLimiter {
    #[must_use]
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(burst_size).unwrap_or(rate);
        Self {
            inner: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
        }
    }

    #[must_use]
    pub fn from_config(cfg: &ResilienceConfig) -> Self {
        Self::new(cfg.requests_per_second, cfg.burst_size)
    }

    /// Take one token. `false` means the caller should be rejected.
    pub fn check(&self) -> bool {
        self.inner.check().is_ok()
    }
}

/// Reject with 429 once the bucket is empty.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = GenerationLimiter::new(1, 3);

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[test]
    fn test_zero_values_fall_back_to_one() {
        let limiter = GenerationLimiter::new(0, 0);
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
