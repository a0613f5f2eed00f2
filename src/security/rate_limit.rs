//! Sliding-key, fixed-window rate limiting middleware.
//!
//! # Responsibilities
//! - Enforce the general per-signature request budget (default 60/min)
//! - Attach X-RateLimit-* headers to allowed responses
//! - Emit 429 with `retry_after` when the budget is exhausted
//!
//! # Design Decisions
//! - Fixed window: the TTL is set at the first increment of a window and never
//!   refreshed, so a steady drip of requests cannot hold a window open forever.
//! - Increment-then-check against the atomic counter store; there is no
//!   separate read so concurrent bursts cannot all observe a stale count.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::response::PipelineError;
use crate::observability::metrics;
use crate::security::signature::{self, request_signature};
use crate::security::store::CounterStore;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        limit: u64,
        remaining: u64,
        resets_at: u64,
    },
    Limited {
        retry_after: u64,
        /// Observed hits in the window, including the rejected one.
        count: u64,
    },
}

/// Policy-free limiter over an injected counter store.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Count a hit for `signature` and decide whether it may proceed.
    ///
    /// The counter keeps growing past the limit; over-limit hits are still
    /// recorded so the window reflects actual pressure.
    pub fn check_and_increment(
        &self,
        signature: &str,
        max_attempts: u64,
        decay_window: Duration,
    ) -> RateDecision {
        let window = self.store.increment(signature, decay_window);
        if window.count > max_attempts {
            RateDecision::Limited {
                retry_after: decay_window.as_secs(),
                count: window.count,
            }
        } else {
            RateDecision::Allowed {
                limit: max_attempts,
                remaining: max_attempts.saturating_sub(window.count),
                resets_at: window.resets_at,
            }
        }
    }
}

/// State for the general API rate-limit middleware.
pub struct RateLimiterState {
    pub limiter: RateLimiter,
    pub policy: RateLimitConfig,
}

/// Middleware enforcing the general API budget per request signature.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let sig = request_signature(&request, &addr);
    let decision = state.limiter.check_and_increment(
        &sig,
        state.policy.max_requests,
        Duration::from_secs(state.policy.window_secs),
    );

    match decision {
        RateDecision::Allowed {
            limit,
            remaining,
            resets_at,
        } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", numeric_header(limit));
            headers.insert("x-ratelimit-remaining", numeric_header(remaining));
            headers.insert("x-ratelimit-reset", numeric_header(resets_at));
            response
        }
        RateDecision::Limited { retry_after, count } => {
            tracing::warn!(
                signature = %sig,
                ip = %addr.ip(),
                user_agent = signature::user_agent(&request),
                path = request.uri().path(),
                count,
                max_requests = state.policy.max_requests,
                "Rate limit exceeded"
            );
            metrics::record_rejection("rate_limit");
            PipelineError::RateLimited { retry_after }.into_response()
        }
    }
}

pub(crate) fn numeric_header(value: u64) -> HeaderValue {
    // Decimal digits are always a valid header value.
    HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::store::InMemoryCounterStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(InMemoryCounterStore::new()))
    }

    #[test]
    fn test_limited_after_max_attempts() {
        let limiter = limiter();
        let window = Duration::from_secs(60);

        for i in 0..3 {
            let decision = limiter.check_and_increment("sig", 3, window);
            match decision {
                RateDecision::Allowed { remaining, .. } => {
                    assert_eq!(remaining, 3 - i - 1);
                }
                RateDecision::Limited { .. } => panic!("hit {} should be allowed", i),
            }
        }

        // The rejected hit is still counted.
        assert_eq!(
            limiter.check_and_increment("sig", 3, window),
            RateDecision::Limited {
                retry_after: 60,
                count: 4,
            }
        );
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let limiter = limiter();
        let window = Duration::from_millis(30);

        assert!(matches!(
            limiter.check_and_increment("sig", 1, window),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_and_increment("sig", 1, window),
            RateDecision::Limited { .. }
        ));

        std::thread::sleep(Duration::from_millis(50));
        match limiter.check_and_increment("sig", 1, window) {
            RateDecision::Allowed { remaining, .. } => assert_eq!(remaining, 0),
            RateDecision::Limited { .. } => panic!("fresh window should allow"),
        }
    }

    #[test]
    fn test_signatures_bucket_independently() {
        let limiter = limiter();
        let window = Duration::from_secs(60);

        assert!(matches!(
            limiter.check_and_increment("a", 1, window),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_and_increment("b", 1, window),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_and_increment("a", 1, window),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_concurrent_burst_admits_exactly_limit() {
        let limiter = Arc::new(limiter());
        let window = Duration::from_secs(60);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    matches!(
                        limiter.check_and_increment("burst", 1, window),
                        RateDecision::Allowed { .. }
                    )
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&allowed| allowed)
            .count();
        assert_eq!(admitted, 1, "exactly one concurrent hit may pass a 1/window limit");
    }
}
