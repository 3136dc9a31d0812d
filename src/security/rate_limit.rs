//! Fixed-window rate limiting per client key.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::security::client_ip::client_key;

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Request count for one client within the current window.
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

impl WindowCounter {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Increment first, then compare. Returns the count including this request.
    fn hit(&mut self, now: Instant, window: Duration) -> u32 {
        if now.duration_since(self.window_start) >= window {
            self.count = 0;
            self.window_start = now;
        }
        self.count = self.count.saturating_add(1);
        self.count
    }

    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { limit: u32, remaining: u32 },
    Rejected { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Shared per-process limiter state.
pub struct RateLimiter {
    counters: DashMap<String, WindowCounter>,
    enabled: bool,
    window: Duration,
    max_requests: u32,
    trusted_proxy_hops: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            counters: DashMap::new(),
            enabled: config.enabled,
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            trusted_proxy_hops: config.trusted_proxy_hops,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn trusted_proxy_hops(&self) -> usize {
        self.trusted_proxy_hops
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count one request from `key` at `now`.
    ///
    /// The counter is updated under the map's per-entry lock, so concurrent
    /// callers never both take the last slot.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed {
                limit: self.max_requests,
                remaining: self.max_requests,
            };
        }

        let mut counter = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| WindowCounter::new(now));
        let count = counter.hit(now, self.window);

        if count <= self.max_requests {
            RateDecision::Allowed {
                limit: self.max_requests,
                remaining: self.max_requests - count,
            }
        } else {
            let elapsed = now.duration_since(counter.window_start);
            RateDecision::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }

    /// Drop counters whose window has elapsed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.counters.len();
        self.counters
            .retain(|_, counter| !counter.expired(now, self.window));
        before - self.counters.len()
    }

    /// Number of tracked client keys.
    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }
}

/// Middleware: first stage of the pipeline. Rejected requests never reach
/// any later stage.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(peer, request.headers(), limiter.trusted_proxy_hops());

    match limiter.check(&key) {
        RateDecision::Allowed { limit, remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            Ok(response)
        }
        RateDecision::Rejected { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            metrics::record_rate_limited();
            Err(ApiError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            })
        }
    }
}
