//! Fixed-window rate limiting keyed by client IP and route path.
//!
//! Each `(client, route)` pair owns a counter that resets `window_ms`
//! after the first request of the window. Once a window has returned a
//! rejection its count stops growing, so `count` never exceeds `limit`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::error::ApiError;
use crate::http::request::client_ip;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Identifies one rate-limit bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    client: String,
    route: String,
}

impl RateLimitKey {
    pub fn new(client: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            route: route.into(),
        }
    }
}

/// Counter state for one window.
#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at_ms: i64,
}

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Window expiry as epoch milliseconds. Returned to clients both in
    /// the 429 body (`resetTime`) and the `X-RateLimit-Reset` header.
    pub reset_at: i64,
}

impl RateLimitDecision {
    /// Header triple advertised on every limited route.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.to_string()),
        ]
    }
}

/// A thread-safe fixed-window limiter.
///
/// Cloning is cheap; all clones share one window map.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<DashMap<RateLimitKey, WindowEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Check and count one request against the window for `key`.
    ///
    /// The entry guard serializes access per key, so two concurrent
    /// requests can never both observe `count < limit` and both slip
    /// past it. A `limit` of zero rejects every request.
    pub fn check(&self, key: RateLimitKey, limit: u32, window_ms: u64) -> RateLimitDecision {
        let now_ms = Utc::now().timestamp_millis();

        let mut entry = self.windows.entry(key).or_insert_with(|| WindowEntry {
            count: 0,
            reset_at_ms: now_ms + window_ms as i64,
        });

        // Window expired: start a fresh one.
        if now_ms > entry.reset_at_ms {
            entry.count = 0;
            entry.reset_at_ms = now_ms + window_ms as i64;
        }

        if entry.count >= limit {
            return RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_at: entry.reset_at_ms,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit - entry.count,
            reset_at: entry.reset_at_ms,
        }
    }

    /// Drop entries whose window has expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now_ms = Utc::now().timestamp_millis();
        let before = self.windows.len();
        self.windows.retain(|_, entry| entry.reset_at_ms >= now_ms);
        before.saturating_sub(self.windows.len())
    }

    /// Number of live buckets. Exposed for the admin status view.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Periodically sweep expired windows until shutdown.
    pub async fn run_sweeper(self, interval_secs: u64, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = interval_secs, "Rate limit sweeper starting");

        let mut ticker = time::interval(Duration::from_secs(interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, tracked = self.tracked_keys(), "Swept expired rate limit windows");
                    }
                    metrics::record_rate_limit_tracked_keys(self.tracked_keys());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Middleware gating the subscription endpoint.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let settings = state.runtime.load();
    if !settings.rate_limit.enabled {
        return next.run(request).await;
    }

    let client =
        client_ip(request.headers(), Some(addr)).unwrap_or_else(|| "anonymous".to_string());
    let route = request.uri().path().to_string();

    let decision = state.limiter.check(
        RateLimitKey::new(client.clone(), route.clone()),
        settings.rate_limit.limit,
        settings.rate_limit.window_ms,
    );

    if !decision.allowed {
        tracing::warn!(client = %client, route = %route, "Rate limit exceeded");
        metrics::record_rate_limited(&route);
        return ApiError::RateLimited(decision).into_response();
    }

    let mut response = next.run(request).await;
    for (name, value) in decision.headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_str()),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}
