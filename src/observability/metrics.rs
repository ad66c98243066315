//! Metrics collection and exposition.
//!
//! # Metrics
//! - `waitlist_http_requests_total` (counter): requests by method, route, status
//! - `waitlist_http_request_duration_seconds` (histogram): latency by route
//! - `waitlist_subscriptions_total` (counter): signup outcomes by kind
//! - `waitlist_rate_limited_total` (counter): 429s by route
//! - `waitlist_rate_limit_tracked_keys` (gauge): live limiter buckets
//! - `waitlist_analytics_events_total` (counter): events by type
//! - `waitlist_page_views_recorded_total` (counter): persisted views
//! - `waitlist_store_errors_total` (counter): store failures by operation
//!
//! # Design Decisions
//! - Helpers take plain strings so call sites stay one-liners
//! - Recording before the exporter is installed is a silent no-op,
//!   which keeps unit tests free of metrics setup
//! - Request metrics label the route template, never the raw path, so
//!   cardinality stays bounded

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!("Failed to install metrics exporter: {}", e),
    }
}

/// Middleware recording one counter tick and one latency sample per
/// request.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    counter!(
        "waitlist_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    histogram!(
        "waitlist_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Record a subscription outcome: created, reactivated, confirmed,
/// conflict or invalid.
pub fn record_subscription(outcome: &str) {
    counter!("waitlist_subscriptions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a rejected request on a rate limited route.
pub fn record_rate_limited(route: &str) {
    counter!("waitlist_rate_limited_total", "route" => route.to_string()).increment(1);
}

/// Record the current number of live limiter buckets.
pub fn record_rate_limit_tracked_keys(count: usize) {
    gauge!("waitlist_rate_limit_tracked_keys").set(count as f64);
}

/// Record an accepted analytics event by type.
pub fn record_analytics_event(event: &str) {
    counter!("waitlist_analytics_events_total", "event" => event.to_string()).increment(1);
}

/// Record one persisted page view row.
pub fn record_page_view() {
    counter!("waitlist_page_views_recorded_total").increment(1);
}

/// Record a store failure tagged with the failing operation.
pub fn record_store_error(operation: &'static str) {
    counter!("waitlist_store_errors_total", "operation" => operation).increment(1);
}
