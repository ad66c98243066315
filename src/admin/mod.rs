//! Operator endpoints.
//!
//! Mounted only when `admin.enabled` is set. Every route requires the
//! configured API key as a bearer token; there are no per-user
//! accounts. These endpoints exist for the CLI and for manual
//! inspection, not for the public frontend.

pub mod auth;
pub mod handlers;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::http::server::AppState;

use self::auth::require_api_key;
use self::handlers::{admin_analytics, admin_status, admin_subscribers};

pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(admin_status))
        .route("/admin/subscribers", get(admin_subscribers))
        .route("/admin/analytics", get(admin_analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .with_state(state)
}
