//! Health probe handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::http::server::AppState;
use crate::store::StoreError;

/// Body of a health report.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: HealthData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<i64>,
    pub environment: &'static str,
    pub has_database: bool,
}

/// `GET /health/db`: verify database connectivity with a real query.
pub async fn database_health(State(state): State<AppState>) -> Response {
    let environment = state.config.environment.as_str();

    match probe(&state).await {
        Ok(subscriber_count) => {
            let report = HealthReport {
                status: "healthy",
                message: "Database connected successfully",
                timestamp: Utc::now().to_rfc3339(),
                error: None,
                data: HealthData {
                    subscriber_count: Some(subscriber_count),
                    environment,
                    has_database: true,
                },
            };
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            // Raw driver errors can leak file paths, so production
            // gets a generic string.
            let detail = if state.config.environment.is_production() {
                "Database error".to_string()
            } else {
                e.to_string()
            };
            let report = HealthReport {
                status: "unhealthy",
                message: "Database connection failed",
                timestamp: Utc::now().to_rfc3339(),
                error: Some(detail),
                data: HealthData {
                    subscriber_count: None,
                    environment,
                    has_database: false,
                },
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(report)).into_response()
        }
    }
}

/// `HEAD /health/db`: process liveness only, no database access.
pub async fn database_health_head() -> StatusCode {
    StatusCode::OK
}

/// A trivial query plus a count, so a missing or locked table shows
/// up as unhealthy rather than just a reachable file.
async fn probe(state: &AppState) -> Result<i64, StoreError> {
    state.store.ping().await?;
    state.store.count_subscribers().await
}
