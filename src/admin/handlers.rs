//! Admin route handlers.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::http::server::AppState;
use crate::store::{PageViewStats, Subscriber, SubscriberStatus};

const ERR_ADMIN: &str = "Failed to fetch admin data";
const RECENT_LIMIT: u32 = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub environment: &'static str,
    pub rate_limit_tracked_keys: usize,
    pub total_page_views: i64,
}

pub async fn admin_status(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    let total_page_views = state
        .store
        .count_page_views()
        .await
        .map_err(|e| ApiError::store(ERR_ADMIN, e))?;

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.as_str(),
        rate_limit_tracked_keys: state.limiter.tracked_keys(),
        total_page_views,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberOverview {
    pub total: i64,
    pub active: i64,
    pub unsubscribed: i64,
    pub recent: Vec<RecentSubscriber>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSubscriber {
    pub email: String,
    pub status: SubscriberStatus,
    pub source: String,
    pub signup_date: DateTime<Utc>,
}

impl From<Subscriber> for RecentSubscriber {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            email: subscriber.email,
            status: subscriber.status,
            source: subscriber.source,
            signup_date: subscriber.signup_date,
        }
    }
}

pub async fn admin_subscribers(
    State(state): State<AppState>,
) -> Result<Json<SubscriberOverview>, ApiError> {
    let total = state
        .store
        .count_subscribers()
        .await
        .map_err(|e| ApiError::store(ERR_ADMIN, e))?;
    let active = state
        .store
        .count_active_subscribers()
        .await
        .map_err(|e| ApiError::store(ERR_ADMIN, e))?;
    let recent = state
        .store
        .recent_subscribers(RECENT_LIMIT)
        .await
        .map_err(|e| ApiError::store(ERR_ADMIN, e))?;

    Ok(Json(SubscriberOverview {
        total,
        active,
        unsubscribed: total - active,
        recent: recent.into_iter().map(Into::into).collect(),
    }))
}

pub async fn admin_analytics(
    State(state): State<AppState>,
) -> Result<Json<PageViewStats>, ApiError> {
    let stats = state
        .store
        .page_view_stats(7, None)
        .await
        .map_err(|e| ApiError::store(ERR_ADMIN, e))?;

    Ok(Json(stats))
}
