//! Analytics endpoint handlers.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::analytics::events::{AnalyticsEvent, UtmParams};
use crate::error::ApiError;
use crate::http::request::{client_ip, user_agent};
use crate::http::response::{self, DataEnvelope, PageViewAccepted};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{Attribution, NewPageView, PageViewStats, Store};

const ERR_TRACK: &str = "Failed to track page view";
const ERR_RETRIEVE: &str = "Failed to retrieve analytics";

/// `POST /api/analytics`: typed event ingestion.
///
/// Persistence is best effort. Only a missing event name or an
/// unreadable body produce an error response.
pub async fn ingest_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let event = AnalyticsEvent::parse(&payload).map_err(|_| ApiError::EventNameRequired)?;

    // Deployment sits behind a proxy; the socket peer would be the
    // proxy itself, so only forwarded headers count here.
    let ip_address = client_ip(&headers, None).unwrap_or_else(|| "unknown".to_string());
    metrics::record_analytics_event(event.name());

    match &event {
        AnalyticsEvent::PageView(e) => {
            persist_view(
                &state.store,
                NewPageView {
                    page: e.url.clone().unwrap_or_else(|| "/".to_string()),
                    ip_address: Some(ip_address),
                    user_agent: e.user_agent.clone(),
                    referrer: e.referrer.clone(),
                    viewed_at: e.timestamp,
                    ..with_utm(&e.utm)
                },
            )
            .await;
        }
        AnalyticsEvent::EmailSignup(e) => {
            if let Some(email) = &e.email {
                attach_attribution(&state.store, email, e, &ip_address).await;
            }
            // Conversions are also counted as page views for funnels.
            persist_view(
                &state.store,
                NewPageView {
                    page: e.url.clone().unwrap_or_else(|| "/".to_string()),
                    ip_address: Some(ip_address),
                    user_agent: e.user_agent.clone(),
                    referrer: e.referrer.clone(),
                    viewed_at: e.timestamp,
                    ..with_utm(&e.utm)
                },
            )
            .await;
        }
        AnalyticsEvent::ChatbotInteraction(e) => {
            tracing::debug!(action = ?e.action, "Chatbot interaction");
            persist_view(
                &state.store,
                NewPageView {
                    page: "/chatbot-interaction".to_string(),
                    ip_address: Some(ip_address),
                    user_agent: e.user_agent.clone(),
                    viewed_at: e.timestamp,
                    ..Default::default()
                },
            )
            .await;
        }
        AnalyticsEvent::SectionView(e) => {
            tracing::debug!(
                section = ?e.section,
                time_spent_secs = ?e.time_spent_secs,
                "Section view"
            );
            persist_view(
                &state.store,
                NewPageView {
                    page: format!("/section/{}", e.section.as_deref().unwrap_or("unknown")),
                    ip_address: Some(ip_address),
                    user_agent: e.user_agent.clone(),
                    viewed_at: e.timestamp,
                    ..Default::default()
                },
            )
            .await;
        }
        AnalyticsEvent::Unknown(e) => {
            tracing::info!(event = %e.name, "Unknown analytics event");
        }
    }

    Ok(response::ack())
}

/// Dedicated page view beacon payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageViewPayload {
    pub page: Option<String>,
    pub referrer: Option<String>,
    pub utm_params: Option<RawUtmParams>,
    pub session_id: Option<String>,
}

/// UTM fields as the frontend beacon sends them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

/// `POST /api/analytics/page-view`: persist one page view row.
pub async fn track_page_view(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<PageViewPayload>, JsonRejection>,
) -> Result<Json<PageViewAccepted>, ApiError> {
    let Json(payload) = payload?;

    let ip_address = client_ip(&headers, Some(addr)).unwrap_or_else(|| "unknown".to_string());
    let user_agent = user_agent(&headers).unwrap_or_else(|| "unknown".to_string());
    let utm = payload.utm_params.unwrap_or_default();

    let view = NewPageView {
        page: payload.page.unwrap_or_else(|| "/".to_string()),
        ip_address: Some(ip_address),
        user_agent: Some(user_agent),
        referrer: payload.referrer,
        utm_source: utm.utm_source,
        utm_medium: utm.utm_medium,
        utm_campaign: utm.utm_campaign,
        utm_term: utm.utm_term,
        utm_content: utm.utm_content,
        session_id: payload.session_id,
        viewed_at: None,
    };

    let page_view_id = state.store.insert_page_view(&view).await.map_err(|e| {
        metrics::record_store_error("insert_page_view");
        ApiError::store(ERR_TRACK, e)
    })?;

    metrics::record_page_view();
    Ok(Json(PageViewAccepted {
        success: true,
        page_view_id,
    }))
}

/// Query string for the stats endpoint.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
    pub page: Option<String>,
}

fn default_days() -> u32 {
    7
}

/// `GET /api/analytics/page-view`: aggregate traffic stats.
pub async fn page_view_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DataEnvelope<PageViewStats>>, ApiError> {
    let stats = state
        .store
        .page_view_stats(query.days, query.page.as_deref())
        .await
        .map_err(|e| {
            metrics::record_store_error("page_view_stats");
            ApiError::store(ERR_RETRIEVE, e)
        })?;

    Ok(Json(DataEnvelope::new(stats)))
}

/// Insert a page view, logging instead of failing.
async fn persist_view(store: &Store, view: NewPageView) {
    match store.insert_page_view(&view).await {
        Ok(_) => metrics::record_page_view(),
        Err(e) => {
            metrics::record_store_error("insert_page_view");
            tracing::error!(error = %e, page = %view.page, "Failed to save page view");
        }
    }
}

/// Copy signup attribution onto an existing subscriber, best effort.
async fn attach_attribution(
    store: &Store,
    email: &str,
    event: &crate::analytics::events::EmailSignupEvent,
    ip_address: &str,
) {
    let known = match store.find_subscriber_by_email(email).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up subscriber for attribution");
            return;
        }
    };
    if !known {
        return;
    }

    let attribution = Attribution {
        ip_address: Some(ip_address.to_string()),
        user_agent: event.user_agent.clone(),
        utm_source: event.utm.source.clone(),
        utm_medium: event.utm.medium.clone(),
        utm_campaign: event.utm.campaign.clone(),
    };

    if let Err(e) = store.record_engagement(email, &attribution).await {
        metrics::record_store_error("record_engagement");
        tracing::error!(error = %e, "Failed to record subscriber engagement");
    }
}

/// Seed a page view template carrying only UTM fields.
fn with_utm(utm: &UtmParams) -> NewPageView {
    NewPageView {
        utm_source: utm.source.clone(),
        utm_medium: utm.medium.clone(),
        utm_campaign: utm.campaign.clone(),
        utm_term: utm.term.clone(),
        utm_content: utm.content.clone(),
        ..Default::default()
    }
}
