//! Subscription endpoint handlers.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::DuplicatePolicy;
use crate::error::ApiError;
use crate::http::request::{client_ip, user_agent};
use crate::http::response::{SubscriptionAccepted, TotalSubscribers};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{StoreError, Subscriber, SubscriberStatus};
use crate::subscriptions::types::SubscribeRequest;
use crate::subscriptions::validate::parse_request;

const MSG_CREATED: &str =
    "Successfully subscribed! We'll keep you updated on course developments.";
const MSG_REACTIVATED: &str = "Welcome back! You've been resubscribed to our updates.";
const MSG_CONFIRMED: &str = "You're already subscribed! Thanks for your interest.";

const ERR_SUBSCRIBE: &str = "Failed to process subscription. Please try again.";
const ERR_STATS: &str = "Failed to fetch stats";

/// `POST /api/subscribe`: create, reactivate or confirm a subscriber.
pub async fn subscribe(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let settings = state.runtime.load();
    let mut new_subscriber = parse_request(request, &settings.subscriptions.default_source)
        .map_err(|errors| {
            metrics::record_subscription("invalid");
            ApiError::Validation(errors)
        })?;
    new_subscriber.ip_address = client_ip(&headers, Some(addr));
    new_subscriber.user_agent = user_agent(&headers);
    let policy = settings.subscriptions.duplicate_policy;

    // Fast path: most duplicate submissions are caught here without
    // touching the unique index.
    let existing = state
        .store
        .find_subscriber_by_email(&new_subscriber.email)
        .await
        .map_err(|e| subscribe_store_error("lookup", e))?;

    if let Some(existing) = existing {
        return respond_existing(&state, existing, &new_subscriber.source, policy).await;
    }

    match state.store.insert_subscriber(&new_subscriber).await {
        Ok(subscriber) => {
            tracing::info!(email = %subscriber.email, source = %subscriber.source, "Subscriber created");
            metrics::record_subscription("created");
            Ok((
                StatusCode::CREATED,
                Json(SubscriptionAccepted::new(MSG_CREATED, &subscriber)),
            )
                .into_response())
        }
        // Lost the insert race against a concurrent signup for the same
        // email. The winner's row resolves through the normal duplicate
        // path, so no caller ever sees the raw constraint violation.
        Err(StoreError::DuplicateEmail) => {
            let winner = state
                .store
                .find_subscriber_by_email(&new_subscriber.email)
                .await
                .map_err(|e| subscribe_store_error("race lookup", e))?;

            match winner {
                Some(existing) => {
                    respond_existing(&state, existing, &new_subscriber.source, policy).await
                }
                None => Err(ApiError::DuplicateEmail),
            }
        }
        Err(e) => Err(subscribe_store_error("insert", e)),
    }
}

/// `GET /api/subscribe`: number of active subscribers.
pub async fn subscription_stats(
    State(state): State<AppState>,
) -> Result<Json<TotalSubscribers>, ApiError> {
    let total_subscribers = state
        .store
        .count_active_subscribers()
        .await
        .map_err(|e| {
            metrics::record_store_error("count_active");
            ApiError::store(ERR_STATS, e)
        })?;

    Ok(Json(TotalSubscribers { total_subscribers }))
}

/// Resolve a submission whose email already has a row.
async fn respond_existing(
    state: &AppState,
    existing: Subscriber,
    source: &str,
    policy: DuplicatePolicy,
) -> Result<Response, ApiError> {
    match existing.status {
        SubscriberStatus::Unsubscribed => {
            let updated = state
                .store
                .reactivate_subscriber(&existing.email, source)
                .await
                .map_err(|e| subscribe_store_error("reactivate", e))?;

            tracing::info!(email = %updated.email, source = %source, "Subscriber reactivated");
            metrics::record_subscription("reactivated");
            Ok(Json(SubscriptionAccepted::new(MSG_REACTIVATED, &updated)).into_response())
        }
        SubscriberStatus::Active => match policy {
            DuplicatePolicy::Confirm => {
                metrics::record_subscription("confirmed");
                Ok(Json(SubscriptionAccepted::new(MSG_CONFIRMED, &existing)).into_response())
            }
            DuplicatePolicy::Conflict => {
                metrics::record_subscription("conflict");
                Err(ApiError::DuplicateEmail)
            }
        },
    }
}

fn subscribe_store_error(operation: &'static str, source: StoreError) -> ApiError {
    metrics::record_store_error(operation);
    ApiError::store(ERR_SUBSCRIBE, source)
}
