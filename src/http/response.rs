//! Wire envelopes shared by the public endpoints.
//!
//! Field names are camelCase on the wire to match what the landing page
//! frontend expects.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::store::{Subscriber, SubscriberStatus};

/// Public projection of a subscriber row. Never exposes attribution
/// or profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberSummary {
    pub id: String,
    pub email: String,
    pub status: SubscriberStatus,
}

impl From<&Subscriber> for SubscriberSummary {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            id: subscriber.id.clone(),
            email: subscriber.email.clone(),
            status: subscriber.status,
        }
    }
}

/// Successful subscribe response: a human message plus the summary.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionAccepted {
    pub success: bool,
    pub message: &'static str,
    pub subscriber: SubscriberSummary,
}

impl SubscriptionAccepted {
    pub fn new(message: &'static str, subscriber: &Subscriber) -> Self {
        Self {
            success: true,
            message,
            subscriber: subscriber.into(),
        }
    }
}

/// `GET /api/subscribe` counter payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSubscribers {
    pub total_subscribers: i64,
}

/// `POST /api/analytics/page-view` acknowledgement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewAccepted {
    pub success: bool,
    pub page_view_id: String,
}

/// Success wrapper for read endpoints that nest their payload.
#[derive(Debug, Clone, Serialize)]
pub struct DataEnvelope<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Bare acknowledgement for fire-and-forget endpoints.
pub fn ack() -> Json<Value> {
    Json(json!({ "success": true }))
}
