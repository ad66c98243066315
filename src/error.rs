//! API error taxonomy.
//!
//! Every handler failure funnels through [`ApiError`], which maps onto the
//! JSON shapes the endpoints promise: 400 with a field-error list, 409 for
//! duplicate emails under the strict policy, 429 with reset headers, and a
//! generic 500 that never leaks internal detail.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::security::rate_limit::RateLimitDecision;
use crate::store::StoreError;

/// A single field-level validation problem.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing request fields. Never retried by clients.
    #[error("invalid form data")]
    Validation(Vec<FieldError>),

    /// Duplicate email under the `conflict` policy.
    #[error("email already subscribed")]
    DuplicateEmail,

    /// Analytics payload without a usable event name.
    #[error("event name is required")]
    EventNameRequired,

    /// Fixed-window limiter rejected the request. Clients retry after
    /// the window resets.
    #[error("rate limit exceeded")]
    RateLimited(RateLimitDecision),

    /// Store failure surfaced as a generic 500. `public` is the only text
    /// the caller sees; the source is logged server-side.
    #[error("{public}")]
    Store {
        public: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wrap a store failure with the endpoint's public 500 message.
    pub fn store(public: &'static str, source: StoreError) -> Self {
        Self::Store { public, source }
    }
}

/// An unparseable body becomes a single `body` field error in the
/// standard validation shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "Request body has the wrong shape",
            JsonRejection::MissingJsonContentType(_) => "Expected application/json content type",
            _ => "Unable to read request body",
        };
        ApiError::Validation(vec![FieldError::new("body", message)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Invalid form data",
                    "errors": errors,
                })),
            )
                .into_response(),

            ApiError::DuplicateEmail => (
                StatusCode::CONFLICT,
                Json(json!({
                    "success": false,
                    "error": "This email is already subscribed.",
                })),
            )
                .into_response(),

            ApiError::EventNameRequired => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Event name is required",
                })),
            )
                .into_response(),

            ApiError::RateLimited(decision) => (
                StatusCode::TOO_MANY_REQUESTS,
                decision.headers(),
                Json(json!({
                    "error": "Too many requests. Please try again later.",
                    "resetTime": decision.reset_at,
                })),
            )
                .into_response(),

            ApiError::Store { public, source } => {
                tracing::error!(error = %source, "request failed on store access");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": public,
                    })),
                )
                    .into_response()
            }
        }
    }
}
