//! Analytics event model.
//!
//! The wire format is `{ "event": string, "properties": object }`. Each
//! known event name maps onto one variant with an explicit field set;
//! anything else becomes [`AnalyticsEvent::Unknown`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use url::Url;

/// UTM attribution extracted from a page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmParams {
    /// Pull `utm_*` query parameters out of a full page URL.
    ///
    /// A URL that does not parse yields empty attribution; the page view
    /// is still worth keeping.
    pub fn from_url(raw: &str) -> Self {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %raw, "Failed to parse URL for UTM parameters: {}", e);
                return Self::default();
            }
        };

        let mut utm = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "utm_source" => utm.source = Some(value.into_owned()),
                "utm_medium" => utm.medium = Some(value.into_owned()),
                "utm_campaign" => utm.campaign = Some(value.into_owned()),
                "utm_term" => utm.term = Some(value.into_owned()),
                "utm_content" => utm.content = Some(value.into_owned()),
                _ => {}
            }
        }
        utm
    }
}

/// Payload had no usable `event` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingEventName;

/// A full page load or client-side navigation.
#[derive(Debug, Clone, Default)]
pub struct PageViewEvent {
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub utm: UtmParams,
}

/// A signup conversion, fired under two historical names.
#[derive(Debug, Clone)]
pub struct EmailSignupEvent {
    /// `email_signup` or its alias `waitlist_join`.
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub utm: UtmParams,
}

/// Interaction with the pricing chatbot widget.
#[derive(Debug, Clone, Default)]
pub struct ChatbotInteractionEvent {
    pub action: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A landing page section scrolled into view.
#[derive(Debug, Clone, Default)]
pub struct SectionViewEvent {
    pub section: Option<String>,
    pub time_spent_secs: Option<f64>,
    pub user_agent: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// An event name this build does not know about.
#[derive(Debug, Clone)]
pub struct UnknownEvent {
    pub name: String,
}

/// Tagged union over all accepted analytics events.
#[derive(Debug, Clone)]
pub enum AnalyticsEvent {
    PageView(PageViewEvent),
    EmailSignup(EmailSignupEvent),
    ChatbotInteraction(ChatbotInteractionEvent),
    SectionView(SectionViewEvent),
    Unknown(UnknownEvent),
}

impl AnalyticsEvent {
    /// Parse the `{event, properties}` wire shape.
    pub fn parse(payload: &Value) -> Result<Self, MissingEventName> {
        let name = match payload.get("event").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(MissingEventName),
        };

        let empty = Value::Null;
        let props = payload.get("properties").unwrap_or(&empty);

        let url = get_str(props, "url");
        let utm = url.as_deref().map(UtmParams::from_url).unwrap_or_default();

        let event = match name {
            "page_view" => AnalyticsEvent::PageView(PageViewEvent {
                url,
                user_agent: get_str(props, "userAgent"),
                referrer: get_str(props, "referrer"),
                timestamp: get_timestamp(props),
                utm,
            }),
            "email_signup" | "waitlist_join" => AnalyticsEvent::EmailSignup(EmailSignupEvent {
                name: name.to_string(),
                email: get_str(props, "email"),
                url,
                user_agent: get_str(props, "userAgent"),
                referrer: get_str(props, "referrer"),
                timestamp: get_timestamp(props),
                utm,
            }),
            "chatbot_interaction" => AnalyticsEvent::ChatbotInteraction(ChatbotInteractionEvent {
                action: get_str(props, "action"),
                user_agent: get_str(props, "userAgent"),
                timestamp: get_timestamp(props),
            }),
            "section_view" => AnalyticsEvent::SectionView(SectionViewEvent {
                section: get_str(props, "section"),
                time_spent_secs: props.get("timeSpent").and_then(Value::as_f64),
                user_agent: get_str(props, "userAgent"),
                timestamp: get_timestamp(props),
            }),
            _ => AnalyticsEvent::Unknown(UnknownEvent {
                name: name.to_string(),
            }),
        };

        Ok(event)
    }

    /// The wire name of this event, for logs and metrics.
    pub fn name(&self) -> &str {
        match self {
            AnalyticsEvent::PageView(_) => "page_view",
            AnalyticsEvent::EmailSignup(e) => &e.name,
            AnalyticsEvent::ChatbotInteraction(_) => "chatbot_interaction",
            AnalyticsEvent::SectionView(_) => "section_view",
            AnalyticsEvent::Unknown(_) => "unknown",
        }
    }
}

fn get_str(props: &Value, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Client timestamps arrive either as RFC 3339 strings or epoch millis.
fn get_timestamp(props: &Value) -> Option<DateTime<Utc>> {
    match props.get("timestamp") {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
