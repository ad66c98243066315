//! Wire types for the subscription endpoint.

use serde::Deserialize;

/// Raw subscribe payload as the frontend sends it.
///
/// Everything is optional at the deserialization layer; requiredness and
/// enum membership are enforced in `validate.rs` so a bad field produces
/// a field error instead of an opaque body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    /// Combined name; split when the explicit fields are absent.
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub experience_level: Option<String>,
    pub interests: Option<Vec<String>>,
    pub source: Option<String>,
    pub referral_source: Option<String>,
    pub referral_medium: Option<String>,
    pub referral_campaign: Option<String>,
}

/// Split a combined name on the first whitespace boundary.
///
/// The first token becomes the first name; remaining tokens are joined
/// into the last name. A single-token name has no last name.
pub fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().map(|s| s.to_string());
    let rest: Vec<&str> = tokens.collect();
    let last = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };
    (first, last)
}
