//! Subscribe payload validation.
//!
//! Produces either a [`NewSubscriber`] ready for the store or a list of
//! field errors covering every problem at once, so the frontend can
//! annotate the whole form in one round trip.

use crate::error::FieldError;
use crate::store::{ExperienceLevel, NewSubscriber};
use crate::subscriptions::types::{split_name, SubscribeRequest};

/// Pragmatic email grammar check: one `@`, non-empty local part, a
/// dotted domain, no whitespace. Deliverability is not our problem.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    true
}

/// Validate a raw subscribe payload into a [`NewSubscriber`].
///
/// `default_source` is applied when the payload has no (or a blank)
/// `source`. All field problems are collected before returning.
pub fn parse_request(
    request: SubscribeRequest,
    default_source: &str,
) -> Result<NewSubscriber, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = match request.email.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("email", "Email is required"));
            String::new()
        }
        Some(raw) => {
            if !is_valid_email(raw) {
                errors.push(FieldError::new("email", "Invalid email address"));
            }
            raw.to_string()
        }
    };

    let experience_level = match request.experience_level.as_deref() {
        None | Some("") => None,
        Some(raw) => match serde_json::from_value::<ExperienceLevel>(raw.into()) {
            Ok(level) => Some(level),
            Err(_) => {
                errors.push(FieldError::new(
                    "experienceLevel",
                    "Invalid experience level",
                ));
                None
            }
        },
    };

    // Explicit first/last fields win over the combined name.
    let (first_name, last_name) = match (request.first_name, request.last_name) {
        (None, None) => match request.name.as_deref() {
            Some(name) => split_name(name),
            None => (None, None),
        },
        (first, last) => (
            first.filter(|s| !s.trim().is_empty()),
            last.filter(|s| !s.trim().is_empty()),
        ),
    };

    let source = match request.source.as_deref().map(str::trim) {
        None | Some("") => default_source.to_string(),
        Some(source) => source.to_string(),
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewSubscriber {
        email,
        first_name,
        last_name,
        company: request.company.filter(|s| !s.trim().is_empty()),
        experience_level,
        interests: request.interests.unwrap_or_default(),
        source,
        // Transport-level attribution is filled in by the handler.
        ip_address: None,
        user_agent: None,
        referral_source: request.referral_source,
        referral_medium: request.referral_medium,
        referral_campaign: request.referral_campaign,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str) -> SubscribeRequest {
        SubscribeRequest {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_email_grammar() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));

        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.example.com"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_minimal_payload_gets_default_source() {
        let parsed = parse_request(request("a@example.com"), "landing_page").unwrap();
        assert_eq!(parsed.email, "a@example.com");
        assert_eq!(parsed.source, "landing_page");
        assert!(parsed.first_name.is_none());
        assert!(parsed.interests.is_empty());
    }

    #[test]
    fn test_missing_email_is_a_field_error() {
        let errors = parse_request(SubscribeRequest::default(), "landing_page").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn test_invalid_email_and_level_collected_together() {
        let mut bad = request("not-an-email");
        bad.experience_level = Some("WIZARD".to_string());

        let errors = parse_request(bad, "landing_page").unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "experienceLevel"]);
    }

    #[test]
    fn test_combined_name_is_split() {
        let mut req = request("a@example.com");
        req.name = Some("John Ronald Tolkien".to_string());

        let parsed = parse_request(req, "landing_page").unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("John"));
        assert_eq!(parsed.last_name.as_deref(), Some("Ronald Tolkien"));
    }

    #[test]
    fn test_explicit_name_fields_win_over_combined() {
        let mut req = request("a@example.com");
        req.name = Some("Wrong Person".to_string());
        req.first_name = Some("Jane".to_string());
        req.last_name = Some("Smith".to_string());

        let parsed = parse_request(req, "landing_page").unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Jane"));
        assert_eq!(parsed.last_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_valid_experience_level_parses() {
        let mut req = request("a@example.com");
        req.experience_level = Some("SOME_AI_TECH_EXPERIENCE".to_string());

        let parsed = parse_request(req, "landing_page").unwrap();
        assert_eq!(
            parsed.experience_level,
            Some(ExperienceLevel::SomeAiTechExperience)
        );
    }

    #[test]
    fn test_explicit_source_is_kept() {
        let mut req = request("a@example.com");
        req.source = Some("social_media".to_string());

        let parsed = parse_request(req, "landing_page").unwrap();
        assert_eq!(parsed.source, "social_media");
    }
}
