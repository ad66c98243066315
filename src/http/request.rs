//! Request inspection helpers.
//!
//! # Responsibilities
//! - Resolve the client IP behind proxies (X-Forwarded-For chain)
//! - Extract common headers for analytics attribution
//!
//! # Design Decisions
//! - Forwarded headers win over the socket address so deployments
//!   behind a load balancer attribute traffic to the real client
//! - Callers pick their own fallback literal ("anonymous", "unknown")
//!   when no address can be resolved

use std::net::SocketAddr;

use axum::http::{header, HeaderMap};

/// Resolve the originating client IP.
///
/// Order: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
/// peer socket address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // The first entry in the chain is the original client.
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return Some(real_ip.to_string());
        }
    }

    remote.map(|addr| addr.ip().to_string())
}

/// User agent string, if the client sent one.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn remote() -> Option<SocketAddr> {
        Some("192.0.2.10:52100".parse().unwrap())
    }

    #[test]
    fn test_forwarded_chain_picks_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1, 10.0.0.2"),
        );

        assert_eq!(
            client_ip(&headers, remote()),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_real_ip_beats_socket_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.8"));

        assert_eq!(
            client_ip(&headers, remote()),
            Some("203.0.113.8".to_string())
        );
    }

    #[test]
    fn test_socket_address_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, remote()), Some("192.0.2.10".to_string()));
    }

    #[test]
    fn test_empty_forwarded_header_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));

        assert_eq!(client_ip(&headers, remote()), Some("192.0.2.10".to_string()));
    }

    #[test]
    fn test_no_information_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None), None);
    }
}
