//! Client-side HTTP helpers
//!
//! Inbound: reading the caller's bearer token and address from headers.
//! Outbound: building the shared `reqwest` client used by provider adapters.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;
use std::time::Duration;

/// Error building the outbound HTTP client
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Build the outbound client shared by all provider adapters.
///
/// Every request made through it is bounded by `timeout`; expiry surfaces as a
/// `reqwest::Error` with `is_timeout() == true`.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, HttpClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Empty tokens are treated as absent.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For first (reverse proxy setups), then falls back to
/// the direct connection address.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
