//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no knowledge of commands:
//! - Sliding-window rate limiting
//! - HMAC-SHA256 and base64 helpers (bearer token signing)
//! - Outbound HTTP client construction and request header helpers

pub mod client;
pub mod crypto;
pub mod rate_limit;
