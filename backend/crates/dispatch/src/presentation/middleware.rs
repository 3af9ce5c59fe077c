//! Principal Middleware
//!
//! Resolves the bearer token (if any) into a [`Principal`] and stores it in
//! the request extensions. Never rejects: commands decide for themselves
//! whether a principal is required.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::{extract_bearer_token, extract_client_ip};

use crate::domain::principal::{IdentityVerifier, Principal};

/// Caller resolved for this request; `None` when unauthenticated
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity(pub Option<Principal>);

pub async fn attach_principal(
    State(verifier): State<Arc<dyn IdentityVerifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let principal = extract_bearer_token(req.headers()).and_then(|token| verifier.verify(token));

    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(req.headers(), direct_ip);

    tracing::debug!(
        client_ip = ?client_ip,
        principal_id = principal.as_ref().map(|p| p.id.as_str()).unwrap_or("-"),
        "Resolved caller"
    );

    req.extensions_mut().insert(CallerIdentity(principal));
    next.run(req).await
}
