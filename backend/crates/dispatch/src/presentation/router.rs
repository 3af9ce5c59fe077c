//! Dispatch Router

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use platform::rate_limit::RateLimitStore;

use crate::application::dispatcher::{CommandDispatcher, DispatchStore, ProviderSet};
use crate::domain::principal::IdentityVerifier;
use crate::presentation::handlers::{self, DispatchAppState};
use crate::presentation::middleware::attach_principal;

/// Create the command router. Mount it under `/api`.
pub fn dispatch_router<S, P, L>(
    dispatcher: CommandDispatcher<S, P, L>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Router
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    let state = DispatchAppState { dispatcher };

    Router::new()
        .route(
            "/commands/{command}",
            post(handlers::dispatch_command::<S, P, L>),
        )
        .route_layer(from_fn_with_state(verifier, attach_principal))
        .route("/health", get(handlers::health))
        .with_state(state)
}
