//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, State};

use platform::rate_limit::RateLimitStore;

use crate::application::dispatcher::{CommandDispatcher, DispatchStore, ProviderSet};
use crate::domain::value_object::CommandType;
use crate::error::DispatchResult;
use crate::presentation::dto::{CommandResponse, HealthResponse};
use crate::presentation::middleware::CallerIdentity;

/// Shared state for dispatch handlers
pub struct DispatchAppState<S, P, L>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub dispatcher: CommandDispatcher<S, P, L>,
}

impl<S, P, L> Clone for DispatchAppState<S, P, L>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// POST /api/commands/{command}
pub async fn dispatch_command<S, P, L>(
    State(state): State<DispatchAppState<S, P, L>>,
    Path(command): Path<String>,
    Extension(caller): Extension<CallerIdentity>,
    body: Bytes,
) -> DispatchResult<Json<CommandResponse>>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    let command: CommandType = command.parse()?;

    let output = state
        .dispatcher
        .dispatch_body(caller.0.as_ref(), command, &body)
        .await?;

    Ok(Json(output.into()))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
