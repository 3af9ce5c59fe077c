//! Command Dispatcher
//!
//! Entry point for every command. Drives one invocation through
//! `Received → Authenticated → Validated → RateChecked → ProviderCalled →
//! Audited → Completed`, stopping at the first failure, and writes exactly one
//! audit record per authenticated attempt.

use std::sync::Arc;

use derive_more::Display;
use serde::Serialize;
use serde_json::{Value, json};

use platform::rate_limit::RateLimitStore;

use crate::application::config::DispatchConfig;
use crate::application::email_history::{EmailHistoryEntry, EmailHistoryUseCase};
use crate::application::get_directions::{DirectionsOutput, GetDirectionsUseCase};
use crate::application::search_locations::{LocationResult, SearchLocationsUseCase};
use crate::application::search_places::{PlaceResult, SearchPlacesUseCase};
use crate::application::send_email::SendEmailUseCase;
use crate::domain::entity::audit_record::AuditRecord;
use crate::domain::principal::Principal;
use crate::domain::provider::{
    DirectionsProvider, EmailProvider, GeocodingProvider, PlacesProvider,
};
use crate::domain::repository::{AuditLog, ProfileRepository};
use crate::domain::validation::{
    parse_payload, validate_directions, validate_email, validate_search,
};
use crate::domain::value_object::CommandType;
use crate::error::{DispatchError, DispatchResult};

/// Persistence the dispatcher needs
pub trait DispatchStore: AuditLog + ProfileRepository + Send + Sync + 'static {}

impl<T> DispatchStore for T where T: AuditLog + ProfileRepository + Send + Sync + 'static {}

/// Every upstream provider, bundled
pub trait ProviderSet:
    EmailProvider + GeocodingProvider + PlacesProvider + DirectionsProvider + Send + Sync + 'static
{
}

impl<T> ProviderSet for T where
    T: EmailProvider
        + GeocodingProvider
        + PlacesProvider
        + DirectionsProvider
        + Send
        + Sync
        + 'static
{
}

/// Progress of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DispatchStage {
    #[display("received")]
    Received,
    #[display("authenticated")]
    Authenticated,
    #[display("validated")]
    Validated,
    #[display("rateChecked")]
    RateChecked,
    #[display("providerCalled")]
    ProviderCalled,
    #[display("audited")]
    Audited,
    #[display("completed")]
    Completed,
}

/// Successful command result, serialized next to `"success": true`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    EmailSent {
        message: String,
    },
    Locations {
        locations: Vec<LocationResult>,
        count: usize,
    },
    Places {
        places: Vec<PlaceResult>,
        count: usize,
    },
    Directions(DirectionsOutput),
    EmailHistory {
        emails: Vec<EmailHistoryEntry>,
    },
}

/// Routes commands to their use case
pub struct CommandDispatcher<S, P, L>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    store: Arc<S>,
    providers: Arc<P>,
    limiter: Arc<L>,
    config: Arc<DispatchConfig>,
}

impl<S, P, L> Clone for CommandDispatcher<S, P, L>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            providers: self.providers.clone(),
            limiter: self.limiter.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, P, L> CommandDispatcher<S, P, L>
where
    S: DispatchStore,
    P: ProviderSet,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        providers: Arc<P>,
        limiter: Arc<L>,
        config: Arc<DispatchConfig>,
    ) -> Self {
        Self {
            store,
            providers,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run one command for `principal`.
    ///
    /// Audit-write failures are logged and never change the result.
    pub async fn dispatch(
        &self,
        principal: Option<&Principal>,
        command: CommandType,
        payload: Value,
    ) -> DispatchResult<CommandOutput> {
        self.dispatch_payload(principal, command, Ok(payload)).await
    }

    /// Like [`dispatch`](Self::dispatch), starting from a raw request body.
    ///
    /// An empty body is an empty payload. Malformed JSON fails validation
    /// after the caller has been authenticated, so it is audited like any
    /// other rejected payload.
    pub async fn dispatch_body(
        &self,
        principal: Option<&Principal>,
        command: CommandType,
        body: &[u8],
    ) -> DispatchResult<CommandOutput> {
        let payload = if body.iter().all(u8::is_ascii_whitespace) {
            Ok(Value::Null)
        } else {
            serde_json::from_slice::<Value>(body).map_err(|e| {
                tracing::debug!(error = %e, "Request body is not JSON");
                DispatchError::validation("payload", "Invalid request payload")
            })
        };
        self.dispatch_payload(principal, command, payload).await
    }

    async fn dispatch_payload(
        &self,
        principal: Option<&Principal>,
        command: CommandType,
        payload: DispatchResult<Value>,
    ) -> DispatchResult<CommandOutput> {
        let mut stage = DispatchStage::Received;

        // Nobody to attribute an audit record to.
        let Some(principal) = principal else {
            tracing::debug!(command = %command, "Rejected unauthenticated command");
            return Err(DispatchError::Unauthenticated);
        };
        stage = advance(stage, DispatchStage::Authenticated);

        let context = payload
            .as_ref()
            .map_or_else(|_| json!({}), |p| failure_context(command, p));

        match self.run(principal, command, payload, &mut stage).await {
            Ok((output, detail)) => {
                if command.is_audited() {
                    self.audit(AuditRecord::success(&principal.id, command, detail))
                        .await;
                    stage = advance(stage, DispatchStage::Audited);
                }
                stage = advance(stage, DispatchStage::Completed);
                tracing::info!(
                    command = %command,
                    principal_id = %principal.id,
                    stage = %stage,
                    "Command completed"
                );
                Ok(output)
            }
            Err(err) => {
                let err = err.or_provider_fallback(command.fallback_message());
                tracing::info!(
                    command = %command,
                    principal_id = %principal.id,
                    stage = %stage,
                    kind = %err.kind(),
                    "Command failed"
                );
                if command.is_audited() {
                    let mut detail = context;
                    detail["error"] = json!(err.public_message());
                    detail["stage"] = json!(stage.to_string());
                    self.audit(AuditRecord::failure(&principal.id, command, detail))
                        .await;
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        principal: &Principal,
        command: CommandType,
        payload: DispatchResult<Value>,
        stage: &mut DispatchStage,
    ) -> DispatchResult<(CommandOutput, Value)> {
        let payload = payload?;
        match command {
            CommandType::SendEmail => {
                let cmd = validate_email(parse_payload(payload)?)?;
                *stage = advance(*stage, DispatchStage::Validated);
                self.rate_check(principal, command, stage).await?;

                let output = SendEmailUseCase::new(
                    self.store.clone(),
                    self.providers.clone(),
                    self.config.clone(),
                )
                .execute(principal, cmd)
                .await?;
                *stage = advance(*stage, DispatchStage::ProviderCalled);

                let detail = json!({
                    "to": output.to,
                    "subject": output.subject,
                    "fromName": output.sender_name,
                    "fromEmail": output.sender_email,
                    "messageLength": output.message_chars,
                });
                Ok((
                    CommandOutput::EmailSent {
                        message: "Email sent successfully".to_string(),
                    },
                    detail,
                ))
            }
            CommandType::SearchLocations => {
                let cmd = validate_search(parse_payload(payload)?, self.config.default_origin)?;
                *stage = advance(*stage, DispatchStage::Validated);
                self.rate_check(principal, command, stage).await?;

                let locations =
                    SearchLocationsUseCase::new(self.providers.clone(), self.config.clone())
                        .execute(&cmd)
                        .await?;
                *stage = advance(*stage, DispatchStage::ProviderCalled);

                let count = locations.len();
                let detail = json!({
                    "query": cmd.term.text(),
                    "scope": cmd.scope.to_string(),
                    "resultCount": count,
                });
                Ok((CommandOutput::Locations { locations, count }, detail))
            }
            CommandType::SearchPlaces => {
                let cmd = validate_search(parse_payload(payload)?, self.config.default_origin)?;
                *stage = advance(*stage, DispatchStage::Validated);
                self.rate_check(principal, command, stage).await?;

                let places = SearchPlacesUseCase::new(self.providers.clone(), self.config.clone())
                    .execute(&cmd)
                    .await?;
                *stage = advance(*stage, DispatchStage::ProviderCalled);

                let count = places.len();
                let detail = json!({
                    "query": cmd.term.text(),
                    "scope": cmd.scope.to_string(),
                    "resultCount": count,
                });
                Ok((CommandOutput::Places { places, count }, detail))
            }
            CommandType::GetDirections => {
                let cmd = validate_directions(parse_payload(payload)?)?;
                *stage = advance(*stage, DispatchStage::Validated);
                self.rate_check(principal, command, stage).await?;

                let output = GetDirectionsUseCase::new(self.providers.clone())
                    .execute(&cmd)
                    .await?;
                *stage = advance(*stage, DispatchStage::ProviderCalled);

                let detail = json!({
                    "mode": cmd.mode.code(),
                    "distance": output.distance,
                    "duration": output.duration,
                });
                Ok((CommandOutput::Directions(output), detail))
            }
            CommandType::EmailHistory => {
                let emails = EmailHistoryUseCase::new(self.store.clone(), self.config.clone())
                    .execute(principal)
                    .await?;
                Ok((CommandOutput::EmailHistory { emails }, Value::Null))
            }
        }
    }

    /// Apply the per-principal quota to commands that carry one.
    async fn rate_check(
        &self,
        principal: &Principal,
        command: CommandType,
        stage: &mut DispatchStage,
    ) -> DispatchResult<()> {
        if command.is_rate_limited() {
            let limit = &self.config.email_rate_limit;
            let key = format!("{command}:{}", principal.id);

            let result = self
                .limiter
                .check_and_increment(&key, limit)
                .await
                .map_err(|e| DispatchError::Internal(format!("Rate limiter failed: {e}")))?;

            if !result.allowed {
                tracing::debug!(
                    principal_id = %principal.id,
                    command = %command,
                    reset_at_ms = result.reset_at_ms,
                    "Quota exhausted"
                );
                return Err(DispatchError::RateLimited {
                    max_requests: limit.max_requests,
                    window_secs: limit.window.as_secs(),
                });
            }
        }
        *stage = advance(*stage, DispatchStage::RateChecked);
        Ok(())
    }

    async fn audit(&self, record: AuditRecord) {
        if let Err(e) = self.store.record(&record).await {
            tracing::error!(
                audit_id = %record.id,
                command = %record.command_type,
                principal_id = %record.principal_id,
                error = %e,
                "Failed to write audit record"
            );
        }
    }
}

fn advance(from: DispatchStage, to: DispatchStage) -> DispatchStage {
    tracing::trace!(from = %from, to = %to, "Dispatch stage");
    to
}

/// Fields worth keeping on a failed record, read from the raw payload since
/// validation may not have succeeded.
fn failure_context(command: CommandType, payload: &Value) -> Value {
    match command {
        CommandType::SendEmail => {
            let field = |name: &str| {
                payload
                    .get(name)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("unknown")
                    .to_string()
            };
            json!({ "to": field("to"), "subject": field("subject") })
        }
        _ => json!({}),
    }
}
