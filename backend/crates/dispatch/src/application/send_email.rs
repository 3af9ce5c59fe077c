//! Send Email Use Case
//!
//! Relays a caller's message to one recipient through the email provider.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::DispatchConfig;
use crate::domain::command::EmailCommand;
use crate::domain::email_template::{EmailContext, render_html, render_plain_text};
use crate::domain::principal::Principal;
use crate::domain::provider::{EmailProvider, OutgoingEmail};
use crate::domain::repository::ProfileRepository;
use crate::error::DispatchResult;

/// Send email output
#[derive(Debug, Clone)]
pub struct SendEmailOutput {
    pub to: String,
    pub subject: String,
    /// Resolved sender display name
    pub sender_name: String,
    /// Resolved sender address; empty when unknown
    pub sender_email: String,
    pub message_chars: usize,
}

/// Send email use case
pub struct SendEmailUseCase<R, E>
where
    R: ProfileRepository,
    E: EmailProvider,
{
    profiles: Arc<R>,
    email: Arc<E>,
    config: Arc<DispatchConfig>,
}

impl<R, E> SendEmailUseCase<R, E>
where
    R: ProfileRepository,
    E: EmailProvider,
{
    pub fn new(profiles: Arc<R>, email: Arc<E>, config: Arc<DispatchConfig>) -> Self {
        Self {
            profiles,
            email,
            config,
        }
    }

    pub async fn execute(
        &self,
        principal: &Principal,
        command: EmailCommand,
    ) -> DispatchResult<SendEmailOutput> {
        let sender_name = self.resolve_sender_name(principal).await;
        let sender_email = non_empty(principal.email.as_deref())
            .or(command.reply_to.as_ref().map(|r| r.as_str()))
            .unwrap_or_default()
            .to_string();

        let ctx = EmailContext {
            app_name: &self.config.app_name,
            sender_name: &sender_name,
            sender_email: &sender_email,
            message: &command.message,
            has_reply_to: command.reply_to.is_some(),
            sent_at: Utc::now(),
        };

        let outgoing = OutgoingEmail {
            to: command.to.clone(),
            reply_to: command.reply_to.clone(),
            subject: command.subject.clone(),
            text_body: render_plain_text(&ctx),
            html_body: render_html(&ctx),
        };

        self.email.send(&outgoing).await?;

        tracing::info!(
            principal_id = %principal.id,
            to = %command.to,
            "Email relayed"
        );

        Ok(SendEmailOutput {
            to: command.to.into_inner(),
            subject: command.subject,
            sender_name,
            sender_email,
            message_chars: command.message.chars().count(),
        })
    }

    /// Stored profile name, then token display name, then the configured fallback.
    async fn resolve_sender_name(&self, principal: &Principal) -> String {
        let stored = match self.profiles.find_display_name(&principal.id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(
                    principal_id = %principal.id,
                    error = %e,
                    "Profile lookup failed, using token name"
                );
                None
            }
        };

        non_empty(stored.as_deref())
            .or(non_empty(principal.display_name.as_deref()))
            .unwrap_or(self.config.fallback_display_name.as_str())
            .to_string()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
