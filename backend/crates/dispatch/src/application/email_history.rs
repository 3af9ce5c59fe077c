//! Email History Use Case
//!
//! The caller's most recent email attempts, newest first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::config::DispatchConfig;
use crate::domain::principal::Principal;
use crate::domain::repository::AuditLog;
use crate::domain::value_object::CommandType;
use crate::error::DispatchResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailHistoryEntry {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Email history use case
pub struct EmailHistoryUseCase<A>
where
    A: AuditLog,
{
    audit_log: Arc<A>,
    config: Arc<DispatchConfig>,
}

impl<A> EmailHistoryUseCase<A>
where
    A: AuditLog,
{
    pub fn new(audit_log: Arc<A>, config: Arc<DispatchConfig>) -> Self {
        Self { audit_log, config }
    }

    pub async fn execute(&self, principal: &Principal) -> DispatchResult<Vec<EmailHistoryEntry>> {
        let records = self
            .audit_log
            .recent_for_principal(
                &principal.id,
                CommandType::SendEmail,
                self.config.email_history_limit,
            )
            .await?;

        Ok(records
            .into_iter()
            .map(|r| EmailHistoryEntry {
                id: r.id.to_string(),
                to: r.detail_str("to").unwrap_or("unknown").to_string(),
                subject: r.detail_str("subject").unwrap_or("unknown").to_string(),
                status: r.status.code().to_string(),
                error: r.detail_str("error").map(str::to_string),
                created_at: r.created_at,
            })
            .collect())
    }
}
