//! Audit Record Entity
//!
//! One entry per command attempt, success or failure. Never updated.

use chrono::{DateTime, Utc};
use kernel::id::AuditRecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_object::CommandType;

/// Outcome of a command attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditStatus::Success),
            "failed" => Ok(AuditStatus::Failed),
            other => Err(format!("unknown audit status: {other}")),
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub principal_id: String,
    pub command_type: CommandType,
    pub status: AuditStatus,
    /// Command-specific fields (recipient, result count, failing stage, ...)
    pub detail: serde_json::Value,
    /// Assigned by the server when the record is created
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        principal_id: impl Into<String>,
        command_type: CommandType,
        status: AuditStatus,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditRecordId::new(),
            principal_id: principal_id.into(),
            command_type,
            status,
            detail,
            created_at: Utc::now(),
        }
    }

    pub fn success(
        principal_id: impl Into<String>,
        command_type: CommandType,
        detail: serde_json::Value,
    ) -> Self {
        Self::new(principal_id, command_type, AuditStatus::Success, detail)
    }

    pub fn failure(
        principal_id: impl Into<String>,
        command_type: CommandType,
        detail: serde_json::Value,
    ) -> Self {
        Self::new(principal_id, command_type, AuditStatus::Failed, detail)
    }

    pub fn is_success(&self) -> bool {
        self.status == AuditStatus::Success
    }

    /// String field from the detail object, if present
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.detail.get(key).and_then(|v| v.as_str())
    }
}
