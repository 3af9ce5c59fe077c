//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::AuditRecordId;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entity::audit_record::{AuditRecord, AuditStatus};
use crate::domain::repository::{AuditLog, ProfileRepository};
use crate::domain::value_object::CommandType;
use crate::error::{DispatchError, DispatchResult};

/// PostgreSQL-backed audit log and profile lookup
#[derive(Clone)]
pub struct PgDispatchRepository {
    pool: PgPool,
}

impl PgDispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete audit records older than `cutoff`
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> DispatchResult<u64> {
        let deleted = sqlx::query("DELETE FROM command_audit_log WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(records_deleted = deleted, "Purged old audit records");

        Ok(deleted)
    }
}

// ============================================================================
// Audit Log Implementation
// ============================================================================

impl AuditLog for PgDispatchRepository {
    async fn record(&self, record: &AuditRecord) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO command_audit_log (
                audit_id,
                principal_id,
                command_type,
                status,
                detail,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.principal_id)
        .bind(record.command_type.as_str())
        .bind(record.status.code())
        .bind(Json(&record.detail))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_for_principal(
        &self,
        principal_id: &str,
        command_type: CommandType,
        limit: usize,
    ) -> DispatchResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT
                audit_id,
                principal_id,
                command_type,
                status,
                detail,
                created_at
            FROM command_audit_log
            WHERE principal_id = $1 AND command_type = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(principal_id)
        .bind(command_type.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::into_record).collect()
    }
}

// ============================================================================
// Profile Repository Implementation
// ============================================================================

impl ProfileRepository for PgDispatchRepository {
    async fn find_display_name(&self, user_id: &str) -> DispatchResult<Option<String>> {
        let name: Option<Option<String>> =
            sqlx::query_scalar("SELECT name FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(name.flatten())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct AuditRow {
    audit_id: Uuid,
    principal_id: String,
    command_type: String,
    status: String,
    detail: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_record(self) -> DispatchResult<AuditRecord> {
        let command_type = self
            .command_type
            .parse::<CommandType>()
            .map_err(|_| DispatchError::Internal(format!("Invalid command_type: {}", self.command_type)))?;

        let status = self
            .status
            .parse::<AuditStatus>()
            .map_err(DispatchError::Internal)?;

        Ok(AuditRecord {
            id: AuditRecordId::from_uuid(self.audit_id),
            principal_id: self.principal_id,
            command_type,
            status,
            detail: self.detail.0,
            created_at: self.created_at,
        })
    }
}
