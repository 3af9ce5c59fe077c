//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entity::audit_record::AuditRecord;
use crate::domain::value_object::CommandType;
use crate::error::DispatchResult;

/// Append-only audit log
#[trait_variant::make(AuditLog: Send)]
pub trait LocalAuditLog {
    /// Append a record
    async fn record(&self, record: &AuditRecord) -> DispatchResult<()>;

    /// Most recent records for a principal and command, newest first
    async fn recent_for_principal(
        &self,
        principal_id: &str,
        command_type: CommandType,
        limit: usize,
    ) -> DispatchResult<Vec<AuditRecord>>;
}

/// Read-only lookup of user profile data
#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    /// Display name stored on the user's profile, if any
    async fn find_display_name(&self, user_id: &str) -> DispatchResult<Option<String>>;
}
