//! In-Memory Repository
//!
//! Used when no database is configured, and by tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::entity::audit_record::AuditRecord;
use crate::domain::repository::{AuditLog, ProfileRepository};
use crate::domain::value_object::CommandType;
use crate::error::{DispatchError, DispatchResult};

/// Process-local audit log and profile table
#[derive(Debug, Default)]
pub struct InMemoryDispatchRepository {
    records: Mutex<Vec<AuditRecord>>,
    profiles: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl InMemoryDispatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile display name
    pub fn set_profile_name(&self, user_id: impl Into<String>, name: impl Into<String>) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(user_id.into(), name.into());
        }
    }

    /// Make every subsequent `record` call fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all records in insertion order
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

fn poisoned() -> DispatchError {
    DispatchError::Internal("in-memory store lock poisoned".to_string())
}

impl AuditLog for InMemoryDispatchRepository {
    async fn record(&self, record: &AuditRecord) -> DispatchResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DispatchError::Internal("audit store unavailable".to_string()));
        }
        self.records.lock().map_err(|_| poisoned())?.push(record.clone());
        Ok(())
    }

    async fn recent_for_principal(
        &self,
        principal_id: &str,
        command_type: CommandType,
        limit: usize,
    ) -> DispatchResult<Vec<AuditRecord>> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        let mut matching: Vec<AuditRecord> = records
            .iter()
            .filter(|r| r.principal_id == principal_id && r.command_type == command_type)
            .cloned()
            .collect();
        // Later inserts win ties on equal timestamps.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

impl ProfileRepository for InMemoryDispatchRepository {
    async fn find_display_name(&self, user_id: &str) -> DispatchResult<Option<String>> {
        let profiles = self.profiles.lock().map_err(|_| poisoned())?;
        Ok(profiles.get(user_id).cloned())
    }
}
