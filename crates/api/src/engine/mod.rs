//! History engine: the ledger plus the undo and redo executors.

pub mod ledger;
pub mod redo;
pub mod undo;

use history_core::types::{DbId, Snapshot};
use history_db::models::history_entry::HistoryEntry;
use history_restore::RestoreError;
use serde::Serialize;

/// The entity as the owning service reported it after a restoration.
#[derive(Debug, Serialize)]
pub struct RestoredEntity {
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub snapshot: serde_json::Value,
}

/// Upstream failures get full context at `error`; an unsupported entity type
/// is an expected rejection.
fn log_restore_failure(
    operation: &'static str,
    tenant_id: DbId,
    entry: &HistoryEntry,
    attempted: &Snapshot,
    err: &RestoreError,
) {
    match err {
        RestoreError::Upstream {
            collaborator,
            status,
            message,
            ..
        } => tracing::error!(
            operation,
            %tenant_id,
            entry_id = %entry.id,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            collaborator = %collaborator,
            upstream_status = ?status,
            upstream_message = %message,
            snapshot = %serde_json::Value::Object(attempted.clone()),
            "Restoration failed; ledger left unchanged"
        ),
        RestoreError::UnsupportedEntity(entity_type) => tracing::debug!(
            operation,
            entry_id = %entry.id,
            entity_type = %entity_type,
            "No collaborator registered for entity type"
        ),
    }
}
