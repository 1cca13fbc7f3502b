//! Undo executor.
//!
//! Eligibility check, then one compensating write to the owning service, then
//! a single transaction that marks the entry undone, issues the redo token and
//! appends the audit entry. Local state changes only after the remote write
//! succeeded, and the conditional update lets exactly one concurrent caller
//! commit.

use chrono::Utc;
use history_core::error::CoreError;
use history_core::history::{action_types, metadata_keys};
use history_core::messages::undo_message;
use history_core::types::{DbId, Timestamp};
use history_core::undo::{check_actor_permission, check_undo_eligibility, redo_deadline};
use history_db::models::history_entry::CreateHistoryEntry;
use history_db::models::undo_token::CreateUndoToken;
use history_db::repositories::{HistoryEntryRepo, UndoTokenRepo};
use serde::Serialize;

use super::ledger::build_metadata;
use super::{log_restore_failure, RestoredEntity};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Result of a successful undo.
#[derive(Debug, Serialize)]
pub struct UndoOutcome {
    pub message: String,
    pub restored_entity: RestoredEntity,
    /// Token to pass to redo.
    pub undo_token_id: DbId,
    pub can_redo: bool,
    pub redo_deadline: Timestamp,
    /// The `undo` entry appended to the ledger.
    pub audit_entry_id: DbId,
}

/// Undo `entry_id` on behalf of `actor`.
pub async fn execute(
    state: &AppState,
    actor: &AuthUser,
    entry_id: DbId,
    reason: Option<String>,
) -> AppResult<UndoOutcome> {
    let entry = HistoryEntryRepo::find_by_id(&state.pool, actor.tenant_id, entry_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "history_entry",
            id: entry_id,
        })?;

    let now = Utc::now();
    check_undo_eligibility(entry.undo_state(), now)?;
    let old_state = entry
        .old_state()
        .ok_or_else(|| CoreError::NotUndoable("no prior state was recorded".to_string()))?;
    check_actor_permission(actor.user_id, &actor.role, entry.actor_id)?;

    let restored = match state
        .dispatcher
        .restore(&entry.entity_type, &entry.entity_id, old_state)
        .await
    {
        Ok(restored) => restored,
        Err(err) => {
            log_restore_failure("undo", actor.tenant_id, &entry, old_state, &err);
            return Err(err.into());
        }
    };

    let committed_at = Utc::now();
    let mut tx = state.pool.begin().await?;

    if !HistoryEntryRepo::mark_undone(&mut *tx, entry.id, committed_at).await? {
        tx.rollback().await?;
        let err = lost_transition_error(state, actor.tenant_id, entry.id).await?;
        tracing::warn!(
            entry_id = %entry.id,
            tenant_id = %actor.tenant_id,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            error = %err,
            "Undo restoration was sent but the entry changed before commit"
        );
        return Err(err.into());
    }

    let token = UndoTokenRepo::create(
        &mut *tx,
        &CreateUndoToken {
            history_entry_id: entry.id,
            tenant_id: actor.tenant_id,
            actor_id: actor.user_id,
            created_at: committed_at,
        },
    )
    .await?;

    let mut extra = serde_json::Map::new();
    extra.insert(
        metadata_keys::ORIGINAL_ENTRY_ID.to_string(),
        serde_json::json!(entry.id),
    );
    extra.insert(metadata_keys::REASON.to_string(), serde_json::json!(reason));
    extra.insert(
        metadata_keys::UNDO_TOKEN_ID.to_string(),
        serde_json::json!(token.id),
    );

    let audit = HistoryEntryRepo::create(
        &mut *tx,
        &CreateHistoryEntry {
            tenant_id: actor.tenant_id,
            actor_id: actor.user_id,
            action: action_types::UNDO.to_string(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
            entity_name: entry.entity_name.clone(),
            old_snapshot: entry.new_snapshot.clone(),
            new_snapshot: entry.old_snapshot.clone(),
            metadata: build_metadata(entry.new_state(), entry.old_state(), Some(extra)),
            is_undoable: false,
            undo_deadline: None,
        },
    )
    .await?;

    tx.commit().await?;
    state.cache.invalidate_tenant(actor.tenant_id).await;

    tracing::info!(
        entry_id = %entry.id,
        token_id = %token.id,
        tenant_id = %actor.tenant_id,
        actor_id = %actor.user_id,
        entity_type = %entry.entity_type,
        entity_id = %entry.entity_id,
        "History entry undone"
    );

    Ok(UndoOutcome {
        message: undo_message(&entry.entity_type, entry.entity_name.as_deref(), &entry.action),
        restored_entity: RestoredEntity {
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            entity_name: entry.entity_name,
            snapshot: restored,
        },
        undo_token_id: token.id,
        can_redo: true,
        redo_deadline: redo_deadline(token.created_at),
        audit_entry_id: audit.id,
    })
}

/// Why the conditional `mark_undone` matched no row: the entry was either
/// undone by a concurrent request or soft-disabled in the meantime.
async fn lost_transition_error(
    state: &AppState,
    tenant_id: DbId,
    entry_id: DbId,
) -> AppResult<CoreError> {
    let current = HistoryEntryRepo::find_by_id(&state.pool, tenant_id, entry_id).await?;
    Ok(match current {
        Some(row) if !row.is_undoable => {
            CoreError::NotUndoable("undo was disabled for this action".to_string())
        }
        Some(_) => CoreError::AlreadyProcessed("this action has already been undone".to_string()),
        None => CoreError::NotFound {
            entity: "history_entry",
            id: entry_id,
        },
    })
}
