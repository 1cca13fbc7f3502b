//! Redo executor.
//!
//! Redeems a single-use undo token: the entry's post-mutation state is written
//! back to the owning service, the token is consumed and the entry is marked
//! not undone. The original undo deadline is left untouched.

use chrono::Utc;
use history_core::error::CoreError;
use history_core::history::{action_types, metadata_keys};
use history_core::messages::redo_message;
use history_core::types::DbId;
use history_core::undo::{check_actor_permission, check_redo_eligibility};
use history_db::models::history_entry::CreateHistoryEntry;
use history_db::repositories::{HistoryEntryRepo, UndoTokenRepo};
use serde::Serialize;

use super::ledger::build_metadata;
use super::{log_restore_failure, RestoredEntity};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Result of a successful redo.
#[derive(Debug, Serialize)]
pub struct RedoOutcome {
    pub message: String,
    /// The entry whose mutation was re-applied.
    pub entry_id: DbId,
    pub undo_token_id: DbId,
    pub restored_entity: RestoredEntity,
    /// The `redo` entry appended to the ledger.
    pub audit_entry_id: DbId,
}

/// Redeem `token_id` on behalf of `actor`.
pub async fn execute(state: &AppState, actor: &AuthUser, token_id: DbId) -> AppResult<RedoOutcome> {
    let token = UndoTokenRepo::find_by_id(&state.pool, actor.tenant_id, token_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "undo_token",
            id: token_id,
        })?;
    let entry = HistoryEntryRepo::find_by_id(&state.pool, actor.tenant_id, token.history_entry_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "history_entry",
            id: token.history_entry_id,
        })?;

    check_redo_eligibility(token.created_at, token.redone_at, Utc::now())?;
    check_actor_permission(actor.user_id, &actor.role, token.actor_id)?;
    let new_state = entry
        .new_state()
        .ok_or_else(|| CoreError::NotUndoable("no resulting state was recorded".to_string()))?;

    let restored = match state
        .dispatcher
        .restore(&entry.entity_type, &entry.entity_id, new_state)
        .await
    {
        Ok(restored) => restored,
        Err(err) => {
            log_restore_failure("redo", actor.tenant_id, &entry, new_state, &err);
            return Err(err.into());
        }
    };

    let mut tx = state.pool.begin().await?;

    if !UndoTokenRepo::mark_redone(&mut *tx, token.id, Utc::now()).await? {
        tx.rollback().await?;
        tracing::debug!(token_id = %token.id, "Redo lost a race; token already consumed");
        return Err(CoreError::AlreadyProcessed("this undo has already been redone".into()).into());
    }

    if !HistoryEntryRepo::clear_undone(&mut *tx, entry.id).await? {
        tracing::warn!(entry_id = %entry.id, "Redo found entry not marked undone");
    }

    let mut extra = serde_json::Map::new();
    extra.insert(
        metadata_keys::ORIGINAL_ENTRY_ID.to_string(),
        serde_json::json!(entry.id),
    );
    extra.insert(
        metadata_keys::UNDO_TOKEN_ID.to_string(),
        serde_json::json!(token.id),
    );

    let audit = HistoryEntryRepo::create(
        &mut *tx,
        &CreateHistoryEntry {
            tenant_id: actor.tenant_id,
            actor_id: actor.user_id,
            action: action_types::REDO.to_string(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
            entity_name: entry.entity_name.clone(),
            old_snapshot: entry.old_snapshot.clone(),
            new_snapshot: entry.new_snapshot.clone(),
            metadata: build_metadata(entry.old_state(), entry.new_state(), Some(extra)),
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
        "Undo redone"
    );

    Ok(RedoOutcome {
        message: redo_message(&entry.entity_type, entry.entity_name.as_deref()),
        entry_id: entry.id,
        undo_token_id: token.id,
        restored_entity: RestoredEntity {
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            entity_name: entry.entity_name,
            snapshot: restored,
        },
        audit_entry_id: audit.id,
    })
}
