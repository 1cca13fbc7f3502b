//! Undo token entity model and DTOs.

use history_core::types::{DbId, Timestamp};
use history_core::undo::redo_deadline;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `undo_tokens` table. Consumed by setting `redone_at`,
/// never deleted outside of retention.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UndoToken {
    pub id: DbId,
    pub history_entry_id: DbId,
    pub tenant_id: DbId,
    pub actor_id: DbId,
    pub created_at: Timestamp,
    pub redone_at: Option<Timestamp>,
}

impl UndoToken {
    pub fn redo_deadline(&self) -> Timestamp {
        redo_deadline(self.created_at)
    }
}

/// DTO for inserting a new undo token.
#[derive(Debug, Clone)]
pub struct CreateUndoToken {
    pub history_entry_id: DbId,
    pub tenant_id: DbId,
    pub actor_id: DbId,
    pub created_at: Timestamp,
}

/// An open token as shown on a user's undo stack.
#[derive(Debug, Clone, Serialize)]
pub struct UndoStackItem {
    #[serde(flatten)]
    pub token: UndoToken,
    pub redo_deadline: Timestamp,
}

impl From<UndoToken> for UndoStackItem {
    fn from(token: UndoToken) -> Self {
        let redo_deadline = token.redo_deadline();
        Self {
            token,
            redo_deadline,
        }
    }
}
