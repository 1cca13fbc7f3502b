//! History ledger entity model and DTOs.
//!
//! Entries are append-only: after insert, only `is_undoable`/`undo_deadline`
//! (soft-disable) and `undone_at` (undo/redo) ever change.

use history_core::types::{DbId, Snapshot, Timestamp};
use history_core::undo::UndoState;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// History entry entity
// ---------------------------------------------------------------------------

/// A row from the `history_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HistoryEntry {
    pub id: DbId,
    pub tenant_id: DbId,
    pub actor_id: DbId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub old_snapshot: Option<serde_json::Value>,
    pub new_snapshot: Option<serde_json::Value>,
    pub metadata: serde_json::Value,
    pub is_undoable: bool,
    pub undo_deadline: Option<Timestamp>,
    pub undone_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    /// The state before the mutation, if it was captured as an object.
    pub fn old_state(&self) -> Option<&Snapshot> {
        self.old_snapshot.as_ref().and_then(|v| v.as_object())
    }

    /// The state after the mutation, if it was captured as an object.
    pub fn new_state(&self) -> Option<&Snapshot> {
        self.new_snapshot.as_ref().and_then(|v| v.as_object())
    }

    /// The fields that decide undo eligibility.
    pub fn undo_state(&self) -> UndoState {
        UndoState {
            is_undoable: self.is_undoable,
            undo_deadline: self.undo_deadline,
            undone_at: self.undone_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new history entry.
///
/// Derived values (`metadata.changed_fields`, `undo_deadline`) are computed by
/// the caller; the repository stores exactly what it is given.
#[derive(Debug, Clone)]
pub struct CreateHistoryEntry {
    pub tenant_id: DbId,
    pub actor_id: DbId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub old_snapshot: Option<serde_json::Value>,
    pub new_snapshot: Option<serde_json::Value>,
    pub metadata: serde_json::Value,
    pub is_undoable: bool,
    pub undo_deadline: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filter parameters for listing a tenant's history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub actor_id: Option<DbId>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for history listings.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total: i64,
    /// 1-based page number derived from `offset / limit`.
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl HistoryPage {
    pub fn new(items: Vec<HistoryEntry>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            page: (offset / limit.max(1)).saturating_add(1),
            limit,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_are_one_based() {
        let page = HistoryPage::new(Vec::new(), 45, 20, 20);
        assert_eq!(page.page, 2);
        assert!(page.has_more);

        let last = HistoryPage::new(Vec::new(), 45, 20, 40);
        assert_eq!(last.page, 3);
        assert!(!last.has_more);
    }

    #[test]
    fn huge_offset_does_not_overflow() {
        let page = HistoryPage::new(Vec::new(), 3, 20, i64::MAX);
        assert!(!page.has_more);
        assert!(page.page > 1);

        let single = HistoryPage::new(Vec::new(), 3, 1, i64::MAX);
        assert_eq!(single.page, i64::MAX);
        assert!(!single.has_more);
    }
}
