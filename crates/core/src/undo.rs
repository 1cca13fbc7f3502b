//! Undo/redo windows and eligibility rules.
//!
//! The undo window is configurable per entry (falling back to a service-wide
//! default) and runs from the moment the mutation was recorded. The redo window
//! is a fixed span measured from the moment the undo succeeded. The two are
//! deliberately separate values.

use chrono::Duration;

use crate::error::CoreError;
use crate::roles;
use crate::types::{DbId, Timestamp};

/// Default undo window in minutes when neither the caller nor the
/// configuration provides one.
pub const DEFAULT_UNDO_WINDOW_MINUTES: i64 = 30;

/// Redo window in minutes, measured from token creation.
pub const REDO_WINDOW_MINUTES: i64 = 30;

/// Upper bound for a caller-supplied undo window (7 days).
pub const MAX_UNDO_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Compute the undo deadline for a new entry.
///
/// Non-undoable entries never carry a deadline.
pub fn undo_deadline(now: Timestamp, is_undoable: bool, window_minutes: i64) -> Option<Timestamp> {
    is_undoable.then(|| now + Duration::minutes(window_minutes))
}

/// The moment a token created at `token_created_at` stops being redoable.
pub fn redo_deadline(token_created_at: Timestamp) -> Timestamp {
    token_created_at + Duration::minutes(REDO_WINDOW_MINUTES)
}

/// Validate a caller-supplied undo window.
pub fn validate_window_minutes(minutes: i64) -> Result<(), CoreError> {
    if (1..=MAX_UNDO_WINDOW_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "undo_window_minutes must be between 1 and {MAX_UNDO_WINDOW_MINUTES}, got {minutes}"
        )))
    }
}

/// The ledger fields that decide whether an entry can be undone.
#[derive(Debug, Clone, Copy)]
pub struct UndoState {
    pub is_undoable: bool,
    pub undo_deadline: Option<Timestamp>,
    pub undone_at: Option<Timestamp>,
}

/// Check that an entry may be undone at `now`.
///
/// Order matters: a disabled entry reports `NotUndoable` even if it was
/// previously undone, and an already-undone entry reports `AlreadyProcessed`
/// even if its window has since closed.
pub fn check_undo_eligibility(state: UndoState, now: Timestamp) -> Result<(), CoreError> {
    if !state.is_undoable {
        return Err(CoreError::NotUndoable(
            "this action cannot be undone".to_string(),
        ));
    }
    if state.undone_at.is_some() {
        return Err(CoreError::AlreadyProcessed(
            "this action has already been undone".to_string(),
        ));
    }
    match state.undo_deadline {
        Some(deadline) if now <= deadline => Ok(()),
        Some(deadline) => Err(CoreError::Expired(format!(
            "the undo window closed at {}",
            deadline.to_rfc3339()
        ))),
        // An undoable entry always has a deadline; treat a missing one as closed.
        None => Err(CoreError::Expired("the undo window has closed".to_string())),
    }
}

/// Check that a token may be redeemed for a redo at `now`.
pub fn check_redo_eligibility(
    token_created_at: Timestamp,
    redone_at: Option<Timestamp>,
    now: Timestamp,
) -> Result<(), CoreError> {
    if redone_at.is_some() {
        return Err(CoreError::AlreadyProcessed(
            "this undo has already been redone".to_string(),
        ));
    }
    let deadline = redo_deadline(token_created_at);
    if now > deadline {
        return Err(CoreError::Expired(format!(
            "the redo window closed at {}",
            deadline.to_rfc3339()
        )));
    }
    Ok(())
}

/// Only the original actor or a tenant owner may reverse an action.
pub fn check_actor_permission(actor_id: DbId, role: &str, owner_id: DbId) -> Result<(), CoreError> {
    if actor_id == owner_id || roles::is_elevated(role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "only the original actor or the store owner may do this".to_string(),
        ))
    }
}
