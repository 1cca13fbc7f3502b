//! History ledger constants and input validation.

use crate::error::CoreError;

/// Known action tags for history entries.
///
/// Domain services may record other (custom) tags; only `undo` and `redo`
/// are reserved for entries written by the engine itself.
pub mod action_types {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const UNDO: &str = "undo";
    pub const REDO: &str = "redo";
}

/// Metadata keys written by the ledger and the executors.
pub mod metadata_keys {
    pub const CHANGED_FIELDS: &str = "changed_fields";
    pub const ORIGINAL_ENTRY_ID: &str = "original_entry_id";
    pub const UNDO_TOKEN_ID: &str = "undo_token_id";
    pub const REASON: &str = "reason";
}

/// Maximum length of free-text identifiers (action, entity type, entity id).
pub const MAX_TAG_LEN: usize = 100;

/// Maximum length of an entity display name.
pub const MAX_ENTITY_NAME_LEN: usize = 255;

/// Returns `true` for tags only the engine may write.
pub fn is_reserved_action(action: &str) -> bool {
    matches!(action, action_types::UNDO | action_types::REDO)
}

/// Validate the action tag of an incoming entry.
pub fn validate_action(action: &str) -> Result<(), CoreError> {
    validate_tag("action", action)?;
    if is_reserved_action(action) {
        return Err(CoreError::Validation(format!(
            "action '{action}' is reserved for entries written by the history service"
        )));
    }
    Ok(())
}

/// Validate a required, bounded, non-blank identifier field.
pub fn validate_tag(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > MAX_TAG_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_TAG_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_actions_are_accepted() {
        for action in [action_types::CREATE, action_types::UPDATE, action_types::DELETE, "price_change"] {
            assert!(validate_action(action).is_ok(), "{action} should be accepted");
        }
    }

    #[test]
    fn engine_actions_are_reserved() {
        assert!(validate_action(action_types::UNDO).is_err());
        assert!(validate_action(action_types::REDO).is_err());
    }

    #[test]
    fn blank_and_oversized_tags_are_rejected() {
        assert!(validate_tag("entity_type", "  ").is_err());
        assert!(validate_tag("entity_id", &"x".repeat(MAX_TAG_LEN + 1)).is_err());
        assert!(validate_tag("entity_id", "M1").is_ok());
    }
}
