//! User-facing confirmation messages for undo and redo.

use crate::history::action_types;

const FALLBACK_NAME: &str = "item";

fn noun(entity_type: &str) -> Option<&'static str> {
    match entity_type {
        "menu" => Some("menu"),
        "category" => Some("category"),
        "table" => Some("table"),
        "order" => Some("order"),
        "user" => Some("user profile"),
        _ => None,
    }
}

/// Message returned after a successful undo.
///
/// Undoing the deletion of a menu reads as a restore; every other undo reads
/// as a revert.
pub fn undo_message(entity_type: &str, entity_name: Option<&str>, action: &str) -> String {
    let name = entity_name.unwrap_or(FALLBACK_NAME);
    match noun(entity_type) {
        Some("menu") if action == action_types::DELETE => {
            format!("Menu '{name}' has been restored.")
        }
        Some(label) => format!("Changes to {label} '{name}' have been reverted."),
        None => format!("Changes to '{name}' have been reverted."),
    }
}

/// Message returned after a successful redo.
pub fn redo_message(entity_type: &str, entity_name: Option<&str>) -> String {
    let name = entity_name.unwrap_or(FALLBACK_NAME);
    match noun(entity_type) {
        Some(label) => format!("Changes to {label} '{name}' have been re-applied."),
        None => format!("Changes to '{name}' have been re-applied."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_delete_undo_reads_as_restore() {
        assert_eq!(
            undo_message("menu", Some("Latte"), action_types::DELETE),
            "Menu 'Latte' has been restored."
        );
        assert_eq!(
            undo_message("menu", Some("Latte"), action_types::UPDATE),
            "Changes to menu 'Latte' have been reverted."
        );
    }

    #[test]
    fn known_types_use_their_noun() {
        assert_eq!(
            undo_message("table", Some("T4"), action_types::UPDATE),
            "Changes to table 'T4' have been reverted."
        );
        assert_eq!(
            redo_message("user", Some("Kim")),
            "Changes to user profile 'Kim' have been re-applied."
        );
    }

    #[test]
    fn missing_name_and_unknown_type_fall_back() {
        assert_eq!(
            undo_message("coupon", None, action_types::DELETE),
            "Changes to 'item' have been reverted."
        );
        assert_eq!(redo_message("order", None), "Changes to order 'item' have been re-applied.");
    }
}
