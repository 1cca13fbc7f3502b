//! Key-by-key comparison of entity snapshots.
//!
//! Used by the history ledger to derive the `changed_fields` metadata of an
//! entry. A key missing from one side is treated as present with an undefined
//! value, so `{}` versus `{"a": null}` reports `a` as changed.

use serde::{Deserialize, Serialize};

use crate::types::Snapshot;

/// The status of a single key when comparing two snapshots.
///
/// - `Added`     -- present only in the new snapshot.
/// - `Removed`   -- present only in the old snapshot.
/// - `Changed`   -- present in both with different values.
/// - `Unchanged` -- present in both with identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

/// One key of a snapshot comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    pub status: DiffStatus,
}

/// Compare two snapshots key by key.
///
/// Keys of `old` come first (in map order), followed by keys that only exist
/// in `new`. Values are compared with deep JSON equality.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> Vec<FieldDiff> {
    let mut diffs: Vec<FieldDiff> = old
        .iter()
        .map(|(key, old_value)| {
            let status = match new.get(key) {
                None => DiffStatus::Removed,
                Some(new_value) if new_value == old_value => DiffStatus::Unchanged,
                Some(_) => DiffStatus::Changed,
            };
            FieldDiff {
                field: key.clone(),
                status,
            }
        })
        .collect();

    diffs.extend(
        new.keys()
            .filter(|key| !old.contains_key(*key))
            .map(|key| FieldDiff {
                field: key.clone(),
                status: DiffStatus::Added,
            }),
    );

    diffs
}

/// Names of the keys whose value differs between the two snapshots.
///
/// When only one side is present every key of that side counts as changed;
/// when neither is present the result is empty.
pub fn changed_fields(old: Option<&Snapshot>, new: Option<&Snapshot>) -> Vec<String> {
    let empty = Snapshot::new();
    match (old, new) {
        (None, None) => Vec::new(),
        (old, new) => diff_snapshots(old.unwrap_or(&empty), new.unwrap_or(&empty))
            .into_iter()
            .filter(|d| d.status != DiffStatus::Unchanged)
            .map(|d| d.field)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        value.as_object().cloned().expect("test snapshot must be an object")
    }

    #[test]
    fn price_change_and_new_name_are_both_reported() {
        let old = snapshot(json!({ "price": 10000 }));
        let new = snapshot(json!({ "price": 12000, "name": "X" }));
        assert_eq!(
            changed_fields(Some(&old), Some(&new)),
            vec!["price".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let old = snapshot(json!({ "price": 10000, "tags": ["a", "b"] }));
        assert!(changed_fields(Some(&old), Some(&old.clone())).is_empty());
    }

    #[test]
    fn nested_values_use_deep_equality() {
        let old = snapshot(json!({ "options": { "size": "L", "extra": [1, 2] } }));
        let same = snapshot(json!({ "options": { "extra": [1, 2], "size": "L" } }));
        let different = snapshot(json!({ "options": { "size": "L", "extra": [2, 1] } }));
        assert!(changed_fields(Some(&old), Some(&same)).is_empty());
        assert_eq!(changed_fields(Some(&old), Some(&different)), vec!["options"]);
    }

    #[test]
    fn absent_key_differs_from_null() {
        let old = snapshot(json!({}));
        let new = snapshot(json!({ "description": null }));
        assert_eq!(changed_fields(Some(&old), Some(&new)), vec!["description"]);
    }

    #[test]
    fn removed_key_is_reported() {
        let old = snapshot(json!({ "price": 1, "soldOut": true }));
        let new = snapshot(json!({ "price": 1 }));
        let diffs = diff_snapshots(&old, &new);
        assert!(diffs.contains(&FieldDiff {
            field: "soldOut".into(),
            status: DiffStatus::Removed,
        }));
        assert_eq!(changed_fields(Some(&old), Some(&new)), vec!["soldOut"]);
    }

    #[test]
    fn single_sided_snapshot_marks_every_key() {
        let created = snapshot(json!({ "name": "Latte", "price": 4500 }));
        let mut fields = changed_fields(None, Some(&created));
        fields.sort();
        assert_eq!(fields, vec!["name", "price"]);
        assert_eq!(changed_fields(Some(&created), None).len(), 2);
    }

    #[test]
    fn no_snapshots_no_changes() {
        assert!(changed_fields(None, None).is_empty());
    }
}
