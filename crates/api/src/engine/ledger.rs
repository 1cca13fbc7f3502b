//! Recording and reading the history ledger.
//!
//! Reads go through the tenant-scoped cache; every write invalidates the
//! tenant's cached views before returning.

use chrono::Utc;
use history_core::diff::changed_fields;
use history_core::error::CoreError;
use history_core::history::{metadata_keys, validate_action, validate_tag, MAX_ENTITY_NAME_LEN};
use history_core::types::{DbId, Snapshot};
use history_core::undo::{undo_deadline, validate_window_minutes};
use history_db::models::history_entry::{
    CreateHistoryEntry, HistoryEntry, HistoryPage, HistoryQuery,
};
use history_db::models::undo_token::UndoStackItem;
use history_db::repositories::history_entry_repo::{clamp_limit, clamp_offset};
use history_db::repositories::{HistoryEntryRepo, UndoTokenRepo};

use crate::cache::{keys, CacheTtl, CachedView};
use crate::error::AppResult;
use crate::state::AppState;

/// Open tokens shown on a user's undo stack.
pub const UNDO_STACK_SIZE: i64 = 10;

/// Default size of the undoable listing.
pub const DEFAULT_UNDOABLE_LIMIT: i64 = 20;

/// A mutation reported by a domain service.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub tenant_id: DbId,
    pub actor_id: DbId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub old_snapshot: Option<Snapshot>,
    pub new_snapshot: Option<Snapshot>,
    /// Merged over the derived metadata; caller keys win.
    pub metadata: Option<Snapshot>,
    pub is_undoable: bool,
    /// Falls back to the configured default window.
    pub undo_window_minutes: Option<i64>,
}

/// Derived metadata for a pair of snapshots, with `extra` merged over it.
pub fn build_metadata(
    old: Option<&Snapshot>,
    new: Option<&Snapshot>,
    extra: Option<Snapshot>,
) -> serde_json::Value {
    let mut metadata = Snapshot::new();
    metadata.insert(
        metadata_keys::CHANGED_FIELDS.to_string(),
        serde_json::json!(changed_fields(old, new)),
    );
    if let Some(extra) = extra {
        metadata.extend(extra);
    }
    serde_json::Value::Object(metadata)
}

/// Append a new entry to the ledger.
pub async fn record(state: &AppState, input: RecordEntry) -> AppResult<HistoryEntry> {
    validate_action(&input.action)?;
    validate_tag("entity_type", &input.entity_type)?;
    validate_tag("entity_id", &input.entity_id)?;
    if input
        .entity_name
        .as_ref()
        .is_some_and(|name| name.chars().count() > MAX_ENTITY_NAME_LEN)
    {
        return Err(CoreError::Validation(format!(
            "entity_name must be at most {MAX_ENTITY_NAME_LEN} characters"
        ))
        .into());
    }
    if let Some(minutes) = input.undo_window_minutes {
        validate_window_minutes(minutes)?;
    }

    let window = input
        .undo_window_minutes
        .unwrap_or(state.config.history.undo_window_minutes);
    let now = Utc::now();

    let metadata = build_metadata(
        input.old_snapshot.as_ref(),
        input.new_snapshot.as_ref(),
        input.metadata,
    );

    let create = CreateHistoryEntry {
        tenant_id: input.tenant_id,
        actor_id: input.actor_id,
        action: input.action,
        entity_type: input.entity_type,
        entity_id: input.entity_id,
        entity_name: input.entity_name,
        old_snapshot: input.old_snapshot.map(serde_json::Value::Object),
        new_snapshot: input.new_snapshot.map(serde_json::Value::Object),
        metadata,
        is_undoable: input.is_undoable,
        undo_deadline: undo_deadline(now, input.is_undoable, window),
    };

    let entry = HistoryEntryRepo::create(&state.pool, &create).await?;
    state.cache.invalidate_tenant(entry.tenant_id).await;

    tracing::info!(
        entry_id = %entry.id,
        tenant_id = %entry.tenant_id,
        action = %entry.action,
        entity_type = %entry.entity_type,
        entity_id = %entry.entity_id,
        is_undoable = entry.is_undoable,
        "History entry recorded"
    );

    Ok(entry)
}

/// One page of a tenant's history, newest first.
pub async fn list(state: &AppState, tenant_id: DbId, mut query: HistoryQuery) -> AppResult<HistoryPage> {
    query.limit = Some(clamp_limit(
        query.limit.or(Some(state.config.history.page_size)),
    ));
    query.offset = Some(clamp_offset(query.offset));

    let key = keys::list(tenant_id, &query);
    if let Some(CachedView::Page(page)) = state.cache.get(&key).await {
        return Ok(page);
    }

    let items = HistoryEntryRepo::list(&state.pool, tenant_id, &query).await?;
    let total = HistoryEntryRepo::count(&state.pool, tenant_id, &query).await?;
    let page = HistoryPage::new(
        items,
        total,
        query.limit.unwrap_or_default(),
        query.offset.unwrap_or_default(),
    );

    state
        .cache
        .insert(key, CachedView::Page(page.clone()), CacheTtl::Short)
        .await;
    Ok(page)
}

/// A single entry. Entries of other tenants are reported as not found.
pub async fn get(state: &AppState, tenant_id: DbId, entry_id: DbId) -> AppResult<HistoryEntry> {
    let key = keys::entry(tenant_id, entry_id);
    if let Some(CachedView::Entry(entry)) = state.cache.get(&key).await {
        return Ok(entry);
    }

    let entry = HistoryEntryRepo::find_by_id(&state.pool, tenant_id, entry_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "history_entry",
            id: entry_id,
        })?;

    state
        .cache
        .insert(key, CachedView::Entry(entry.clone()), CacheTtl::Medium)
        .await;
    Ok(entry)
}

/// Most recent entries for one entity.
pub async fn entity_history(
    state: &AppState,
    tenant_id: DbId,
    entity_type: &str,
    entity_id: &str,
    limit: i64,
) -> AppResult<Vec<HistoryEntry>> {
    validate_tag("entity_type", entity_type)?;
    validate_tag("entity_id", entity_id)?;

    let key = keys::entity(tenant_id, entity_type, entity_id, limit);
    if let Some(CachedView::Entries(entries)) = state.cache.get(&key).await {
        return Ok(entries);
    }

    let entries =
        HistoryEntryRepo::list_for_entity(&state.pool, tenant_id, entity_type, entity_id, limit)
            .await?;

    state
        .cache
        .insert(key, CachedView::Entries(entries.clone()), CacheTtl::Short)
        .await;
    Ok(entries)
}

/// Permanently close an entry's undo window. The record itself is kept.
pub async fn soft_disable(state: &AppState, tenant_id: DbId, entry_id: DbId) -> AppResult<HistoryEntry> {
    let entry = HistoryEntryRepo::disable_undo(&state.pool, tenant_id, entry_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "history_entry",
            id: entry_id,
        })?;
    state.cache.invalidate_tenant(tenant_id).await;

    tracing::info!(entry_id = %entry_id, tenant_id = %tenant_id, "History entry undo disabled");
    Ok(entry)
}

/// Entries of the tenant that can still be undone right now.
pub async fn undoable(state: &AppState, tenant_id: DbId, limit: i64) -> AppResult<Vec<HistoryEntry>> {
    let key = keys::undoable(tenant_id, limit);
    if let Some(CachedView::Entries(entries)) = state.cache.get(&key).await {
        return Ok(entries);
    }

    let entries = HistoryEntryRepo::list_undoable(&state.pool, tenant_id, Utc::now(), limit).await?;

    state
        .cache
        .insert(key, CachedView::Entries(entries.clone()), CacheTtl::Short)
        .await;
    Ok(entries)
}

/// The caller's most recent unconsumed undo tokens, with redo deadlines.
pub async fn undo_stack(
    state: &AppState,
    tenant_id: DbId,
    actor_id: DbId,
) -> AppResult<Vec<UndoStackItem>> {
    let key = keys::undo_stack(tenant_id, actor_id);
    if let Some(CachedView::UndoStack(items)) = state.cache.get(&key).await {
        return Ok(items);
    }

    let items: Vec<UndoStackItem> =
        UndoTokenRepo::list_open_for_actor(&state.pool, tenant_id, actor_id, UNDO_STACK_SIZE)
            .await?
            .into_iter()
            .map(UndoStackItem::from)
            .collect();

    state
        .cache
        .insert(key, CachedView::UndoStack(items.clone()), CacheTtl::Short)
        .await;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn metadata_carries_changed_fields() {
        let old = snapshot(json!({ "price": 10000 }));
        let new = snapshot(json!({ "price": 12000, "name": "X" }));
        let metadata = build_metadata(Some(&old), Some(&new), None);
        assert_eq!(metadata, json!({ "changed_fields": ["price", "name"] }));
    }

    #[test]
    fn caller_metadata_wins_over_derived_keys() {
        let extra = snapshot(json!({ "changed_fields": ["custom"], "source": "pos" }));
        let metadata = build_metadata(None, None, Some(extra));
        assert_eq!(
            metadata,
            json!({ "changed_fields": ["custom"], "source": "pos" })
        );
    }
}
