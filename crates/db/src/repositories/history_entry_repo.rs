//! Repository for the `history_entries` table.
//!
//! Every read is scoped by `tenant_id`. State transitions used by undo/redo
//! are conditional updates that report whether the row actually changed, so
//! concurrent callers are serialized by Postgres rather than by the caller.

use history_core::types::{new_id, DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::history_entry::{CreateHistoryEntry, HistoryEntry, HistoryQuery};

/// Column list for `history_entries` SELECT / RETURNING clauses.
const COLUMNS: &str = "\
    id, tenant_id, actor_id, action, entity_type, entity_id, entity_name, \
    old_snapshot, new_snapshot, metadata, is_undoable, undo_deadline, \
    undone_at, created_at";

/// Default page size when the caller does not supply one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Hard upper bound on a single page.
pub const MAX_LIMIT: i64 = 100;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Provides ledger inserts, tenant-scoped queries, and conditional state
/// transitions for history entries.
pub struct HistoryEntryRepo;

impl HistoryEntryRepo {
    /// Append a new entry. Accepts a pool or an open transaction.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateHistoryEntry,
    ) -> Result<HistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO history_entries \
                (id, tenant_id, actor_id, action, entity_type, entity_id, entity_name, \
                 old_snapshot, new_snapshot, metadata, is_undoable, undo_deadline) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(new_id())
            .bind(input.tenant_id)
            .bind(input.actor_id)
            .bind(&input.action)
            .bind(&input.entity_type)
            .bind(&input.entity_id)
            .bind(&input.entity_name)
            .bind(&input.old_snapshot)
            .bind(&input.new_snapshot)
            .bind(&input.metadata)
            .bind(input.is_undoable)
            .bind(input.undo_deadline)
            .fetch_one(executor)
            .await
    }

    /// Find an entry by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<HistoryEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM history_entries WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's entries with filtering and pagination, newest first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        params: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let limit = clamp_limit(params.limit);
        let offset = clamp_offset(params.offset);

        let (where_clause, bind_values, bind_idx) = build_history_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM history_entries {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_history_values(
            sqlx::query_as::<_, HistoryEntry>(&query).bind(tenant_id),
            &bind_values,
        );
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count a tenant's entries matching the filter (for pagination metadata).
    pub async fn count(
        pool: &PgPool,
        tenant_id: DbId,
        params: &HistoryQuery,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_history_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT FROM history_entries {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(tenant_id);
        for val in &bind_values {
            q = match val {
                BindValue::Uuid(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Timestamp(v) => q.bind(*v),
            };
        }
        q.fetch_one(pool).await
    }

    /// Most recent entries for a single entity.
    pub async fn list_for_entity(
        pool: &PgPool,
        tenant_id: DbId,
        entity_type: &str,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history_entries \
             WHERE tenant_id = $1 AND entity_type = $2 AND entity_id = $3 \
             ORDER BY created_at DESC, id DESC LIMIT $4"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(tenant_id)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Entries that can still be undone at `now`, newest first.
    pub async fn list_undoable(
        pool: &PgPool,
        tenant_id: DbId,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history_entries \
             WHERE tenant_id = $1 AND is_undoable AND undone_at IS NULL \
               AND undo_deadline > $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(tenant_id)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Permanently close the undo window of an entry without deleting it.
    ///
    /// Returns the updated row, or `None` if the entry is not in the tenant.
    pub async fn disable_undo(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE history_entries SET is_undoable = FALSE, undo_deadline = NULL \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Set `undone_at` only if it is currently null and the entry is still
    /// undoable. Returns `true` if this caller won the transition.
    pub async fn mark_undone<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE history_entries SET undone_at = $2 \
             WHERE id = $1 AND undone_at IS NULL AND is_undoable",
        )
        .bind(id)
        .bind(at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear `undone_at` after a redo. Returns `true` if the row was undone.
    pub async fn clear_undone<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE history_entries SET undone_at = NULL \
             WHERE id = $1 AND undone_at IS NOT NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every entry created before `cutoff`. Tokens go with them via
    /// `ON DELETE CASCADE`. Returns the number of entries removed.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM history_entries WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built history queries.
enum BindValue {
    Uuid(DbId),
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from `HistoryQuery` filters.
///
/// `$1` is always the tenant id. Returns `(where_clause, bind_values,
/// next_bind_index)`.
fn build_history_filter(params: &HistoryQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = vec!["tenant_id = $1".to_string()];
    let mut bind_idx = 2u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(actor_id) = params.actor_id {
        conditions.push(format!("actor_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Uuid(actor_id));
    }

    if let Some(ref action) = params.action {
        conditions.push(format!("action = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action.clone()));
    }

    if let Some(ref entity_type) = params.entity_type {
        conditions.push(format!("entity_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(entity_type.clone()));
    }

    if let Some(ref entity_id) = params.entity_id {
        conditions.push(format!("entity_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(entity_id.clone()));
    }

    if let Some(from) = params.from {
        conditions.push(format!("created_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.to {
        conditions.push(format!("created_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    (
        format!("WHERE {}", conditions.join(" AND ")),
        bind_values,
        bind_idx,
    )
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_history_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        q = match val {
            BindValue::Uuid(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(1_000)), MAX_LIMIT);
        assert_eq!(clamp_offset(Some(-5)), 0);
    }

    #[test]
    fn filter_always_scopes_by_tenant() {
        let (clause, values, next) = build_history_filter(&HistoryQuery::default());
        assert_eq!(clause, "WHERE tenant_id = $1");
        assert!(values.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn filter_numbers_placeholders_in_order() {
        let params = HistoryQuery {
            action: Some("update".into()),
            entity_id: Some("M1".into()),
            ..Default::default()
        };
        let (clause, values, next) = build_history_filter(&params);
        assert_eq!(
            clause,
            "WHERE tenant_id = $1 AND action = $2 AND entity_id = $3"
        );
        assert_eq!(values.len(), 2);
        assert_eq!(next, 4);
    }
}
