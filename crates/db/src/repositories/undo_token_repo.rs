//! Repository for the `undo_tokens` table.

use history_core::types::{new_id, DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::undo_token::{CreateUndoToken, UndoToken};

/// Column list for `undo_tokens` SELECT / RETURNING clauses.
const COLUMNS: &str = "id, history_entry_id, tenant_id, actor_id, created_at, redone_at";

/// Provides token issuance, lookup, and single-use consumption.
pub struct UndoTokenRepo;

impl UndoTokenRepo {
    /// Issue a token for an undone entry. Normally called inside the undo
    /// transaction; the partial unique index rejects a second open token.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateUndoToken,
    ) -> Result<UndoToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO undo_tokens (id, history_entry_id, tenant_id, actor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UndoToken>(&query)
            .bind(new_id())
            .bind(input.history_entry_id)
            .bind(input.tenant_id)
            .bind(input.actor_id)
            .bind(input.created_at)
            .fetch_one(executor)
            .await
    }

    /// Find a token by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<UndoToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM undo_tokens WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, UndoToken>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Consume a token. Returns `true` only for the caller that flipped
    /// `redone_at` from null.
    pub async fn mark_redone<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE undo_tokens SET redone_at = $2 WHERE id = $1 AND redone_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// An actor's most recent unconsumed tokens in a tenant.
    pub async fn list_open_for_actor(
        pool: &PgPool,
        tenant_id: DbId,
        actor_id: DbId,
        limit: i64,
    ) -> Result<Vec<UndoToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM undo_tokens \
             WHERE tenant_id = $1 AND actor_id = $2 AND redone_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        );
        sqlx::query_as::<_, UndoToken>(&query)
            .bind(tenant_id)
            .bind(actor_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of tokens ever issued for an entry.
    pub async fn count_for_entry(pool: &PgPool, history_entry_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM undo_tokens WHERE history_entry_id = $1",
        )
        .bind(history_entry_id)
        .fetch_one(pool)
        .await
    }
}
