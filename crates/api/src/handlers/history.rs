//! Handlers for the `/history` resource.
//!
//! Every endpoint requires authentication; the caller's tenant comes from the
//! access token and scopes every read and write.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use history_core::types::{DbId, Snapshot};
use history_db::models::history_entry::HistoryQuery;
use serde::Deserialize;
use validator::Validate;

use crate::engine::ledger::{self, RecordEntry, DEFAULT_UNDOABLE_LIMIT};
use crate::engine::{redo, undo};
use crate::error::AppResult;
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireOwner;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default number of entries returned for one entity.
const DEFAULT_ENTITY_HISTORY_LIMIT: i64 = 10;
const MAX_ENTITY_HISTORY_LIMIT: i64 = 50;
const MAX_UNDOABLE_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Body for `POST /history`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1, max = 100))]
    pub action: String,
    #[validate(length(min = 1, max = 100))]
    pub entity_type: String,
    #[validate(length(min = 1, max = 100))]
    pub entity_id: String,
    #[validate(length(max = 255))]
    pub entity_name: Option<String>,
    pub old_snapshot: Option<Snapshot>,
    pub new_snapshot: Option<Snapshot>,
    pub metadata: Option<Snapshot>,
    #[serde(default = "default_true")]
    pub is_undoable: bool,
    #[validate(range(min = 1, max = 10080))]
    pub undo_window_minutes: Option<i64>,
}

/// Body for `POST /history/undo`.
#[derive(Debug, Deserialize, Validate)]
pub struct UndoRequest {
    pub entry_id: DbId,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Body for `POST /history/redo`.
#[derive(Debug, Deserialize, Validate)]
pub struct RedoRequest {
    pub token_id: DbId,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// GET /history
pub async fn list_entries(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let page = ledger::list(&state, user.tenant_id, query).await?;
    Ok(Json(DataResponse { data: page }))
}

/// POST /history
///
/// Records a mutation on behalf of the caller.
pub async fn create_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = ledger::record(
        &state,
        RecordEntry {
            tenant_id: user.tenant_id,
            actor_id: user.user_id,
            action: input.action,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            entity_name: input.entity_name,
            old_snapshot: input.old_snapshot,
            new_snapshot: input.new_snapshot,
            metadata: input.metadata,
            is_undoable: input.is_undoable,
            undo_window_minutes: input.undo_window_minutes,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /history/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedPath(id): ValidatedPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = ledger::get(&state, user.tenant_id, id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /history/{id}
///
/// Closes the entry's undo window; the record itself is kept. Owner only.
pub async fn disable_entry(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    ValidatedPath(id): ValidatedPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = ledger::soft_disable(&state, owner.tenant_id, id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /history/entity/{entity_type}/{entity_id}?limit=
pub async fn entity_history(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedPath((entity_type, entity_id)): ValidatedPath<(String, String)>,
    ValidatedQuery(params): ValidatedQuery<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.clamped(DEFAULT_ENTITY_HISTORY_LIMIT, MAX_ENTITY_HISTORY_LIMIT);
    let entries =
        ledger::entity_history(&state, user.tenant_id, &entity_type, &entity_id, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

/// POST /history/undo
pub async fn undo_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<UndoRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = undo::execute(&state, &user, input.entry_id, input.reason).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /history/redo
pub async fn redo_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<RedoRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = redo::execute(&state, &user, input.token_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /history/undo-stack
///
/// The caller's most recent open undo tokens.
pub async fn undo_stack(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let items = ledger::undo_stack(&state, user.tenant_id, user.user_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /history/undoable?limit=
pub async fn undoable_entries(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(params): ValidatedQuery<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.clamped(DEFAULT_UNDOABLE_LIMIT, MAX_UNDOABLE_LIMIT);
    let entries = ledger::undoable(&state, user.tenant_id, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}
