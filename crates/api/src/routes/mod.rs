pub mod health;
pub mod history;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /history                                         list, record
/// /history/{id}                                    detail, disable undo (owner)
/// /history/undo                                    undo an entry
/// /history/redo                                    redeem an undo token
/// /history/undo-stack                              caller's open undo tokens
/// /history/undoable                                entries still undoable
/// /history/entity/{entity_type}/{entity_id}        one entity's history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/history", history::router())
}
