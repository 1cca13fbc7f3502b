//! Route definitions for the history ledger and undo/redo.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::history;
use crate::state::AppState;

/// History routes mounted at `/history`.
///
/// All routes require authentication (enforced by handler extractors).
///
/// ```text
/// GET    /                                  -> list_entries
/// POST   /                                  -> create_entry
/// POST   /undo                              -> undo_entry
/// POST   /redo                              -> redo_entry
/// GET    /undo-stack                        -> undo_stack
/// GET    /undoable                          -> undoable_entries
/// GET    /entity/{entity_type}/{entity_id}  -> entity_history
/// GET    /{id}                              -> get_entry
/// DELETE /{id}                              -> disable_entry (owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(history::list_entries).post(history::create_entry))
        .route("/undo", post(history::undo_entry))
        .route("/redo", post(history::redo_entry))
        .route("/undo-stack", get(history::undo_stack))
        .route("/undoable", get(history::undoable_entries))
        .route(
            "/entity/{entity_type}/{entity_id}",
            get(history::entity_history),
        )
        .route(
            "/{id}",
            get(history::get_entry).delete(history::disable_entry),
        )
}
