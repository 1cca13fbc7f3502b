//! Pure domain rules for the history & undo/redo service.
//!
//! No I/O lives here: the database layer (`history_db`), the restoration
//! client (`history_restore`) and the HTTP server (`history_api`) all build on
//! these types and rules.

pub mod diff;
pub mod error;
pub mod history;
pub mod messages;
pub mod roles;
pub mod types;
pub mod undo;
