//! Repository layer: one zero-sized struct per table with async methods
//! taking a `&PgPool` or any `PgExecutor` (pool or transaction).

pub mod history_entry_repo;
pub mod undo_token_repo;

pub use history_entry_repo::HistoryEntryRepo;
pub use undo_token_repo::UndoTokenRepo;
