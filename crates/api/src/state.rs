use std::sync::Arc;

use history_restore::RestorationDispatcher;

use crate::cache::HistoryCache;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: history_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Entity-type routing for compensating writes. Built once at startup.
    pub dispatcher: Arc<RestorationDispatcher>,
    /// Read-view cache, invalidated after every mutation.
    pub cache: Arc<HistoryCache>,
}
