use history_core::undo::DEFAULT_UNDO_WINDOW_MINUTES;
use history_restore::CollaboratorConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4010`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub history: HistoryConfig,
    /// Where restorations are sent.
    pub collaborators: CollaboratorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `4010`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// See [`JwtConfig::from_env`], [`HistoryConfig::from_env`] and
    /// [`CollaboratorConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4010".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            history: HistoryConfig::from_env(),
            collaborators: CollaboratorConfig::from_env(),
        }
    }
}

/// Tunables for the ledger, the cache and the retention sweeper.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Undo window applied when an entry does not specify one.
    pub undo_window_minutes: i64,
    /// Default page size for history listings.
    pub page_size: i64,
    /// Entries older than this are purged.
    pub retention_days: i64,
    pub sweep_interval_secs: u64,
    /// TTL for list-style cached views.
    pub cache_ttl_short_secs: u64,
    /// TTL for single-entry cached views.
    pub cache_ttl_medium_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            undo_window_minutes: DEFAULT_UNDO_WINDOW_MINUTES,
            page_size: 20,
            retention_days: 90,
            sweep_interval_secs: 3600,
            cache_ttl_short_secs: 30,
            cache_ttl_medium_secs: 300,
        }
    }
}

impl HistoryConfig {
    /// Load history tunables from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `UNDO_WINDOW_MINUTES`         | `30`    |
    /// | `HISTORY_PAGE_SIZE`           | `20`    |
    /// | `HISTORY_RETENTION_DAYS`      | `90`    |
    /// | `HISTORY_SWEEP_INTERVAL_SECS` | `3600`  |
    /// | `CACHE_TTL_SHORT_SECS`        | `30`    |
    /// | `CACHE_TTL_MEDIUM_SECS`       | `300`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            undo_window_minutes: env_or("UNDO_WINDOW_MINUTES", defaults.undo_window_minutes),
            page_size: env_or("HISTORY_PAGE_SIZE", defaults.page_size),
            retention_days: env_or("HISTORY_RETENTION_DAYS", defaults.retention_days),
            sweep_interval_secs: env_or("HISTORY_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            cache_ttl_short_secs: env_or("CACHE_TTL_SHORT_SECS", defaults.cache_ttl_short_secs),
            cache_ttl_medium_secs: env_or("CACHE_TTL_MEDIUM_SECS", defaults.cache_ttl_medium_secs),
        }
    }
}

/// Parse an env var, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse, so misconfiguration
/// fails at startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be valid: {e}")),
        Err(_) => default,
    }
}
