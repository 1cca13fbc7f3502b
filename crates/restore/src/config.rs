use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::RestorationDispatcher;
use crate::error::RegistryError;
use crate::http::HttpRestorer;

/// Location of the collaborators that own restorable entities.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    /// Owns menus, categories and tables.
    pub store_management_url: String,
    pub order_service_url: String,
    pub user_profile_service_url: String,
    /// Per-call timeout for restoration requests (default: `5`).
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            store_management_url: "http://localhost:4002".into(),
            order_service_url: "http://localhost:4004".into(),
            user_profile_service_url: "http://localhost:4009".into(),
            timeout_secs: 5,
        }
    }
}

impl CollaboratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `STORE_MANAGEMENT_URL`     | `http://localhost:4002` |
    /// | `ORDER_SERVICE_URL`        | `http://localhost:4004` |
    /// | `USER_PROFILE_SERVICE_URL` | `http://localhost:4009` |
    /// | `RESTORE_TIMEOUT_SECS`     | `5`                     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let store_management_url =
            std::env::var("STORE_MANAGEMENT_URL").unwrap_or(defaults.store_management_url);
        let order_service_url =
            std::env::var("ORDER_SERVICE_URL").unwrap_or(defaults.order_service_url);
        let user_profile_service_url =
            std::env::var("USER_PROFILE_SERVICE_URL").unwrap_or(defaults.user_profile_service_url);

        let timeout_secs: u64 = std::env::var("RESTORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("RESTORE_TIMEOUT_SECS must be a valid u64");

        Self {
            store_management_url,
            order_service_url,
            user_profile_service_url,
            timeout_secs,
        }
    }

    /// `(entity_type, collaborator, collection_url)` for every restorable type.
    pub fn routes(&self) -> Vec<(&'static str, &'static str, String)> {
        let store = self.store_management_url.trim_end_matches('/');
        let orders = self.order_service_url.trim_end_matches('/');
        let profiles = self.user_profile_service_url.trim_end_matches('/');
        vec![
            ("menu", "store-management", format!("{store}/api/v1/menus")),
            ("category", "store-management", format!("{store}/api/v1/categories")),
            ("table", "store-management", format!("{store}/api/v1/tables")),
            ("order", "order-service", format!("{orders}/api/v1/orders")),
            ("user", "user-profile-service", format!("{profiles}/api/v1/profile")),
        ]
    }

    /// Build the default dispatcher: one [`HttpRestorer`] per route, all
    /// sharing a client with the configured timeout.
    pub fn build_dispatcher(&self) -> Result<RestorationDispatcher, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let mut builder = RestorationDispatcher::builder();
        for (entity_type, collaborator, url) in self.routes() {
            let restorer = HttpRestorer::new(collaborator, &url, client.clone())?;
            builder = builder.register(entity_type, Arc::new(restorer));
        }
        Ok(builder.build())
    }
}
