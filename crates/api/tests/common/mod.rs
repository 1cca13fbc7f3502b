#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use history_api::auth::jwt::{generate_access_token, JwtConfig};
use history_api::cache::HistoryCache;
use history_api::config::{HistoryConfig, ServerConfig};
use history_api::router::build_app_router;
use history_api::state::AppState;
use history_core::types::{DbId, Snapshot};
use history_restore::{CollaboratorConfig, Restorable, RestorationDispatcher, RestoreError};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        history: HistoryConfig::default(),
        collaborators: CollaboratorConfig::default(),
    }
}

/// Build the full application router (same middleware stack as production)
/// around the given pool and dispatcher.
pub fn build_test_app(pool: PgPool, dispatcher: RestorationDispatcher) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher: Arc::new(dispatcher),
        cache: Arc::new(HistoryCache::from_config(&config.history)),
    };
    build_app_router(state, &config)
}

/// App with an in-memory restorer registered for `menu`.
pub fn build_menu_app(pool: PgPool) -> (Router, Arc<FakeRestorer>) {
    let restorer = Arc::new(FakeRestorer::default());
    let dispatcher = RestorationDispatcher::builder()
        .register("menu", restorer.clone())
        .build();
    (build_test_app(pool, dispatcher), restorer)
}

// ---------------------------------------------------------------------------
// In-memory collaborator
// ---------------------------------------------------------------------------

/// Records every restoration and can be told to fail the next N calls.
#[derive(Default)]
pub struct FakeRestorer {
    pub calls: Mutex<Vec<(String, Snapshot)>>,
    failures_left: AtomicUsize,
    delay_ms: AtomicUsize,
}

impl FakeRestorer {
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Restorable for FakeRestorer {
    async fn restore(
        &self,
        entity_id: &str,
        snapshot: &Snapshot,
    ) -> Result<serde_json::Value, RestoreError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((entity_id.to_string(), snapshot.clone()));

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RestoreError::Upstream {
                collaborator: "store-management".to_string(),
                entity_id: entity_id.to_string(),
                status: Some(500),
                message: "database unavailable".to_string(),
            });
        }
        Ok(serde_json::Value::Object(snapshot.clone()))
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub fn token_for(user_id: DbId, tenant_id: DbId, role: &str) -> String {
    let config = test_config();
    generate_access_token(user_id, tenant_id, role, &config.jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Assert the status and return the decoded body.
pub async fn expect_status(response: Response, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}
