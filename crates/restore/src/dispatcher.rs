//! Entity-type routing for restorations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use history_core::types::Snapshot;

use crate::error::RestoreError;

/// Capability to overwrite one entity with a snapshot in its owning service.
#[async_trait]
pub trait Restorable: Send + Sync {
    /// Write `snapshot` over the entity and return the state the owner
    /// reports back.
    async fn restore(
        &self,
        entity_id: &str,
        snapshot: &Snapshot,
    ) -> Result<serde_json::Value, RestoreError>;
}

/// Immutable `entity_type -> Restorable` map. Built once at startup, then
/// shared behind an `Arc`.
#[derive(Clone, Default)]
pub struct RestorationDispatcher {
    restorers: HashMap<String, Arc<dyn Restorable>>,
}

impl RestorationDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Registered entity types, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.restorers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Route a restoration to the restorer registered for `entity_type`.
    ///
    /// Unknown types fail with [`RestoreError::UnsupportedEntity`] without
    /// touching the network.
    pub async fn restore(
        &self,
        entity_type: &str,
        entity_id: &str,
        snapshot: &Snapshot,
    ) -> Result<serde_json::Value, RestoreError> {
        let restorer = self
            .restorers
            .get(entity_type)
            .ok_or_else(|| RestoreError::UnsupportedEntity(entity_type.to_string()))?;

        tracing::debug!(entity_type, entity_id, "Dispatching restoration");
        restorer.restore(entity_id, snapshot).await
    }
}

impl std::fmt::Debug for RestorationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestorationDispatcher")
            .field("entity_types", &self.entity_types())
            .finish()
    }
}

/// Collects registrations before freezing them into a dispatcher.
#[derive(Default)]
pub struct DispatcherBuilder {
    restorers: HashMap<String, Arc<dyn Restorable>>,
}

impl DispatcherBuilder {
    /// Register a restorer. A later registration for the same type replaces
    /// the earlier one.
    pub fn register(
        mut self,
        entity_type: impl Into<String>,
        restorer: Arc<dyn Restorable>,
    ) -> Self {
        self.restorers.insert(entity_type.into(), restorer);
        self
    }

    pub fn build(self) -> RestorationDispatcher {
        RestorationDispatcher {
            restorers: self.restorers,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl Restorable for Counting {
        async fn restore(
            &self,
            _entity_id: &str,
            snapshot: &Snapshot,
        ) -> Result<serde_json::Value, RestoreError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::Value::Object(snapshot.clone()))
        }
    }

    fn snapshot() -> Snapshot {
        json!({ "price": 10000 }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn routes_by_entity_type() {
        let menu = Arc::new(Counting(AtomicUsize::new(0)));
        let dispatcher = RestorationDispatcher::builder()
            .register("menu", menu.clone())
            .build();

        let restored = dispatcher.restore("menu", "M1", &snapshot()).await.unwrap();
        assert_eq!(restored, json!({ "price": 10000 }));
        assert_eq!(menu.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_type_fails_without_calling_anyone() {
        let menu = Arc::new(Counting(AtomicUsize::new(0)));
        let dispatcher = RestorationDispatcher::builder()
            .register("menu", menu.clone())
            .build();

        assert_matches!(
            dispatcher.restore("coupon", "C1", &snapshot()).await,
            Err(RestoreError::UnsupportedEntity(t)) if t == "coupon"
        );
        assert_eq!(menu.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn entity_types_are_sorted() {
        let dispatcher = RestorationDispatcher::builder()
            .register("table", Arc::new(Counting(AtomicUsize::new(0))))
            .register("menu", Arc::new(Counting(AtomicUsize::new(0))))
            .build();
        assert_eq!(dispatcher.entity_types(), vec!["menu", "table"]);
    }
}
