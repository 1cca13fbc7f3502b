//! In-process TTL cache for read views of the ledger.
//!
//! Keys are namespaced by tenant (`history:{tenant}:...`) so one mutation can
//! drop every view of that tenant at once. The cache only ever serves reads;
//! undo/redo eligibility is always decided from the database.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use history_core::types::DbId;
use history_db::models::history_entry::{HistoryEntry, HistoryPage, HistoryQuery};
use history_db::models::undo_token::UndoStackItem;
use tokio::sync::RwLock;

use crate::config::HistoryConfig;

/// A cached view.
#[derive(Debug, Clone)]
pub enum CachedView {
    Page(HistoryPage),
    Entries(Vec<HistoryEntry>),
    Entry(HistoryEntry),
    UndoStack(Vec<UndoStackItem>),
}

/// Which TTL a view is stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    /// Lists, whose content changes with every mutation.
    Short,
    /// Single entries.
    Medium,
}

struct Slot {
    view: CachedView,
    expires_at: Instant,
}

pub struct HistoryCache {
    slots: RwLock<HashMap<String, Slot>>,
    short_ttl: Duration,
    medium_ttl: Duration,
}

impl HistoryCache {
    pub fn new(short_ttl: Duration, medium_ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            short_ttl,
            medium_ttl,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(
            Duration::from_secs(config.cache_ttl_short_secs),
            Duration::from_secs(config.cache_ttl_medium_secs),
        )
    }

    /// Look up a live view. An expired slot is removed and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<CachedView> {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            match slots.get(key) {
                Some(slot) if slot.expires_at > now => return Some(slot.view.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.slots.write().await.remove(key);
        None
    }

    /// Store a view, pruning any other expired slots on the way.
    pub async fn insert(&self, key: String, view: CachedView, ttl: CacheTtl) {
        let now = Instant::now();
        let ttl = match ttl {
            CacheTtl::Short => self.short_ttl,
            CacheTtl::Medium => self.medium_ttl,
        };
        let mut slots = self.slots.write().await;
        slots.retain(|_, slot| slot.expires_at > now);
        slots.insert(
            key,
            Slot {
                view,
                expires_at: now + ttl,
            },
        );
    }

    /// Drop every view of a tenant. Returns how many slots were removed.
    pub async fn invalidate_tenant(&self, tenant_id: DbId) -> usize {
        let prefix = keys::tenant_prefix(tenant_id);
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - slots.len();
        tracing::debug!(%tenant_id, removed, "History cache invalidated");
        removed
    }
}

/// Cache key builders.
pub mod keys {
    use super::*;

    pub fn tenant_prefix(tenant_id: DbId) -> String {
        format!("history:{tenant_id}:")
    }

    pub fn list(tenant_id: DbId, query: &HistoryQuery) -> String {
        format!(
            "history:{tenant_id}:list:{:?}:{:?}:{:?}:{:?}:{:?}:{:?}:{:?}:{:?}",
            query.actor_id,
            query.action,
            query.entity_type,
            query.entity_id,
            query.from,
            query.to,
            query.limit,
            query.offset,
        )
    }

    pub fn entity(tenant_id: DbId, entity_type: &str, entity_id: &str, limit: i64) -> String {
        format!("history:{tenant_id}:entity:{entity_type}:{entity_id}:{limit}")
    }

    pub fn entry(tenant_id: DbId, entry_id: DbId) -> String {
        format!("history:{tenant_id}:entry:{entry_id}")
    }

    pub fn undo_stack(tenant_id: DbId, actor_id: DbId) -> String {
        format!("history:{tenant_id}:undo-stack:{actor_id}")
    }

    pub fn undoable(tenant_id: DbId, limit: i64) -> String {
        format!("history:{tenant_id}:undoable:{limit}")
    }
}
