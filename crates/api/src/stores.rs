//! Key-value stores.
//!
//! This module contains the KV namespace abstraction, its Redis and in-memory
//! implementations, and typed views over the namespaces.
//!
//! ## Namespaces and Key Patterns
//!
//! ```text
//! INTERACTIONS_LOG
//!   log:{slug}:{ip}:{millis}-{rand}   → JSON array of sanitized actions
//!   lock:{ip}                         → "true" (TTL 300s)
//!   cleaned:{session_id}              → "true" (TTL 600s)
//! INTERACTIONS_CACHE
//!   interactions:{slug}               → SeriesInteractions JSON
//! IMG_CHEST_CACHE
//!   (image host cache, browsed and deleted by admins only)
//! ```
//!
//! On Redis every namespace owns a key prefix (`interactions_log:`...).
//!
//! ## Usage in Handlers
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let cache = state.stores.interaction_cache().load("blue-box").await?;
//! }
//! ```

mod cache;
mod cleanup;
mod kv;
mod locks;
mod logs;
mod memory;
mod redis_kv;

pub use cache::InteractionCache;
pub use cleanup::CleanupMarkers;
pub use kv::{KvNamespace, KvPage, list_all};
pub use locks::IpLocks;
pub use logs::{InteractionLog, LogKey};
pub use memory::MemoryKvNamespace;
pub use redis_kv::RedisKvNamespace;

#[cfg(test)]
pub use kv::MockKvNamespace;

use std::sync::Arc;

use shared::api::Namespace;

/// Collection of all KV namespaces.
#[derive(Clone)]
pub struct Stores {
    pub log: Arc<dyn KvNamespace>,
    pub cache: Arc<dyn KvNamespace>,
    pub images: Arc<dyn KvNamespace>,
}

impl Stores {
    pub fn redis(client: redis::Client) -> Self {
        Self {
            log: Arc::new(RedisKvNamespace::new(client.clone(), Namespace::InteractionsLog)),
            cache: Arc::new(RedisKvNamespace::new(client.clone(), Namespace::InteractionsCache)),
            images: Arc::new(RedisKvNamespace::new(client, Namespace::ImgChestCache)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            log: Arc::new(MemoryKvNamespace::new()),
            cache: Arc::new(MemoryKvNamespace::new()),
            images: Arc::new(MemoryKvNamespace::new()),
        }
    }

    pub fn namespace(&self, namespace: Namespace) -> &Arc<dyn KvNamespace> {
        match namespace {
            Namespace::InteractionsLog => &self.log,
            Namespace::InteractionsCache => &self.cache,
            Namespace::ImgChestCache => &self.images,
        }
    }

    pub fn interaction_log(&self) -> InteractionLog {
        InteractionLog::new(self.log.clone())
    }

    pub fn interaction_cache(&self) -> InteractionCache {
        InteractionCache::new(self.cache.clone())
    }

    pub fn ip_locks(&self, ttl_secs: u64) -> IpLocks {
        IpLocks::new(self.log.clone(), ttl_secs)
    }

    pub fn cleanup_markers(&self, ttl_secs: u64) -> CleanupMarkers {
        CleanupMarkers::new(self.log.clone(), ttl_secs)
    }
}
