//! In-process KV namespace.
//!
//! Used when no Redis URL is configured (local development) and in tests.
//! Expired entries are dropped lazily on access.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::kv::{KvNamespace, KvPage};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// BTreeMap-backed namespace; keys list in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvNamespace {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl MemoryKvNamespace {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvNamespace for MemoryKvNamespace {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        let expires_at = ttl_secs.map(|ttl| Instant::now() + Duration::from_secs(ttl));
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    async fn list(&self, prefix: &str, cursor: Option<String>, limit: usize) -> Result<KvPage> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        let start = match cursor {
            Some(after) => Bound::Excluded(after),
            None => Bound::Included(prefix.to_string()),
        };

        let mut matching = entries
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone());

        let keys: Vec<String> = matching.by_ref().take(limit).collect();
        let has_more = matching.next().is_some();

        Ok(KvPage {
            cursor: if has_more { keys.last().cloned() } else { None },
            keys,
        })
    }
}
