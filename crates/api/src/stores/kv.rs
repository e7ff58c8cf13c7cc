//! Key-value namespace abstraction.

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

/// Page size used when draining a listing.
pub const LIST_PAGE_SIZE: usize = 1000;

/// One page of keys from a namespace listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvPage {
    pub keys: Vec<String>,
    /// Continuation cursor, `None` once the listing is complete.
    pub cursor: Option<String>,
}

/// A named key-value bucket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvNamespace: Send + Sync {
    /// Health check - verify the backing store is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get a value by key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, optionally expiring after `ttl_secs`.
    async fn put(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()>;

    /// Delete a key (returns true if it existed).
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List keys starting with `prefix`, resuming from `cursor`.
    async fn list(&self, prefix: &str, cursor: Option<String>, limit: usize) -> Result<KvPage>;
}

/// Drains every page of a listing.
///
/// Backends may repeat a key across pages (Redis SCAN does), so the result is
/// deduplicated and sorted over the whole listing.
pub async fn list_all(ns: &dyn KvNamespace, prefix: &str) -> Result<Vec<String>> {
    let mut keys = BTreeSet::new();
    let mut cursor = None;

    loop {
        let page = ns.list(prefix, cursor, LIST_PAGE_SIZE).await?;
        keys.extend(page.keys);

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(keys.into_iter().collect())
}
