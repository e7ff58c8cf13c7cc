//! One-shot markers (`cleaned:<sessionId>`) telling a client its queued actions
//! reached the server and can be dropped from local storage.

use std::sync::Arc;

use anyhow::Result;

use super::kv::KvNamespace;

#[derive(Clone)]
pub struct CleanupMarkers {
    ns: Arc<dyn KvNamespace>,
    ttl_secs: u64,
}

impl CleanupMarkers {
    pub fn new(ns: Arc<dyn KvNamespace>, ttl_secs: u64) -> Self {
        Self { ns, ttl_secs }
    }

    fn key(session_id: &str) -> String {
        format!("cleaned:{}", session_id)
    }

    pub async fn mark(&self, session_id: &str) -> Result<()> {
        self.ns
            .put(&Self::key(session_id), "true", Some(self.ttl_secs))
            .await
    }

    /// Returns whether a marker existed, deleting it so it is only seen once.
    pub async fn consume(&self, session_id: &str) -> Result<bool> {
        let key = Self::key(session_id);
        if self.ns.get(&key).await?.is_none() {
            return Ok(false);
        }
        self.ns.delete(&key).await?;
        Ok(true)
    }
}
