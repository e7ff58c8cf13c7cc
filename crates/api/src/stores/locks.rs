//! Per-IP submission locks (`lock:<ip>`).
//!
//! A courtesy rate limit: one accepted batch per IP until the lock expires or
//! the next aggregation run releases it.

use std::sync::Arc;

use anyhow::Result;

use super::kv::KvNamespace;

#[derive(Clone)]
pub struct IpLocks {
    ns: Arc<dyn KvNamespace>,
    ttl_secs: u64,
}

impl IpLocks {
    pub fn new(ns: Arc<dyn KvNamespace>, ttl_secs: u64) -> Self {
        Self { ns, ttl_secs }
    }

    pub fn key(ip: &str) -> String {
        format!("lock:{}", ip)
    }

    pub async fn is_locked(&self, ip: &str) -> Result<bool> {
        Ok(self.ns.get(&Self::key(ip)).await?.is_some())
    }

    pub async fn lock(&self, ip: &str) -> Result<()> {
        self.ns.put(&Self::key(ip), "true", Some(self.ttl_secs)).await
    }

    pub async fn release(&self, ip: &str) -> Result<bool> {
        self.ns.delete(&Self::key(ip)).await
    }
}
