//! Redis-backed KV namespaces.
//!
//! All namespaces share one Redis client; each one owns a key prefix so that
//! listing and clearing stay scoped to it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use shared::api::Namespace;

use super::kv::{KvNamespace, KvPage};

/// Redis implementation of KvNamespace.
#[derive(Clone)]
pub struct RedisKvNamespace {
    client: redis::Client,
    prefix: String,
}

impl RedisKvNamespace {
    pub fn new(client: redis::Client, namespace: Namespace) -> Self {
        Self {
            client,
            prefix: format!("{}:", namespace.as_str().to_ascii_lowercase()),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn match_pattern(&self, prefix: &str) -> String {
        let mut pattern = String::with_capacity(self.prefix.len() + prefix.len() + 1);
        for c in self.prefix.chars().chain(prefix.chars()) {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('*');
        pattern
    }
}

#[async_trait]
impl KvNamespace for RedisKvNamespace {
    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.full_key(key);

        match ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(&key, value, ttl).await?;
            }
            None => {
                let _: () = conn.set(&key, value).await?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let deleted: i64 = conn.del(self.full_key(key)).await?;
        Ok(deleted > 0)
    }

    async fn list(&self, prefix: &str, cursor: Option<String>, limit: usize) -> Result<KvPage> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let start: u64 = match cursor {
            Some(c) => c.parse().with_context(|| format!("invalid scan cursor {c:?}"))?,
            None => 0,
        };

        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(start)
            .arg("MATCH")
            .arg(self.match_pattern(prefix))
            .arg("COUNT")
            .arg(limit)
            .query_async(&mut conn)
            .await?;

        let mut keys: Vec<String> = keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect();
        keys.sort();

        Ok(KvPage {
            keys,
            cursor: (next != 0).then(|| next.to_string()),
        })
    }
}
