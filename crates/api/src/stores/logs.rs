//! Pending interaction logs (`log:<slug>:<ip>:<uniqueId>`).

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;

use super::kv::{KvNamespace, list_all};
use crate::interactions::Action;

const LOG_PREFIX: &str = "log:";
const UNKNOWN_IP: &str = "unknown";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Parsed log entry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey {
    pub series_slug: String,
    /// `None` when the submitting IP was unknown.
    pub client_ip: Option<String>,
    pub unique_id: String,
}

impl LogKey {
    /// Fresh key: `<unix millis>-<9 random base36 chars>`.
    pub fn generate(series_slug: &str, client_ip: Option<&str>) -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..9)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();

        Self {
            series_slug: series_slug.to_string(),
            client_ip: client_ip.map(str::to_string),
            unique_id: format!("{}-{}", Utc::now().timestamp_millis(), suffix),
        }
    }

    /// Parses `log:<slug>:<ip>:<id>`. The IP may contain colons (IPv6).
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(LOG_PREFIX)?;
        let (slug, rest) = rest.split_once(':')?;
        let (ip, unique_id) = rest.rsplit_once(':')?;

        if slug.is_empty() || ip.is_empty() || unique_id.is_empty() {
            return None;
        }

        Some(Self {
            series_slug: slug.to_string(),
            client_ip: (ip != UNKNOWN_IP).then(|| ip.to_string()),
            unique_id: unique_id.to_string(),
        })
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}:{}",
            LOG_PREFIX,
            self.series_slug,
            self.client_ip.as_deref().unwrap_or(UNKNOWN_IP),
            self.unique_id
        )
    }
}

/// The INTERACTIONS_LOG namespace seen as a queue of pending entries.
#[derive(Clone)]
pub struct InteractionLog {
    ns: Arc<dyn KvNamespace>,
}

impl InteractionLog {
    pub fn new(ns: Arc<dyn KvNamespace>) -> Self {
        Self { ns }
    }

    /// Writes one entry holding a batch of sanitized actions.
    pub async fn append(
        &self,
        series_slug: &str,
        client_ip: Option<&str>,
        actions: &[Action],
    ) -> Result<LogKey> {
        let key = LogKey::generate(series_slug, client_ip);
        let json = serde_json::to_string(actions)?;
        self.ns.put(&key.to_string(), &json, None).await?;
        Ok(key)
    }

    /// Every pending entry key, in key order. Unparseable keys are skipped.
    pub async fn pending(&self) -> Result<Vec<LogKey>> {
        let keys = list_all(self.ns.as_ref(), LOG_PREFIX).await?;

        Ok(keys
            .iter()
            .filter_map(|raw| {
                let parsed = LogKey::parse(raw);
                if parsed.is_none() {
                    tracing::warn!(key = %raw, "ignoring malformed log key");
                }
                parsed
            })
            .collect())
    }

    /// Raw JSON of an entry.
    pub async fn read(&self, key: &LogKey) -> Result<Option<String>> {
        self.ns.get(&key.to_string()).await
    }

    pub async fn remove(&self, key: &LogKey) -> Result<bool> {
        self.ns.delete(&key.to_string()).await
    }

    /// Deletes every key of the namespace (entries, locks and markers alike).
    pub async fn clear(&self) -> Result<usize> {
        let keys = list_all(self.ns.as_ref(), "").await?;
        for key in &keys {
            self.ns.delete(key).await?;
        }
        Ok(keys.len())
    }
}
