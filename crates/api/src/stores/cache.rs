//! Aggregated interaction counters (`interactions:<slug>`).

use std::sync::Arc;

use anyhow::{Context, Result};

use super::kv::{KvNamespace, list_all};
use crate::interactions::SeriesInteractions;

const CACHE_PREFIX: &str = "interactions:";

#[derive(Clone)]
pub struct InteractionCache {
    ns: Arc<dyn KvNamespace>,
}

impl InteractionCache {
    pub fn new(ns: Arc<dyn KvNamespace>) -> Self {
        Self { ns }
    }

    fn key(series_slug: &str) -> String {
        format!("{}{}", CACHE_PREFIX, series_slug)
    }

    /// Cached counters of a series; empty when nothing was aggregated yet.
    pub async fn load(&self, series_slug: &str) -> Result<SeriesInteractions> {
        match self.ns.get(&Self::key(series_slug)).await? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("corrupt interactions cache for {series_slug}")),
            None => Ok(SeriesInteractions::default()),
        }
    }

    pub async fn store(&self, series_slug: &str, interactions: &SeriesInteractions) -> Result<()> {
        let json = serde_json::to_string(interactions)?;
        self.ns.put(&Self::key(series_slug), &json, None).await
    }

    /// Slugs of every series with cached counters.
    pub async fn series(&self) -> Result<Vec<String>> {
        let keys = list_all(self.ns.as_ref(), CACHE_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(CACHE_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::Action;
    use crate::stores::MemoryKvNamespace;

    #[tokio::test]
    async fn missing_entry_loads_empty() {
        let cache = InteractionCache::new(Arc::new(MemoryKvNamespace::new()));
        assert_eq!(cache.load("blue-box").await.unwrap(), SeriesInteractions::default());
    }

    #[tokio::test]
    async fn store_then_load_and_list() {
        let cache = InteractionCache::new(Arc::new(MemoryKvNamespace::new()));
        let mut interactions = SeriesInteractions::default();
        interactions.apply(&Action::Like {
            chapter: "1".into(),
        });

        cache.store("blue-box", &interactions).await.unwrap();

        assert_eq!(cache.load("blue-box").await.unwrap(), interactions);
        assert_eq!(cache.series().await.unwrap(), vec!["blue-box"]);
    }

    #[tokio::test]
    async fn corrupt_entry_is_an_error() {
        let ns = Arc::new(MemoryKvNamespace::new());
        ns.put("interactions:blue-box", "not json", None).await.unwrap();

        assert!(InteractionCache::new(ns).load("blue-box").await.is_err());
    }
}
