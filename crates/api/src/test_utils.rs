//! Shared test utilities for API handler tests.
//!
//! `TestStateBuilder` assembles an `AppState` over in-memory KV namespaces and
//! a mocked catalog, so each test only configures what it exercises.
//!
//! ```ignore
//! let state = TestStateBuilder::new()
//!     .with_series(sample_series())
//!     .build();
//! ```

use std::sync::Arc;

use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::json;

use crate::catalog::{MockSeriesCatalog, SeriesCatalog};
use crate::config::Config;
use crate::interactions::LogProcessor;
use crate::models::SeriesEntry;
use crate::state::AppState;
use crate::stores::Stores;

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const CRON_SECRET: &str = "cron-secret";

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8788,
        redis_url: None,
        data_dir: "public/data".to_string(),
        admin_token: ADMIN_TOKEN.to_string(),
        admin_username: Some("admin".to_string()),
        admin_password: Some("hunter2".to_string()),
        cron_secret: Some(CRON_SECRET.to_string()),
        process_interval_secs: 0,
        lock_ttl_secs: 300,
        cleanup_ttl_secs: 600,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// "Blue Box" (`Ao_no_Hako.json`) with two chapters and one episode.
pub fn sample_series() -> SeriesEntry {
    SeriesEntry {
        filename: "Ao_no_Hako.json".to_string(),
        data: serde_json::from_value(json!({
            "title": "Blue Box",
            "tags": ["romance"],
            "covers": [{ "url_hq": "/covers/1.jpg", "volume": "1" }],
            "chapters": {
                "1": { "title": "Chiki", "last_updated": "1700000000", "source": { "service": "imgchest", "id": "abc" } },
                "2": { "last_updated": 1700500000 }
            },
            "episodes": [{ "indice_ep": 1, "title": "Ep 1", "sources": ["x"] }]
        }))
        .unwrap(),
    }
}

/// Reads a response body as a string.
pub async fn response_body(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Reads a response body as JSON.
pub async fn response_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&response_body(response).await).unwrap()
}

/// Builder for constructing test `AppState`.
///
/// Without an explicit catalog, a mock serving the configured series and
/// avatars is used.
pub struct TestStateBuilder {
    config: Config,
    stores: Option<Stores>,
    catalog: Option<MockSeriesCatalog>,
    series: Vec<SeriesEntry>,
    avatars: Vec<String>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            stores: None,
            catalog: None,
            series: Vec::new(),
            avatars: vec!["Taiki.png".to_string()],
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn with_catalog(mut self, catalog: MockSeriesCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_series(mut self, entry: SeriesEntry) -> Self {
        self.series.push(entry);
        self
    }

    /// Builds the `AppState` using configured parts or defaults.
    pub fn build(self) -> AppState {
        let stores = self.stores.unwrap_or_else(Stores::in_memory);
        let catalog = self
            .catalog
            .unwrap_or_else(|| static_catalog(self.series, self.avatars));

        AppState {
            processor: LogProcessor::new(stores.clone(), self.config.lock_ttl_secs),
            config: self.config,
            stores,
            catalog: Arc::new(catalog) as Arc<dyn SeriesCatalog>,
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn static_catalog(series: Vec<SeriesEntry>, avatars: Vec<String>) -> MockSeriesCatalog {
    let mut catalog = MockSeriesCatalog::new();

    let all = series.clone();
    catalog.expect_all().returning(move || Ok(all.clone()));
    catalog.expect_find().returning(move |slug| {
        Ok(series.iter().find(|entry| entry.matches_slug(slug)).cloned())
    });
    catalog.expect_avatars().returning(move || Ok(avatars.clone()));
    catalog.expect_recommendations().returning(|| Ok(Vec::new()));
    catalog
}
