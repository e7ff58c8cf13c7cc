//! Static series catalog served from the data directory.
//!
//! ```text
//! <data_dir>/config.json        { "LOCAL_SERIES_FILES": ["Blue_Box.json", ...] }
//! <data_dir>/series/<file>.json SeriesDescriptor
//! <data_dir>/avatars.json       ["Taiki.png", ...]
//! <data_dir>/reco.json          [{ "file", "characterImage"?, "color"? }] (optional)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{SeriesDescriptor, SeriesEntry};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendation {
    pub file: String,
    #[serde(default, rename = "characterImage")]
    pub character_image: Option<String>,
    #[serde(default)]
    pub color: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SiteConfig {
    #[serde(rename = "LOCAL_SERIES_FILES", default)]
    local_series_files: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeriesCatalog: Send + Sync {
    /// Every readable series, in `config.json` order.
    async fn all(&self) -> Result<Vec<SeriesEntry>>;

    /// Series answering to `slug`, by title or data file name.
    async fn find(&self, slug: &str) -> Result<Option<SeriesEntry>>;

    /// Avatar filenames commenters may pick from.
    async fn avatars(&self) -> Result<Vec<String>>;

    async fn recommendations(&self) -> Result<Vec<Recommendation>>;
}

pub struct FsSeriesCatalog {
    root: PathBuf,
}

impl FsSeriesCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn series_files(&self) -> Result<Vec<String>> {
        let config: SiteConfig = read_json(&self.root.join("config.json")).await?;
        Ok(config.local_series_files)
    }

    async fn load(&self, filename: &str) -> Option<SeriesEntry> {
        let path = self.root.join("series").join(filename);
        match read_json::<SeriesDescriptor>(&path).await {
            Ok(data) => Some(SeriesEntry {
                filename: filename.to_string(),
                data,
            }),
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "skipping unreadable series file");
                None
            }
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[async_trait]
impl SeriesCatalog for FsSeriesCatalog {
    async fn all(&self) -> Result<Vec<SeriesEntry>> {
        let mut entries = Vec::new();
        for file in self.series_files().await? {
            if let Some(entry) = self.load(&file).await {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn find(&self, slug: &str) -> Result<Option<SeriesEntry>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|entry| entry.matches_slug(slug)))
    }

    async fn avatars(&self) -> Result<Vec<String>> {
        read_json(&self.root.join("avatars.json")).await
    }

    async fn recommendations(&self) -> Result<Vec<Recommendation>> {
        let path = self.root.join("reco.json");
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }
        read_json(&path).await
    }
}
