//! Static series descriptors (`<data_dir>/series/*.json`).
//!
//! Only the fields the server reasons about are typed; everything else is kept
//! in `extra` so descriptors are served back unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::slug::slugify;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDescriptor {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    /// One-shot flag.
    #[serde(default)]
    pub os: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub covers: Vec<Value>,
    /// Chapter number (as written in the file, e.g. "12" or "12.5") → chapter.
    #[serde(default)]
    pub chapters: BTreeMap<String, Chapter>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SeriesDescriptor {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn has_chapter(&self, id: &str) -> bool {
        self.chapters.contains_key(id)
    }

    pub fn has_episode(&self, id: &str) -> bool {
        self.episodes.iter().any(|ep| ep.id().as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Release time in unix seconds, as a number or a numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<ReleaseTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chapter {
    /// Release time in unix milliseconds, when it can be parsed.
    pub fn released_at_ms(&self) -> Option<i64> {
        self.last_updated
            .as_ref()
            .and_then(ReleaseTime::seconds)
            .and_then(|s| s.checked_mul(1000))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseTime {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl ReleaseTime {
    pub fn seconds(&self) -> Option<i64> {
        match self {
            ReleaseTime::Seconds(s) => Some(*s),
            ReleaseTime::Fractional(f) if f.is_finite() => Some(f.trunc() as i64),
            ReleaseTime::Fractional(_) => None,
            ReleaseTime::Text(t) => {
                let digits: String = t
                    .trim()
                    .chars()
                    .enumerate()
                    .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
                    .map(|(_, c)| c)
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saison_ep: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indice_ep: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Episode {
    /// Interaction id of the episode: `ep-S<season>-<index>`, season defaulting to 1.
    pub fn id(&self) -> Option<String> {
        let index = self.indice_ep.as_ref()?;
        let season = self
            .saison_ep
            .as_ref()
            .filter(|s| s.as_f64().is_some_and(|v| v != 0.0))
            .map(Number::to_string)
            .unwrap_or_else(|| "1".to_string());
        Some(format!("ep-S{season}-{index}"))
    }
}

/// A descriptor together with the data file it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub filename: String,
    pub data: SeriesDescriptor,
}

impl SeriesEntry {
    pub fn file_stem(&self) -> &str {
        self.filename.strip_suffix(".json").unwrap_or(&self.filename)
    }

    /// Whether the entry answers to `slug`, by title or by data file name.
    pub fn matches_slug(&self, slug: &str) -> bool {
        self.data.slug() == slug || slugify(self.file_stem()) == slug
    }
}
