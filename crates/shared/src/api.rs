//! Shared API request/response types used by both the admin CLI and the API server.

use std::{fmt, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Max actions accepted in one log-action batch.
pub const MAX_ACTIONS_PER_BATCH: usize = 100;

/// A batch of reader actions queued client-side for one series.
///
/// Actions are kept as raw JSON: each one is sanitized individually on the
/// server and invalid ones are dropped without failing the whole batch.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogActionPayload {
    #[garde(length(min = 1, max = 200))]
    pub series_slug: String,
    #[garde(length(min = 1, max = MAX_ACTIONS_PER_BATCH))]
    pub actions: Vec<Value>,
    /// Lets the client confirm its queue was flushed (see check-cleanup-status).
    #[garde(length(min = 1, max = 128))]
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Returned after a batch was logged.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogActionResponse {
    pub success: bool,
    pub logged: usize,
}

/// Query string of GET /api/check-cleanup-status.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatusQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupStatusResponse {
    pub cleaned: bool,
}

/// Query string of GET /api/series-stats.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeriesStatsQuery {
    pub slug: String,
}

/// Key-value namespaces exposed to admin tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Namespace {
    /// Pending interaction logs, IP locks and cleanup markers.
    InteractionsLog,
    /// Aggregated per-series counters.
    InteractionsCache,
    /// Image host cache.
    ImgChestCache,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::InteractionsLog,
        Namespace::InteractionsCache,
        Namespace::ImgChestCache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::InteractionsLog => "INTERACTIONS_LOG",
            Namespace::InteractionsCache => "INTERACTIONS_CACHE",
            Namespace::ImgChestCache => "IMG_CHEST_CACHE",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNamespace(pub String);

impl fmt::Display for UnknownNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown namespace: {}", self.0)
    }
}

impl std::error::Error for UnknownNamespace {}

impl FromStr for Namespace {
    type Err = UnknownNamespace;

    /// Namespace names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == upper)
            .ok_or_else(|| UnknownNamespace(s.to_string()))
    }
}

/// Query string of GET /api/admin/kv-viewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct KvViewerQuery {
    pub namespace: String,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvItem {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvViewerResponse {
    pub namespace: Namespace,
    pub count: usize,
    pub items: Vec<KvItem>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteKeyPayload {
    #[garde(length(min = 1))]
    pub namespace: String,
    #[garde(length(min = 1, max = 512))]
    pub key: String,
}

/// Generic admin acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminMessage {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearLogsResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[garde(length(min = 1, max = 128))]
    pub username: String,
    #[garde(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

/// A cached comment with the series/chapter it belongs to, for moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratedComment {
    pub series_slug: String,
    pub chapter_number: String,
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    pub comment: String,
    pub timestamp: i64,
    pub likes: u64,
}

/// Identifies one cached comment to delete.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRef {
    #[garde(length(min = 1))]
    pub comment_id: String,
    #[garde(length(min = 1))]
    pub series_slug: String,
    #[garde(length(min = 1))]
    pub chapter_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub success: bool,
    pub deleted: usize,
}
