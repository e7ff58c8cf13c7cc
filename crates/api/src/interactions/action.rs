use serde::{Deserialize, Serialize};

/// Prefix of episode item ids (`ep-S<season>-<number>`).
pub const EPISODE_PREFIX: &str = "ep-";

/// A sanitized reader action as written to the interaction log.
///
/// Serialized as `{ "type": ..., "chapter": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Like { chapter: String },
    Unlike { chapter: String },
    Rate { payload: Rating },
    AddComment { chapter: String, payload: Comment },
    LikeComment { chapter: String, payload: CommentTarget },
    UnlikeComment { chapter: String, payload: CommentTarget },
}

impl Action {
    /// Chapter or episode id the action targets (ratings target the series).
    pub fn chapter(&self) -> Option<&str> {
        match self {
            Action::Like { chapter }
            | Action::Unlike { chapter }
            | Action::AddComment { chapter, .. }
            | Action::LikeComment { chapter, .. }
            | Action::UnlikeComment { chapter, .. } => Some(chapter),
            Action::Rate { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Like { .. } => "like",
            Action::Unlike { .. } => "unlike",
            Action::Rate { .. } => "rate",
            Action::AddComment { .. } => "add_comment",
            Action::LikeComment { .. } => "like_comment",
            Action::UnlikeComment { .. } => "unlike_comment",
        }
    }
}

/// Whether an item id designates an episode rather than a chapter.
pub fn is_episode(item: &str) -> bool {
    item.starts_with(EPISODE_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    pub comment: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub likes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTarget {
    pub comment_id: String,
}
