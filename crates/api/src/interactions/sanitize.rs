//! Validation of client-submitted actions against the series they target.
//!
//! Clients are untrusted: every action is rebuilt from the fields we expect,
//! and anything that does not check out is dropped.

use std::fmt;

use serde_json::Value;

use super::action::{Action, Comment, CommentTarget, Rating};
use crate::models::SeriesDescriptor;

pub const AVATAR_URL_PREFIX: &str = "/img/profilpicture/";

const MAX_COMMENT_CHARS: usize = 1000;
/// Comments may predate the chapter release by this much (clock skew, early readers).
const EARLY_COMMENT_TOLERANCE_MS: i64 = 15 * 60 * 1000;
/// Comments may be stamped this far in the future.
const FUTURE_COMMENT_TOLERANCE_MS: i64 = 5 * 60 * 1000;

/// What a submitted action is checked against.
pub struct SanitizeContext<'a> {
    pub series: &'a SeriesDescriptor,
    /// Avatar filenames from `avatars.json`.
    pub avatars: &'a [String],
    /// Current time, unix milliseconds.
    pub now_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownType(String),
    UnknownChapter,
    InvalidRating,
    InvalidCommentTarget,
    MalformedComment,
    UnknownIdentity,
    InvalidCommentId,
    ImplausibleTimestamp,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownType(t) => write!(f, "unknown interaction type {t:?}"),
            Rejection::UnknownChapter => f.write_str("chapter does not exist"),
            Rejection::InvalidRating => f.write_str("rating must be a number between 1 and 10"),
            Rejection::InvalidCommentTarget => f.write_str("invalid comment like/unlike"),
            Rejection::MalformedComment => f.write_str("malformed comment"),
            Rejection::UnknownIdentity => f.write_str("username/avatar pair is not a known identity"),
            Rejection::InvalidCommentId => f.write_str("invalid comment id format"),
            Rejection::ImplausibleTimestamp => f.write_str("comment posted at an implausible date"),
        }
    }
}

/// Sanitizes one raw action, logging and dropping it when invalid.
pub fn sanitize(raw: &Value, ctx: &SanitizeContext<'_>) -> Option<Action> {
    match check(raw, ctx) {
        Ok(action) => Some(action),
        Err(reason) => {
            tracing::warn!(%reason, action = %raw, "malformed interaction ignored");
            None
        }
    }
}

pub(crate) fn check(raw: &Value, ctx: &SanitizeContext<'_>) -> Result<Action, Rejection> {
    let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default();
    let chapter = raw.get("chapter").and_then(Value::as_str);
    let payload = raw.get("payload");

    match kind {
        "like" | "unlike" => {
            let chapter = chapter
                .filter(|c| ctx.series.has_chapter(c) || ctx.series.has_episode(c))
                .ok_or(Rejection::UnknownChapter)?
                .to_string();
            Ok(if kind == "like" {
                Action::Like { chapter }
            } else {
                Action::Unlike { chapter }
            })
        }
        "rate" => {
            let value = payload
                .and_then(|p| p.get("value"))
                .and_then(Value::as_f64)
                .filter(|v| (1.0..=10.0).contains(v))
                .ok_or(Rejection::InvalidRating)?;
            Ok(Action::Rate {
                payload: Rating { value },
            })
        }
        "like_comment" | "unlike_comment" => {
            let chapter = existing_chapter(chapter, ctx)?;
            let comment_id = payload
                .and_then(|p| p.get("commentId"))
                .and_then(Value::as_str)
                .ok_or(Rejection::InvalidCommentTarget)?
                .to_string();
            let payload = CommentTarget { comment_id };
            Ok(if kind == "like_comment" {
                Action::LikeComment { chapter, payload }
            } else {
                Action::UnlikeComment { chapter, payload }
            })
        }
        "add_comment" => {
            let chapter = existing_chapter(chapter, ctx)?;
            let payload = check_comment(&chapter, payload, ctx)?;
            Ok(Action::AddComment { chapter, payload })
        }
        other => Err(Rejection::UnknownType(other.to_string())),
    }
}

fn existing_chapter(chapter: Option<&str>, ctx: &SanitizeContext<'_>) -> Result<String, Rejection> {
    chapter
        .filter(|c| ctx.series.has_chapter(c))
        .map(str::to_string)
        .ok_or(Rejection::UnknownChapter)
}

fn check_comment(
    chapter: &str,
    payload: Option<&Value>,
    ctx: &SanitizeContext<'_>,
) -> Result<Comment, Rejection> {
    let payload = payload.ok_or(Rejection::MalformedComment)?;
    let field = |name: &str| payload.get(name).and_then(Value::as_str);

    let (Some(id), Some(username), Some(avatar_url), Some(comment)) = (
        field("id"),
        field("username"),
        field("avatarUrl"),
        field("comment"),
    ) else {
        return Err(Rejection::MalformedComment);
    };
    let timestamp = payload
        .get("timestamp")
        .and_then(integer_millis)
        .ok_or(Rejection::MalformedComment)?;

    if !avatar_url.starts_with(AVATAR_URL_PREFIX) {
        return Err(Rejection::MalformedComment);
    }

    let comment = comment.trim();
    if comment.is_empty() || comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(Rejection::MalformedComment);
    }

    let known_identity = ctx.avatars.iter().any(|avatar| {
        let (name, url) = identity_from_avatar(avatar);
        name == username && url == avatar_url
    });
    if !known_identity {
        return Err(Rejection::UnknownIdentity);
    }

    if comment_id_timestamp(id) != Some(timestamp) {
        return Err(Rejection::InvalidCommentId);
    }

    // Unknown release dates leave only the upper bound.
    let released_at = ctx.series.chapters.get(chapter).and_then(|c| c.released_at_ms());
    let too_early = released_at.is_some_and(|r| timestamp < r - EARLY_COMMENT_TOLERANCE_MS);
    if too_early || timestamp > ctx.now_ms + FUTURE_COMMENT_TOLERANCE_MS {
        return Err(Rejection::ImplausibleTimestamp);
    }

    Ok(Comment {
        id: id.to_string(),
        username: username.to_string(),
        avatar_url: avatar_url.to_string(),
        comment: comment.to_string(),
        timestamp,
        likes: 0,
    })
}

/// Username and avatar URL a visitor gets for an avatar file.
pub fn identity_from_avatar(filename: &str) -> (String, String) {
    let username = filename
        .replace(".jpg", "")
        .replace(".png", "")
        .replace('_', " ");
    (username, format!("{AVATAR_URL_PREFIX}{filename}"))
}

/// Comment ids are `<13-digit unix millis>_<7 chars>`; returns the millis part.
fn comment_id_timestamp(id: &str) -> Option<i64> {
    let mut parts = id.split('_');
    let millis = parts.next()?;
    let suffix = parts.next()?;

    if millis.len() != 13 || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if suffix.chars().count() != 7 {
        return None;
    }
    millis.parse().ok()
}

fn integer_millis(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}
