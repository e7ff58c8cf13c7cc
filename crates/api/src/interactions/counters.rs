//! Aggregated per-series interaction counters (`interactions:<slug>`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::{Action, Comment, is_episode};

/// Counters for one chapter or episode. Episodes carry no comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCounters {
    #[serde(default)]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl ItemCounters {
    fn for_item(item: &str) -> Self {
        Self {
            likes: 0,
            comments: (!is_episode(item)).then(Vec::new),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    #[serde(default)]
    pub count: u64,
    /// Running sum of every rating; the average is derived from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

impl RatingStats {
    /// Running total, reconstructed from `average * count` for entries written
    /// before the total was persisted.
    fn running_total(&self) -> f64 {
        match (self.total, self.average) {
            (Some(total), _) => total,
            (None, Some(average)) => average * self.count as f64,
            (None, None) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<RatingStats>,
}

/// Cached interactions of one series: item id → counters, plus series stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInteractions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SeriesStats>,
    #[serde(flatten)]
    pub items: BTreeMap<String, ItemCounters>,
}

impl SeriesInteractions {
    /// Folds one action into the counters.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Like { chapter } => {
                let item = self.item_mut(chapter);
                item.likes = item.likes.saturating_add(1);
            }
            Action::Unlike { chapter } => {
                let item = self.item_mut(chapter);
                item.likes = item.likes.saturating_sub(1);
            }
            Action::Rate { payload } => {
                let ratings = self
                    .stats
                    .get_or_insert_with(SeriesStats::default)
                    .ratings
                    .get_or_insert_with(RatingStats::default);
                ratings.total = Some(ratings.running_total() + payload.value);
                ratings.count += 1;
            }
            Action::AddComment { chapter, payload } => {
                if let Some(comments) = self.item_mut(chapter).comments.as_mut()
                    && !comments.iter().any(|c| c.id == payload.id)
                {
                    comments.push(payload.clone());
                }
            }
            Action::LikeComment { chapter, payload } | Action::UnlikeComment { chapter, payload } => {
                let like = matches!(action, Action::LikeComment { .. });
                if let Some(comment) = self
                    .item_mut(chapter)
                    .comments
                    .as_mut()
                    .and_then(|comments| comments.iter_mut().find(|c| c.id == payload.comment_id))
                {
                    comment.likes = if like {
                        comment.likes.saturating_add(1)
                    } else {
                        comment.likes.saturating_sub(1)
                    };
                }
            }
        }
    }

    /// Recomputes the rating average as `round(total / count, 2)`.
    pub fn finalize_ratings(&mut self) {
        if let Some(ratings) = self.stats.as_mut().and_then(|s| s.ratings.as_mut())
            && ratings.count > 0
        {
            let total = ratings.running_total();
            ratings.total = Some(total);
            ratings.average = Some(round2(total / ratings.count as f64));
        }
    }

    /// Removes a comment, returning whether it existed.
    pub fn remove_comment(&mut self, chapter: &str, comment_id: &str) -> bool {
        let Some(comments) = self
            .items
            .get_mut(chapter)
            .and_then(|item| item.comments.as_mut())
        else {
            return false;
        };

        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        comments.len() != before
    }

    fn item_mut(&mut self, item: &str) -> &mut ItemCounters {
        let counters = self
            .items
            .entry(item.to_string())
            .or_insert_with(|| ItemCounters::for_item(item));
        if counters.comments.is_none() && !is_episode(item) {
            counters.comments = Some(Vec::new());
        }
        counters
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
