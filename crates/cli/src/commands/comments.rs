//! Comment moderation.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use chrono_humanize::HumanTime;
use shared::api::{CommentRef, ModeratedComment};
use tabled::{Table, Tabled, settings::Style};

use crate::{api::Api, config::Config, credentials, ui};

const COMMENT_WIDTH: usize = 60;

#[derive(Tabled)]
struct CommentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Ch.")]
    chapter: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Posted")]
    posted: String,
    #[tabled(rename = "Likes")]
    likes: u64,
    #[tabled(rename = "Comment")]
    comment: String,
}

fn row(c: ModeratedComment) -> CommentRow {
    let posted = Utc
        .timestamp_millis_opt(c.timestamp)
        .single()
        .map(|t| HumanTime::from(t).to_string())
        .unwrap_or_else(|| c.timestamp.to_string());

    CommentRow {
        id: c.id,
        series: c.series_slug,
        chapter: c.chapter_number,
        author: c.username,
        posted,
        likes: c.likes,
        comment: ui::truncate(&c.comment, COMMENT_WIDTH),
    }
}

pub async fn list(config: &Config, series: Option<String>) -> Result<()> {
    let token = credentials::get_admin_token(config)?;
    let api = Api::new(config.api_url.clone());

    let comments = ui::spin("Fetching comments...", api.comments(token)).await?;
    let comments: Vec<_> = comments
        .into_iter()
        .filter(|c| series.as_deref().is_none_or(|s| c.series_slug == s))
        .collect();

    if comments.is_empty() {
        println!("No comments to moderate");
        return Ok(());
    }

    let rows: Vec<CommentRow> = comments.into_iter().map(row).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

pub async fn delete(
    config: &Config,
    series_slug: String,
    chapter_number: String,
    ids: Vec<String>,
) -> Result<()> {
    let token = credentials::get_admin_token(config)?;
    let api = Api::new(config.api_url.clone());

    let requested = ids.len();
    let refs = ids
        .into_iter()
        .map(|comment_id| CommentRef {
            comment_id,
            series_slug: series_slug.clone(),
            chapter_number: chapter_number.clone(),
        })
        .collect();

    let response = ui::spin("Deleting comments...", api.delete_comments(token, refs)).await?;

    if response.deleted == requested {
        ui::success(&format!("Deleted {} comment(s)", response.deleted));
    } else {
        ui::info(&format!(
            "Deleted {} of {requested} comment(s); the others were not found",
            response.deleted
        ));
    }

    Ok(())
}
