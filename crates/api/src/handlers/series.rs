//! Series data endpoints.
//!
//! - GET /data/series - Index of every series with its latest chapter/episode
//! - GET /data/series/{slug} - Full descriptor of one series
//!
//! Chapter `source` and episode `sources` (hosting details) are never exposed.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::{Map, Number, Value, json};

use crate::{
    catalog::Recommendation,
    error::AppError,
    models::{SeriesDescriptor, SeriesEntry},
    slug::slugify,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(series_index))
        .route("/{slug}", get(series_detail))
}

fn without(value: Value, field: &str) -> Value {
    match value {
        Value::Object(mut map) => {
            map.remove(field);
            Value::Object(map)
        }
        other => other,
    }
}

fn chapter_number(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn last_chapter(series: &SeriesDescriptor) -> Value {
    let latest = series
        .chapters
        .iter()
        .filter_map(|(key, chapter)| chapter_number(key).map(|n| (n, chapter)))
        .max_by(|a, b| a.0.total_cmp(&b.0));

    let mut out = Map::new();
    match latest {
        Some((number, chapter)) => {
            out.insert("number".into(), number_value(number));
            if let Ok(Value::Object(fields)) = serde_json::to_value(chapter) {
                out.extend(fields);
            }
            out.remove("source");
        }
        None => {
            out.insert("number".into(), Value::from(0));
        }
    }
    Value::Object(out)
}

fn summary(entry: &SeriesEntry) -> Value {
    let series = &entry.data;
    let cover = series
        .covers
        .first()
        .cloned()
        .map(|c| without(c, "volume"))
        .unwrap_or_else(|| json!({}));
    let last_episode = series
        .episodes
        .last()
        .and_then(|ep| serde_json::to_value(ep).ok())
        .map(|ep| without(ep, "sources"));

    let mut out = json!({
        "title": series.title,
        "slug": series.slug(),
        "cover": cover,
        "os": series.os,
        "tags": series.tags,
        "description": series.description.clone().unwrap_or_default(),
        "status": series.status,
        "last_chapter": last_chapter(series),
    });
    if let (Some(ep), Value::Object(map)) = (last_episode, &mut out) {
        map.insert("last_episode".into(), ep);
    }
    out
}

fn recommendation(reco: &Recommendation, entries: &[SeriesEntry]) -> Option<Value> {
    let Some(entry) = entries.iter().find(|e| e.filename == reco.file) else {
        tracing::warn!(file = %reco.file, "recommended series is not in the catalog");
        return None;
    };

    let mut out = summary(entry);
    if let Value::Object(map) = &mut out {
        let image = reco
            .character_image
            .clone()
            .unwrap_or_else(|| format!("/img/reco/{}.png", entry.file_stem()));
        map.insert("character_image".into(), Value::String(image));
        map.insert("color".into(), reco.color.clone().unwrap_or(Value::Null));
    }
    Some(out)
}

#[debug_handler]
async fn series_index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = state.catalog.all().await?;
    let reco = state.catalog.recommendations().await?;

    let (os, series): (Vec<_>, Vec<_>) = entries.iter().partition(|e| e.data.os);

    Ok(Json(json!({
        "series": series.into_iter().map(summary).collect::<Vec<_>>(),
        "os": os.into_iter().map(summary).collect::<Vec<_>>(),
        "reco": reco.iter().filter_map(|r| recommendation(r, &entries)).collect::<Vec<_>>(),
        "slugs": entries.iter().map(|e| e.data.slug()).collect::<Vec<_>>(),
    })))
}

#[debug_handler]
async fn series_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slug = slugify(&slug);
    let entry = state
        .catalog
        .all()
        .await?
        .into_iter()
        .find(|e| e.data.slug() == slug)
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Series not found"))?;

    let mut body = serde_json::to_value(&entry.data)?;
    if let Value::Object(map) = &mut body {
        map.insert("slug".into(), Value::String(entry.data.slug()));

        if let Some(Value::Object(chapters)) = map.get_mut("chapters") {
            for chapter in chapters.values_mut() {
                if let Value::Object(fields) = chapter {
                    fields.remove("source");
                }
            }
        }
        if let Some(Value::Array(episodes)) = map.get_mut("episodes") {
            for episode in episodes {
                if let Value::Object(fields) = episode {
                    fields.remove("sources");
                }
            }
        }
    }

    Ok(Json(body))
}
