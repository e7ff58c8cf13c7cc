//! Admin endpoints.
//!
//! - POST /api/admin/login - Exchange username/password for the admin token
//! - GET /api/admin/kv-viewer - Browse a KV namespace, 100 keys per page
//! - POST /api/admin/delete-kv-key - Delete one key of a namespace
//! - POST /api/admin/clear-logs - Drop every pending log entry, lock and marker
//! - GET /api/admin/comments - Every cached comment, newest first
//! - POST /api/admin/batch-delete - Remove comments from the cache
//!
//! Everything except login requires `Authorization: Bearer <admin_token>`.

use std::collections::BTreeMap;

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use sha2::{Digest, Sha256};
use shared::api::{
    AdminMessage, BatchDeleteResponse, ClearLogsResponse, CommentRef, DeleteKeyPayload, KvItem,
    KvViewerQuery, KvViewerResponse, LoginPayload, LoginResponse, ModeratedComment, Namespace,
};

use crate::{error::AppError, middleware::auth::AdminAuth, state::AppState};

pub const KV_VIEWER_PAGE_SIZE: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/kv-viewer", get(kv_viewer))
        .route("/delete-kv-key", post(delete_kv_key))
        .route("/clear-logs", post(clear_logs))
        .route("/comments", get(list_comments))
        .route("/batch-delete", post(batch_delete))
}

fn digest_eq(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}

fn parse_namespace(raw: &str) -> Result<Namespace, AppError> {
    raw.parse()
        .map_err(|e: shared::api::UnknownNamespace| AppError::Validation(e.to_string()))
}

#[debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (Some(username), Some(password)) = (
        state.config.admin_username.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        tracing::warn!("admin login attempted but no credentials are configured");
        return Err(AppError::External(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
        ));
    };

    // Both comparisons always run.
    let user_ok = digest_eq(&payload.username, username);
    let pass_ok = digest_eq(&payload.password, password);
    if !(user_ok && pass_ok) {
        tracing::warn!(username = %payload.username, "admin login failed");
        return Err(AppError::External(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
        ));
    }

    tracing::info!(username = %payload.username, "admin logged in");

    Ok(Json(LoginResponse {
        success: true,
        token: state.config.admin_token.clone(),
    }))
}

#[debug_handler]
async fn kv_viewer(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<KvViewerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let namespace = parse_namespace(&query.namespace)?;
    let ns = state.stores.namespace(namespace);

    let page = ns.list("", query.cursor, KV_VIEWER_PAGE_SIZE).await?;

    let mut items = Vec::with_capacity(page.keys.len());
    for key in page.keys {
        let value = ns.get(&key).await?;
        items.push(KvItem { key, value });
    }

    Ok(Json(KvViewerResponse {
        namespace,
        count: items.len(),
        items,
        has_more: page.cursor.is_some(),
        cursor: page.cursor,
    }))
}

#[debug_handler]
async fn delete_kv_key(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(payload): Json<DeleteKeyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let namespace = parse_namespace(&payload.namespace)?;

    let existed = state.stores.namespace(namespace).delete(&payload.key).await?;
    tracing::info!(%namespace, key = %payload.key, existed, "kv key deleted");

    Ok(Json(AdminMessage {
        success: true,
        message: format!("Key \"{}\" deleted from {namespace}.", payload.key),
    }))
}

#[debug_handler]
async fn clear_logs(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let deleted_count = state.stores.interaction_log().clear().await?;
    tracing::info!(deleted_count, "interaction logs cleared");

    let message = if deleted_count == 0 {
        "No logs to delete.".to_string()
    } else {
        format!("{deleted_count} log key(s) deleted.")
    };

    Ok(Json(ClearLogsResponse {
        success: true,
        message,
        deleted_count,
    }))
}

#[debug_handler]
async fn list_comments(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let cache = state.stores.interaction_cache();
    let mut comments = Vec::new();

    for series_slug in cache.series().await? {
        let interactions = cache.load(&series_slug).await?;
        for (chapter, counters) in &interactions.items {
            for c in counters.comments.iter().flatten() {
                comments.push(ModeratedComment {
                    series_slug: series_slug.clone(),
                    chapter_number: chapter.clone(),
                    id: c.id.clone(),
                    username: c.username.clone(),
                    avatar_url: c.avatar_url.clone(),
                    comment: c.comment.clone(),
                    timestamp: c.timestamp,
                    likes: c.likes,
                });
            }
        }
    }

    comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Ok(Json(comments))
}

#[debug_handler]
async fn batch_delete(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(refs): Json<Vec<CommentRef>>,
) -> Result<impl IntoResponse, AppError> {
    for r in &refs {
        r.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }

    let mut by_series: BTreeMap<&str, Vec<&CommentRef>> = BTreeMap::new();
    for r in &refs {
        by_series.entry(r.series_slug.as_str()).or_default().push(r);
    }

    let _exclusive = state.processor.exclusive().await;
    let cache = state.stores.interaction_cache();
    let mut deleted = 0;

    for (series_slug, refs) in by_series {
        let mut interactions = cache.load(series_slug).await?;
        let removed = refs
            .iter()
            .filter(|r| interactions.remove_comment(&r.chapter_number, &r.comment_id))
            .count();

        if removed > 0 {
            cache.store(series_slug, &interactions).await?;
            deleted += removed;
        }
    }

    tracing::info!(requested = refs.len(), deleted, "comments deleted");

    Ok(Json(BatchDeleteResponse {
        success: true,
        deleted,
    }))
}
