//! Public interaction endpoints.
//!
//! - POST /api/log-action - Queue a batch of reader actions for aggregation
//! - GET /api/check-cleanup-status - Whether a client session's batch was logged
//! - GET /api/series-stats - Aggregated interactions of one series
//!
//! Ingestion never touches the aggregated cache: batches are appended to the
//! interaction log and folded in later by the processor. An IP that just
//! logged is locked out until its lock expires or the processor runs.

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use garde::Validate;
use serde_json::Value;
use shared::api::{
    CleanupStatusQuery, CleanupStatusResponse, LogActionPayload, LogActionResponse,
    SeriesStatsQuery,
};

use crate::{
    error::AppError,
    interactions::{Action, SanitizeContext, sanitize},
    middleware::client_ip::ClientIp,
    slug::slugify,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/log-action", post(log_action))
        .route("/check-cleanup-status", get(check_cleanup_status))
        .route("/series-stats", get(series_stats))
}

fn needs_avatars(actions: &[Value]) -> bool {
    actions
        .iter()
        .any(|a| a.get("type").and_then(Value::as_str) == Some("add_comment"))
}

#[debug_handler]
async fn log_action(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LogActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let locks = state.stores.ip_locks(state.config.lock_ttl_secs);

    if let Some(ip) = &ip {
        match locks.is_locked(ip).await {
            Ok(true) => {
                tracing::info!(ip = %ip, "client is locked, rejecting batch");
                return Err(AppError::External(
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests, please wait before sending more actions",
                ));
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(ip = %ip, error = %e, "lock check failed, continuing"),
        }
    }

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let requested = slugify(&payload.series_slug);
    if requested.is_empty() {
        return Err(AppError::Validation("seriesSlug is empty".into()));
    }

    let entry = state
        .catalog
        .find(&requested)
        .await?
        .ok_or(AppError::External(StatusCode::BAD_REQUEST, "Unknown series"))?;
    let series_slug = entry.data.slug();

    // Without the avatar list no comment can be validated; the rest of the
    // batch still goes through.
    let avatars = if needs_avatars(&payload.actions) {
        state.catalog.avatars().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "avatar list unavailable, dropping comments");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let ctx = SanitizeContext {
        series: &entry.data,
        avatars: &avatars,
        now_ms: Utc::now().timestamp_millis(),
    };
    let actions: Vec<Action> = payload
        .actions
        .iter()
        .filter_map(|raw| sanitize(raw, &ctx))
        .collect();

    if actions.is_empty() {
        return Err(AppError::External(
            StatusCode::BAD_REQUEST,
            "No valid actions",
        ));
    }

    if let Some(ip) = &ip
        && let Err(e) = locks.lock(ip).await
    {
        tracing::warn!(ip = %ip, error = %e, "failed to set client lock");
    }

    state
        .stores
        .interaction_log()
        .append(&series_slug, ip.as_deref(), &actions)
        .await?;

    if let Some(session_id) = &payload.session_id
        && let Err(e) = state
            .stores
            .cleanup_markers(state.config.cleanup_ttl_secs)
            .mark(session_id)
            .await
    {
        tracing::warn!(session_id = %session_id, error = %e, "failed to mark session as cleaned");
    }

    tracing::info!(
        series = %series_slug,
        ip = ip.as_deref().unwrap_or("unknown"),
        logged = actions.len(),
        dropped = payload.actions.len() - actions.len(),
        "interaction batch logged"
    );

    Ok(Json(LogActionResponse {
        success: true,
        logged: actions.len(),
    }))
}

#[debug_handler]
async fn check_cleanup_status(
    State(state): State<AppState>,
    Query(query): Query<CleanupStatusQuery>,
) -> impl IntoResponse {
    let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(CleanupStatusResponse { cleaned: false }),
        );
    };

    match state
        .stores
        .cleanup_markers(state.config.cleanup_ttl_secs)
        .consume(&session_id)
        .await
    {
        Ok(cleaned) => (StatusCode::OK, Json(CleanupStatusResponse { cleaned })),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = ?e, "cleanup status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CleanupStatusResponse { cleaned: false }),
            )
        }
    }
}

#[debug_handler]
async fn series_stats(
    State(state): State<AppState>,
    Query(query): Query<SeriesStatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let slug = slugify(&query.slug);
    if slug.is_empty() {
        return Err(AppError::Validation("slug is empty".into()));
    }

    let interactions = state.stores.interaction_cache().load(&slug).await?;

    Ok(Json(interactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockSeriesCatalog;
    use crate::stores::{KvNamespace, MockKvNamespace, Stores};
    use crate::test_utils::{TestStateBuilder, response_body, response_json, sample_series};
    use serde_json::json;
    use std::sync::Arc;

    fn payload(slug: &str, actions: Vec<Value>, session_id: Option<&str>) -> LogActionPayload {
        LogActionPayload {
            series_slug: slug.to_string(),
            actions,
            session_id: session_id.map(str::to_string),
        }
    }

    fn ip(addr: &str) -> ClientIp {
        ClientIp(Some(addr.to_string()))
    }

    async fn call(
        state: &AppState,
        client: ClientIp,
        body: LogActionPayload,
    ) -> axum::response::Response {
        match log_action(State(state.clone()), client, Json(body)).await {
            Ok(r) => r.into_response(),
            Err(e) => e.into_response(),
        }
    }

    #[tokio::test]
    async fn logs_valid_actions_and_locks_ip() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        let response = call(
            &state,
            ip("203.0.113.7"),
            payload(
                "Blue Box",
                vec![
                    json!({ "type": "like", "chapter": "1" }),
                    json!({ "type": "rate", "payload": { "value": 8 } }),
                ],
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response_json(response).await,
            json!({ "success": true, "logged": 2 })
        );

        let pending = state.stores.interaction_log().pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].series_slug, "blue-box");
        assert_eq!(pending[0].client_ip.as_deref(), Some("203.0.113.7"));
        assert!(state.stores.ip_locks(300).is_locked("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn locked_ip_gets_429() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();
        state.stores.ip_locks(300).lock("203.0.113.7").await.unwrap();

        let response = call(
            &state,
            ip("203.0.113.7"),
            payload("blue-box", vec![json!({ "type": "like", "chapter": "1" })], None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(state.stores.interaction_log().pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lock_read_error_fails_open() {
        let mut log = MockKvNamespace::new();
        log.expect_get()
            .returning(|_| Err(anyhow::anyhow!("kv unavailable")));
        log.expect_put().returning(|_, _, _| Ok(()));

        let stores = Stores {
            log: Arc::new(log),
            ..Stores::in_memory()
        };
        let state = TestStateBuilder::new()
            .with_stores(stores)
            .with_series(sample_series())
            .build();

        let response = call(
            &state,
            ip("203.0.113.7"),
            payload("blue-box", vec![json!({ "type": "like", "chapter": "1" })], None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unreadable_avatar_list_only_drops_comments() {
        let mut catalog = MockSeriesCatalog::new();
        catalog
            .expect_find()
            .returning(|_| Ok(Some(sample_series())));
        catalog
            .expect_avatars()
            .returning(|| Err(anyhow::anyhow!("avatars.json: No such file or directory")));
        let state = TestStateBuilder::new().with_catalog(catalog).build();

        let now = Utc::now().timestamp_millis();
        let response = call(
            &state,
            ip("203.0.113.7"),
            payload(
                "blue-box",
                vec![
                    json!({ "type": "like", "chapter": "1" }),
                    json!({
                        "type": "add_comment",
                        "chapter": "1",
                        "payload": {
                            "id": format!("{now}_a1b2c3d"),
                            "username": "Taiki",
                            "avatarUrl": "/img/profilpicture/Taiki.png",
                            "comment": "Peak",
                            "timestamp": now
                        }
                    }),
                ],
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["logged"], 1);

        let pending = state.stores.interaction_log().pending().await.unwrap();
        let raw = state.stores.interaction_log().read(&pending[0]).await.unwrap().unwrap();
        assert_eq!(raw, r#"[{"type":"like","chapter":"1"}]"#);
    }

    #[tokio::test]
    async fn unknown_series_is_rejected() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        let response = call(
            &state,
            ip("203.0.113.7"),
            payload("dandadan", vec![json!({ "type": "like", "chapter": "1" })], None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_body(response).await, "Unknown series");
    }

    #[tokio::test]
    async fn empty_slug_and_empty_actions_are_rejected() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        let empty_slug = call(
            &state,
            ip("203.0.113.7"),
            payload("???", vec![json!({ "type": "like", "chapter": "1" })], None),
        )
        .await;
        assert_eq!(empty_slug.status(), StatusCode::BAD_REQUEST);

        let no_actions = call(&state, ip("203.0.113.7"), payload("blue-box", vec![], None)).await;
        assert_eq!(no_actions.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn all_invalid_actions_are_rejected_without_locking() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        let response = call(
            &state,
            ip("203.0.113.7"),
            payload(
                "blue-box",
                vec![
                    json!({ "type": "like", "chapter": "999" }),
                    json!({ "type": "rate", "payload": { "value": 42 } }),
                ],
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!state.stores.ip_locks(300).is_locked("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_actions_are_dropped_from_the_batch() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        let response = call(
            &state,
            ClientIp(None),
            payload(
                "blue-box",
                vec![
                    json!({ "type": "like", "chapter": "999" }),
                    json!({ "type": "like", "chapter": "ep-S1-1" }),
                ],
                None,
            ),
        )
        .await;

        assert_eq!(response_json(response).await["logged"], 1);
        let pending = state.stores.interaction_log().pending().await.unwrap();
        assert_eq!(pending[0].client_ip, None);
    }

    #[tokio::test]
    async fn session_marker_is_set_and_consumed_once() {
        let state = TestStateBuilder::new().with_series(sample_series()).build();

        call(
            &state,
            ip("203.0.113.7"),
            payload(
                "blue-box",
                vec![json!({ "type": "like", "chapter": "2" })],
                Some("session-1"),
            ),
        )
        .await;

        let query = |id: &str| {
            Query(CleanupStatusQuery {
                session_id: Some(id.to_string()),
            })
        };

        let first = check_cleanup_status(State(state.clone()), query("session-1"))
            .await
            .into_response();
        assert_eq!(response_json(first).await, json!({ "cleaned": true }));

        let second = check_cleanup_status(State(state), query("session-1"))
            .await
            .into_response();
        assert_eq!(response_json(second).await, json!({ "cleaned": false }));
    }

    #[tokio::test]
    async fn cleanup_status_requires_session_id() {
        let state = TestStateBuilder::new().build();

        let response = check_cleanup_status(State(state), Query(CleanupStatusQuery { session_id: None }))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await, json!({ "cleaned": false }));
    }

    #[tokio::test]
    async fn cleanup_status_kv_error_is_500() {
        let mut log = MockKvNamespace::new();
        log.expect_get()
            .returning(|_| Err(anyhow::anyhow!("kv unavailable")));
        let state = TestStateBuilder::new()
            .with_stores(Stores {
                log: Arc::new(log),
                ..Stores::in_memory()
            })
            .build();

        let response = check_cleanup_status(
            State(state),
            Query(CleanupStatusQuery {
                session_id: Some("s".into()),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await, json!({ "cleaned": false }));
    }

    #[tokio::test]
    async fn series_stats_returns_cached_interactions() {
        let state = TestStateBuilder::new().build();
        state
            .stores
            .cache
            .put(
                "interactions:blue-box",
                r#"{"1":{"likes":3,"comments":[]},"stats":{"ratings":{"count":2,"total":17.0,"average":8.5}}}"#,
                None,
            )
            .await
            .unwrap();

        let response = series_stats(
            State(state.clone()),
            Query(SeriesStatsQuery {
                slug: "Blue Box".into(),
            }),
        )
        .await
        .unwrap()
        .into_response();

        let body = response_json(response).await;
        assert_eq!(body["1"]["likes"], 3);
        assert_eq!(body["stats"]["ratings"]["average"], 8.5);

        let empty = series_stats(
            State(state),
            Query(SeriesStatsQuery {
                slug: "dandadan".into(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response_json(empty).await, json!({}));
    }
}
