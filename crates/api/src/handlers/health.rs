//! Health check endpoint for load balancers and monitoring.
//!
//! Returns 200 OK if the KV store is reachable, 503 Service Unavailable otherwise.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    kv: bool,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let kv_ok = match state.stores.log.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "kv health check failed");
            false
        }
    };

    let response = HealthResponse {
        status: if kv_ok { "ok" } else { "unhealthy" },
        kv: kv_ok,
    };

    let status = if kv_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
