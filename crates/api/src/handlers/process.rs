//! Log aggregation trigger.
//!
//! - GET|POST /api/process-log - Fold pending logs into the cache, plaintext summary
//!
//! Called by the external scheduler with `X-Cron-Secret`, or by an admin.

use axum::{Router, debug_handler, extract::State, response::IntoResponse, routing::get};

use crate::{error::AppError, middleware::auth::CronOrAdmin, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/process-log", get(process_log).post(process_log))
}

#[debug_handler]
async fn process_log(
    caller: CronOrAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(?caller, "log processing requested");

    let summary = state.processor.run().await?;

    Ok(summary.to_string())
}
