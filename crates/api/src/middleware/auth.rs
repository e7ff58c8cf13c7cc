//! Admin authentication extractors.
//!
//! Admin endpoints take `AdminAuth`, which requires `Authorization: Bearer
//! <admin_token>`. The processing endpoint takes `CronOrAdmin`, which also
//! accepts the scheduler's `X-Cron-Secret` header when a secret is configured.
//!
//! ```ignore
//! async fn my_handler(_admin: AdminAuth, ...) -> ... {}
//! ```

use axum::{
    Json, RequestPartsExt,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::state::AppState;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Request carrying a valid admin bearer token.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        if bearer.token() != state.config.admin_token {
            tracing::warn!("rejected admin token");
            return Err(AuthError::InvalidToken);
        }

        Ok(AdminAuth)
    }
}

/// Who triggered a privileged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronOrAdmin {
    Cron,
    Admin,
}

impl FromRequestParts<AppState> for CronOrAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(secret) = parts.headers.get(CRON_SECRET_HEADER) {
            let matches = state
                .config
                .cron_secret
                .as_deref()
                .is_some_and(|expected| secret.as_bytes() == expected.as_bytes());
            if !matches {
                tracing::warn!("rejected cron secret");
                return Err(AuthError::InvalidToken);
            }
            return Ok(CronOrAdmin::Cron);
        }

        AdminAuth::from_request_parts(parts, state).await?;
        Ok(CronOrAdmin::Admin)
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidToken => "Unauthorized",
        };

        let body = serde_json::json!({ "error": message });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
