//! Handler error type.
//!
//! KV and catalog failures surface as [`AppError::Internal`]: the cause is
//! logged and reported to Sentry while the client only sees a bare 500.
//! Rejections of bad interaction batches or unknown series carry a message
//! that is safe to echo back.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum AppError {
    /// Store or catalog failure
    Internal(anyhow::Error),
    /// Rejection with a fixed client-facing message
    External(StatusCode, &'static str),
    /// Payload failed validation; rendered as 400
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(err) => {
                tracing::error!(
                    error = %err,
                    root_cause = %err.root_cause(),
                    "request failed"
                );
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::External(status, msg) => {
                tracing::debug!(status = %status, reason = msg, "request rejected");
                (status, msg).into_response()
            }
            AppError::Validation(msg) => {
                tracing::debug!(reason = %msg, "invalid payload");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::response_body;

    #[tokio::test]
    async fn internal_error_returns_500_generic_message() {
        let err = AppError::Internal(anyhow::anyhow!("redis connection refused"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_body(response).await, "Internal server error");
    }

    #[tokio::test]
    async fn internal_error_hides_sensitive_details() {
        let err = AppError::Internal(anyhow::anyhow!("admin_token=hunter2 leaked"));
        let body = response_body(err.into_response()).await;

        assert!(!body.contains("hunter2"));
        assert!(!body.contains("admin_token"));
    }

    #[tokio::test]
    async fn external_error_returns_specified_status_and_message() {
        let err = AppError::External(StatusCode::TOO_MANY_REQUESTS, "Slow down");
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response_body(response).await, "Slow down");
    }

    #[tokio::test]
    async fn validation_error_returns_400_with_details() {
        let err = AppError::Validation("actions: length is lower than 1".into());
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_body(response).await,
            "actions: length is lower than 1"
        );
    }

    #[test]
    fn debug_output_names_the_variant() {
        let err = AppError::External(StatusCode::NOT_FOUND, "Series not found");
        assert!(format!("{err:?}").starts_with("External("));
    }

    #[tokio::test]
    async fn json_error_converts_to_internal() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = json_err.into();

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
