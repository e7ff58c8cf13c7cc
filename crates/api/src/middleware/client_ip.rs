//! Client IP resolution from proxy headers.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::state::AppState;

const DEV_FALLBACK_IP: &str = "127.0.0.1";

/// Best-known client IP, `None` when no proxy header carries one.
///
/// Outside production a missing IP resolves to `127.0.0.1` so locks behave
/// the same on a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = from_headers(&parts.headers).or_else(|| {
            (!state.config.is_production()).then(|| DEV_FALLBACK_IP.to_string())
        });
        Ok(ClientIp(ip))
    }
}

/// `CF-Connecting-IP`, then the first `X-Forwarded-For` hop, then `X-Real-IP`.
pub fn from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}
