mod catalog;
mod config;
mod error;
mod handlers;
mod interactions;
mod middleware;
mod models;
mod scheduler;
mod slug;
mod state;
mod stores;
#[cfg(test)]
mod test_utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    http::{self, Method},
};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    catalog::FsSeriesCatalog, config::Config, interactions::LogProcessor, state::AppState,
    stores::Stores,
};

#[derive(Parser)]
#[command(name = "bigsolo-api")]
#[command(about = "BigSolo interactions API server")]
struct Args {
    /// Process pending interaction logs once and exit
    #[arg(long)]
    process_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = envy::prefixed("BIGSOLO_").from_env::<Config>()?;

    // Sentry guard must stay alive for the whole process
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let stores = match &config.redis_url {
        Some(url) => Stores::redis(redis::Client::open(url.as_str())?),
        None => {
            tracing::warn!("BIGSOLO_REDIS_URL not set, using in-memory KV (data is lost on restart)");
            Stores::in_memory()
        }
    };

    let processor = LogProcessor::new(stores.clone(), config.lock_ttl_secs);

    if args.process_once {
        let summary = processor.run().await?;
        println!("{summary}");
        return Ok(());
    }

    let state = AppState {
        catalog: Arc::new(FsSeriesCatalog::new(&config.data_dir)),
        config: config.clone(),
        stores,
        processor: processor.clone(),
    };

    let cron = scheduler::spawn(processor, config.process_interval_secs);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cron {
        handle.abort();
    }

    tracing::info!("Shutdown complete");

    Ok(())
}

fn app(state: AppState) -> Router {
    // Public endpoints are called from the site's pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let api = Router::new()
        .merge(handlers::interactions::router())
        .merge(handlers::process::router())
        .layer(cors.clone())
        .nest("/admin", handlers::admin::router());

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .nest("/health", handlers::health::router())
        .nest("/api", api)
        .nest("/data/series", handlers::series::router().layer(cors))
        .with_state(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(64 * 1024)) // 64KB limit
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ADMIN_TOKEN, TestStateBuilder, response_json, sample_series};
    use axum::{body::Body, http::StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn router() -> Router {
        app(TestStateBuilder::new().with_series(sample_series()).build())
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let response = router()
            .oneshot(http::Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn log_action_round_trip_through_router() {
        let body = json!({
            "seriesSlug": "blue-box",
            "actions": [{ "type": "like", "chapter": "1" }]
        });
        let response = router()
            .oneshot(
                http::Request::post("/api/log-action")
                    .header("content-type", "application/json")
                    .header("cf-connecting-ip", "203.0.113.7")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response_json(response).await,
            json!({ "success": true, "logged": 1 })
        );
    }

    #[tokio::test]
    async fn admin_routes_require_token() {
        let app = router();

        let anonymous = app
            .clone()
            .oneshot(
                http::Request::post("/api/admin/clear-logs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let admin = app
            .oneshot(
                http::Request::post("/api/admin/clear-logs")
                    .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn process_log_accepts_get_and_post() {
        for method in [Method::GET, Method::POST] {
            let response = router()
                .oneshot(
                    http::Request::builder()
                        .method(method)
                        .uri("/api/process-log")
                        .header("x-cron-secret", crate::test_utils::CRON_SECRET)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn series_routes_are_mounted() {
        let app = router();

        let index = app
            .clone()
            .oneshot(http::Request::get("/data/series").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);

        let detail = app
            .oneshot(
                http::Request::get("/data/series/blue-box")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response_json(detail).await["title"], "Blue Box");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = "x".repeat(65 * 1024);
        let response = router()
            .oneshot(
                http::Request::post("/api/log-action")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
