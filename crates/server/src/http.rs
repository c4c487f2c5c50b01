//! HTTP surface: the query endpoint, the usage report, and health
//!
//! The engine's contract shapes the status codes: validation failures are
//! 400 with every violated rule listed, rate limiting is 429 with a retry
//! hint, and everything else is a well-formed 200 reply even when all
//! backends are down.

use crate::state::AppState;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use krishimitra_config::Settings;
use krishimitra_core::{Error, QueryRequest};
use krishimitra_guard::client_key;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState, settings: &Settings) -> Router {
    let mut router = Router::new()
        .route("/api/query", post(query))
        .route("/api/report", get(report))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if settings.server.cors_enabled {
        router = router.layer(build_cors_layer(&settings.server.cors_origins));
    }
    router
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    let client = client_identifier(&headers, connect.as_deref());

    match state.engine.handle(&request, &client).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(Error::Validation(details)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_failed",
                "details": details,
            })),
        )
            .into_response(),
        Err(Error::RateLimited { retry_after_secs }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "rate_limited",
                "retry_after_secs": retry_after_secs,
            })),
        )
            .into_response(),
    }
}

async fn report(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.report())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Rate-limit identity: forwarded address when behind a proxy, else the
/// socket peer, combined with the declared agent string.
fn client_identifier(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    let addr = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    client_key(&addr, agent)
}

/// Bind and serve until the process is stopped.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::new(&settings);
    let router = build_router(state, &settings);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
