//! HTTP surface of the gateway

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::Result;
use crate::gateway::proxy::ProxiedResponse;
use crate::middleware::{auth::AuthLayer, rate_limit::RateLimitLayer};
use crate::AppState;

/// Build the gateway router.
///
/// Routed traffic passes the interceptor pipeline in order: rate limiting,
/// then authentication, then resolution and forwarding. `/health` and `/`
/// sit outside the pipeline.
pub fn create_router(state: Arc<AppState>) -> Router {
    let pipeline = ServiceBuilder::new()
        .layer(RateLimitLayer::new(
            state.settings.rate_limit.window(),
            state.settings.rate_limit.max_requests,
        ))
        .layer(AuthLayer::new(state.settings.auth.secret.clone()));

    Router::new()
        .route("/api/:service/*path", any(route_to_service).layer(pipeline))
        .route("/health", get(health))
        .route("/", get(welcome))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_to_service(
    State(state): State<Arc<AppState>>,
    Path((service, path)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ProxiedResponse> {
    state
        .proxy
        .forward(&service, &path, method, headers, body)
        .await
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = &state.settings.health.probe_service;
    match state.registry.discover(probe).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            warn!(probe = %probe, error = %e, "Health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
    }
}

async fn welcome() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the API Gateway" }))
}
