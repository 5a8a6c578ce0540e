//! HTTP surface of the registry service

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::registry::store::{RegistryStore, ServiceSummary};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub address: String,
}

/// Build the registry router over a shared store.
pub fn router(store: Arc<RegistryStore>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/heartbeat", post(heartbeat))
        .route("/discover/:name", get(discover))
        .route("/services", get(list_services))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn register(
    State(store): State<Arc<RegistryStore>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>> {
    store.register(&request.name, &request.address)?;
    Ok(Json(MessageResponse {
        message: format!("Service {} registered successfully", request.name),
    }))
}

async fn heartbeat(
    State(store): State<Arc<RegistryStore>>,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<MessageResponse>> {
    store.heartbeat(&request.name)?;
    Ok(Json(MessageResponse {
        message: "Heartbeat recorded".to_string(),
    }))
}

async fn discover(
    State(store): State<Arc<RegistryStore>>,
    Path(name): Path<String>,
) -> Result<Json<DiscoverResponse>> {
    let address = store.discover(&name)?;
    Ok(Json(DiscoverResponse { address }))
}

async fn list_services(
    State(store): State<Arc<RegistryStore>>,
) -> Json<Vec<ServiceSummary>> {
    Json(store.list())
}
