//! Main entry point for the API gateway

use service_gateway::{
    api::routes::create_router, config, config::Settings, gateway::sweeper::ExpirySweeper,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    config::init_tracing(&settings.logging);

    info!(
        registry = %settings.registry.base_url,
        "Starting API gateway"
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = Arc::new(AppState::new(settings)?);

    // Cache sweeping runs for the lifetime of the process.
    let sweeper = ExpirySweeper::new(state.discovery.clone());
    sweeper.start(state.settings.cache.sweep_interval());

    let app = create_router(state);

    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
