//! Main entry point for the registry service

use service_gateway::{
    config,
    config::Settings,
    registry::{routes, store::RegistryStore},
};
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    config::init_tracing(&settings.logging);

    info!(
        liveness_ttl_secs = settings.registry.liveness_ttl_secs,
        "Starting service registry"
    );

    let store = Arc::new(RegistryStore::new(settings.registry.liveness_ttl()));

    // Lazy expiry on discovery is sufficient for correctness; this sweep only
    // bounds memory for names that are registered and never queried again.
    {
        let store = store.clone();
        let interval = settings.registry.sweep_interval();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let removed = store.purge_expired();
                if removed > 0 {
                    debug!(removed, "Purged expired service records");
                }
            }
        });
    }

    let app = routes::router(store);

    let addr = format!("{}:{}", settings.registry.host, settings.registry.port);
    info!("Registry listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
