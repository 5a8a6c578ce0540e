//! Service Registry and API Gateway
//!
//! A volatile, single-authority service registry with heartbeat-based
//! liveness, fronted by an API gateway that resolves logical service names
//! through a TTL-bounded discovery cache and relays requests behind rate
//! limiting and bearer authentication.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod registry;

pub use error::{AppError, Result};

use std::sync::Arc;

use gateway::{discovery::DiscoveryCache, proxy::ProxyForwarder};
use registry::client::RegistryClient;

/// Gateway state shared across all handlers
pub struct AppState {
    pub settings: config::Settings,
    pub registry: Arc<RegistryClient>,
    pub discovery: Arc<DiscoveryCache>,
    pub proxy: Arc<ProxyForwarder>,
}

impl AppState {
    /// Wire up the gateway components from settings.
    pub fn new(settings: config::Settings) -> Result<Self> {
        let registry = Arc::new(RegistryClient::new(
            settings.registry.base_url.clone(),
            settings.registry.discovery_timeout(),
        )?);
        let discovery = Arc::new(DiscoveryCache::new(
            registry.clone(),
            settings.cache.ttl(),
        ));
        let proxy = Arc::new(ProxyForwarder::new(
            discovery.clone(),
            settings.proxy.timeout(),
        )?);

        Ok(Self {
            settings,
            registry,
            discovery,
            proxy,
        })
    }
}
