//! Configuration loading and logging setup

mod settings;

pub use settings::{
    AuthConfig, CacheConfig, HealthConfig, HeartbeatConfig, LoggingConfig, ProxyConfig,
    RateLimitConfig, RegistryConfig, ServerConfig, Settings,
};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber from the logging section.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
