//! Application settings and configuration management

use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    pub proxy: ProxyConfig,
    pub heartbeat: HeartbeatConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

/// Gateway server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Registry configuration: where the registry binary binds and how the
/// gateway reaches it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_registry_port")]
    pub port: u16,
    #[serde(default = "default_registry_url")]
    pub base_url: String,
    #[serde(default = "default_liveness_ttl")]
    pub liveness_ttl_secs: u64,
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
    #[serde(default = "default_registry_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_registry_port() -> u16 {
    5000
}

fn default_registry_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_liveness_ttl() -> u64 {
    30
}

fn default_discovery_timeout() -> u64 {
    2
}

fn default_registry_sweep_interval() -> u64 {
    60
}

impl RegistryConfig {
    pub fn liveness_ttl(&self) -> Duration {
        Duration::from_secs(self.liveness_ttl_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Discovery cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_cache_sweep_interval() -> u64 {
    10
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_window")]
    pub window_secs: u64,
    #[serde(default = "default_rate_limit")]
    pub max_requests: usize,
}

fn default_rate_window() -> u64 {
    60
}

fn default_rate_limit() -> usize {
    100
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Authentication configuration: a single static shared secret
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_secret")]
    pub secret: String,
}

fn default_secret() -> String {
    "secret-token".to_string()
}

/// Proxy forwarding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_timeout")]
    pub timeout_secs: u64,
}

fn default_proxy_timeout() -> u64 {
    5
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Registrant heartbeat configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
}

fn default_heartbeat_interval() -> u64 {
    15
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Gateway health probe configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_probe_service")]
    pub probe_service: String,
}

fn default_probe_service() -> String {
    "user-service".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_gateway_port() as i64)?
            .set_default("registry.host", default_host())?
            .set_default("registry.port", default_registry_port() as i64)?
            .set_default("registry.base_url", default_registry_url())?
            .set_default("registry.liveness_ttl_secs", default_liveness_ttl() as i64)?
            .set_default(
                "registry.discovery_timeout_secs",
                default_discovery_timeout() as i64,
            )?
            .set_default(
                "registry.sweep_interval_secs",
                default_registry_sweep_interval() as i64,
            )?
            .set_default("cache.ttl_secs", default_cache_ttl() as i64)?
            .set_default(
                "cache.sweep_interval_secs",
                default_cache_sweep_interval() as i64,
            )?
            .set_default("rate_limit.window_secs", default_rate_window() as i64)?
            .set_default("rate_limit.max_requests", default_rate_limit() as i64)?
            .set_default("auth.secret", default_secret())?
            .set_default("proxy.timeout_secs", default_proxy_timeout() as i64)?
            .set_default(
                "heartbeat.interval_secs",
                default_heartbeat_interval() as i64,
            )?
            .set_default("health.probe_service", default_probe_service())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_gateway_port(),
            },
            registry: RegistryConfig {
                host: default_host(),
                port: default_registry_port(),
                base_url: default_registry_url(),
                liveness_ttl_secs: default_liveness_ttl(),
                discovery_timeout_secs: default_discovery_timeout(),
                sweep_interval_secs: default_registry_sweep_interval(),
            },
            cache: CacheConfig {
                ttl_secs: default_cache_ttl(),
                sweep_interval_secs: default_cache_sweep_interval(),
            },
            rate_limit: RateLimitConfig {
                window_secs: default_rate_window(),
                max_requests: default_rate_limit(),
            },
            auth: AuthConfig {
                secret: default_secret(),
            },
            proxy: ProxyConfig {
                timeout_secs: default_proxy_timeout(),
            },
            heartbeat: HeartbeatConfig {
                interval_secs: default_heartbeat_interval(),
            },
            health: HealthConfig {
                probe_service: default_probe_service(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.registry.port, 5000);
        assert_eq!(settings.registry.liveness_ttl(), Duration::from_secs(30));
        assert_eq!(settings.cache.ttl(), Duration::from_secs(30));
        assert_eq!(settings.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.proxy.timeout(), Duration::from_secs(5));
        assert_eq!(settings.registry.discovery_timeout(), Duration::from_secs(2));
        assert_eq!(settings.heartbeat.interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.auth.secret, "secret-token");
        assert_eq!(settings.health.probe_service, "user-service");
    }
}
