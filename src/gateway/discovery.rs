//! Gateway-local cache of registry lookups

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::registry::client::RegistryClient;

/// Resolution seam between the forwarder and the discovery layer.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    address: String,
    fetched_at: Instant,
}

/// Time-bounded cache in front of the registry.
///
/// A stale entry is treated as absent and refetched; negative registry
/// answers are never cached. Concurrent misses for the same name each query
/// the registry independently (registry reads are idempotent, so overlapping
/// fetches are tolerated rather than deduplicated).
pub struct DiscoveryCache {
    registry: Arc<RegistryClient>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl DiscoveryCache {
    pub fn new(registry: Arc<RegistryClient>, ttl: Duration) -> Self {
        Self {
            registry,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Drop every entry older than the cache TTL. Returns the number of
    /// entries removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Resolve for DiscoveryCache {
    async fn resolve(&self, name: &str) -> Result<String> {
        if let Some(entry) = self.entries.get(name) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!(service = %name, address = %entry.address, "Cache hit");
                return Ok(entry.address.clone());
            }
        }

        match self.registry.discover(name).await {
            Ok(address) => {
                self.entries.insert(
                    name.to_string(),
                    CacheEntry {
                        address: address.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                info!(service = %name, address = %address, "Discovered and cached");
                Ok(address)
            }
            Err(AppError::NotFound(_)) | Err(AppError::Expired(_)) => {
                warn!(service = %name, "Service not known to registry");
                Err(AppError::Unavailable(name.to_string()))
            }
            Err(e) => {
                error!(service = %name, error = %e, "Registry lookup failed");
                Err(AppError::Unavailable(name.to_string()))
            }
        }
    }
}
