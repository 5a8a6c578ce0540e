//! In-memory service catalog with heartbeat-based liveness

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// A registered service instance.
///
/// Liveness is derived from `last_heartbeat` at read time and never stored.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub address: String,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: Instant,
}

/// Listing entry for the `/services` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    pub address: String,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat_age_secs: u64,
}

/// Authoritative, volatile catalog of `name -> (address, last heartbeat)`.
///
/// Registrations are last-write-wins; stale records are reclaimed lazily on
/// discovery, or by [`purge_expired`](Self::purge_expired) for names that are
/// never queried again.
pub struct RegistryStore {
    services: DashMap<String, ServiceRecord>,
    liveness_ttl: Duration,
}

impl RegistryStore {
    pub fn new(liveness_ttl: Duration) -> Self {
        Self {
            services: DashMap::new(),
            liveness_ttl,
        }
    }

    /// Register or re-register a service. Overwrites any existing record for
    /// the name and resets its heartbeat.
    pub fn register(&self, name: &str, address: &str) -> Result<()> {
        if name.is_empty() || address.is_empty() {
            return Err(AppError::InvalidRegistration);
        }

        self.services.insert(
            name.to_string(),
            ServiceRecord {
                address: address.to_string(),
                registered_at: Utc::now(),
                last_heartbeat: Instant::now(),
            },
        );

        info!(service = %name, address = %address, "Service registered");
        Ok(())
    }

    /// Refresh the heartbeat for an existing record. Heartbeats never create
    /// records.
    pub fn heartbeat(&self, name: &str) -> Result<()> {
        match self.services.get_mut(name) {
            Some(mut record) => {
                record.last_heartbeat = Instant::now();
                debug!(service = %name, "Heartbeat recorded");
                Ok(())
            }
            None => Err(AppError::NotRegistered(name.to_string())),
        }
    }

    /// Look up a service address, reclaiming the record as a side effect if
    /// its heartbeat has lapsed.
    pub fn discover(&self, name: &str) -> Result<String> {
        let (address, live) = match self.services.get(name) {
            None => return Err(AppError::NotFound(name.to_string())),
            Some(record) => (
                record.address.clone(),
                record.last_heartbeat.elapsed() <= self.liveness_ttl,
            ),
        };

        if !live {
            // The predicate re-checks under the shard lock so a concurrent
            // re-registration is not dropped.
            self.services
                .remove_if(name, |_, record| {
                    record.last_heartbeat.elapsed() > self.liveness_ttl
                });
            info!(service = %name, "Expired record reclaimed on discovery");
            return Err(AppError::Expired(name.to_string()));
        }

        debug!(service = %name, address = %address, "Service discovered");
        Ok(address)
    }

    /// Drop every record whose heartbeat has lapsed. Returns the number of
    /// records removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.services.len();
        self.services
            .retain(|_, record| record.last_heartbeat.elapsed() <= self.liveness_ttl);
        before - self.services.len()
    }

    /// Snapshot of all records, live or not.
    pub fn list(&self) -> Vec<ServiceSummary> {
        self.services
            .iter()
            .map(|entry| ServiceSummary {
                name: entry.key().clone(),
                address: entry.address.clone(),
                registered_at: entry.registered_at,
                last_heartbeat_age_secs: entry.last_heartbeat.elapsed().as_secs(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
