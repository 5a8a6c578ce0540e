//! Registrant-side heartbeat task
//!
//! Registers a service instance on start and keeps its registry record alive
//! with periodic heartbeats. A failed tick logs and waits for the next one;
//! it never terminates the task.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::registry::client::RegistryClient;

pub struct HeartbeatSender {
    client: Arc<RegistryClient>,
    service_name: String,
    service_address: String,
    task: RwLock<Option<JoinHandle<()>>>,
}

impl HeartbeatSender {
    pub fn new(client: Arc<RegistryClient>, service_name: String, service_address: String) -> Self {
        Self {
            client,
            service_name,
            service_address,
            task: RwLock::new(None),
        }
    }

    /// Start the background task: register once, then heartbeat on the given
    /// interval. If the registry answers a heartbeat with "not registered"
    /// (e.g. the record expired while the registry was partitioned away), the
    /// next tick re-registers instead of heartbeating.
    pub fn start(&self, interval: Duration) {
        let client = self.client.clone();
        let name = self.service_name.clone();
        let address = self.service_address.clone();

        let handle = tokio::spawn(async move {
            let mut needs_registration = true;

            loop {
                if needs_registration {
                    match client.register(&name, &address).await {
                        Ok(()) => {
                            info!(service = %name, address = %address, "Registered with registry");
                            needs_registration = false;
                        }
                        Err(e) => {
                            warn!(service = %name, error = %e, "Registration failed");
                        }
                    }
                } else {
                    match client.heartbeat(&name).await {
                        Ok(()) => debug!(service = %name, "Heartbeat sent"),
                        Err(AppError::NotRegistered(_)) => {
                            warn!(service = %name, "Registry lost our record; re-registering");
                            needs_registration = true;
                        }
                        Err(e) => {
                            warn!(service = %name, error = %e, "Heartbeat failed");
                        }
                    }
                }

                tokio::time::sleep(interval).await;
            }
        });

        *self.task.write() = Some(handle);
        info!(
            service = %self.service_name,
            interval_secs = interval.as_secs(),
            "Started heartbeat task"
        );
    }

    /// Stop the background task.
    pub fn stop(&self) {
        if let Some(handle) = self.task.write().take() {
            handle.abort();
            info!(service = %self.service_name, "Stopped heartbeat task");
        }
    }
}

impl Drop for HeartbeatSender {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
