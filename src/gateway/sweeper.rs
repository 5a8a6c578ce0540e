//! Background purge of expired discovery cache entries

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::gateway::discovery::DiscoveryCache;

/// Periodically removes cache entries older than the cache TTL.
///
/// Purely a memory bound: the cache already treats stale entries as misses on
/// read, but names that are never queried again would otherwise accumulate.
pub struct ExpirySweeper {
    cache: Arc<DiscoveryCache>,
    task: RwLock<Option<JoinHandle<()>>>,
}

impl ExpirySweeper {
    pub fn new(cache: Arc<DiscoveryCache>) -> Self {
        Self {
            cache,
            task: RwLock::new(None),
        }
    }

    /// Start the sweep task. A tick only logs what it removed and can never
    /// terminate the loop.
    pub fn start(&self, interval: Duration) {
        let cache = self.cache.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
        });

        *self.task.write() = Some(handle);
        info!(interval_secs = interval.as_secs(), "Started cache sweeper");
    }

    /// Stop the sweep task.
    pub fn stop(&self) {
        if let Some(handle) = self.task.write().take() {
            handle.abort();
            info!("Stopped cache sweeper");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
