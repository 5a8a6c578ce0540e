//! HTTP client for the registry service
//!
//! All registry calls are network round-trips bounded by the discovery
//! timeout; outcomes are mapped onto the typed error taxonomy from status
//! codes alone.

use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::registry::routes::DiscoverResponse;

pub struct RegistryClient {
    base_url: String,
    client: Client,
}

impl RegistryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a service instance with the registry.
    pub async fn register(&self, name: &str, address: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(&json!({ "name": name, "address": address }))
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("registry: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::BAD_REQUEST => Err(AppError::InvalidRegistration),
            status => Err(AppError::Unavailable(format!("registry returned {}", status))),
        }
    }

    /// Refresh the heartbeat for a registered service.
    pub async fn heartbeat(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/heartbeat", self.base_url))
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("registry: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(AppError::NotRegistered(name.to_string())),
            status => Err(AppError::Unavailable(format!("registry returned {}", status))),
        }
    }

    /// Resolve a service name to its registered address.
    pub async fn discover(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/discover/{}", self.base_url, name))
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("registry: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let body: DiscoverResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::Unavailable(format!("registry: {}", e)))?;
                debug!(service = %name, address = %body.address, "Discovered via registry");
                Ok(body.address)
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound(name.to_string())),
            status => Err(AppError::Unavailable(format!("registry returned {}", status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client =
            RegistryClient::new("http://localhost:5000/".to_string(), Duration::from_secs(2))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
