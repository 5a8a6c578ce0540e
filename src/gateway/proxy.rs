//! Request forwarding to resolved service addresses

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::discovery::Resolve;

/// Relayed downstream response. The body passes through verbatim; the
/// content type is forced to JSON at the gateway surface.
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.body,
        )
            .into_response()
    }
}

/// Headers bound to the inbound hop, dropped before relaying.
fn is_hop_header(name: &str) -> bool {
    matches!(name, "host" | "content-length")
}

pub struct ProxyForwarder {
    resolver: Arc<dyn Resolve>,
    client: Client,
}

impl ProxyForwarder {
    pub fn new(resolver: Arc<dyn Resolve>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { resolver, client })
    }

    /// Forward an inbound request to the instance registered for `service`.
    ///
    /// Only GET and POST are relayed; anything else is rejected before a
    /// resolution is attempted. Transport outcomes map to typed errors, never
    /// retried.
    pub async fn forward(
        &self,
        service: &str,
        path: &str,
        method: Method,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ProxiedResponse> {
        if method != Method::GET && method != Method::POST {
            return Err(AppError::MethodNotSupported(method.to_string()));
        }

        let address = self.resolver.resolve(service).await?;
        let url = format!("{}/{}", address.trim_end_matches('/'), path);
        let request_id = Uuid::new_v4();

        info!(%request_id, service = %service, method = %method, url = %url, "Routing request");

        let mut forwarded_headers = HeaderMap::new();
        for (name, value) in headers.iter() {
            if !is_hop_header(name.as_str()) {
                forwarded_headers.insert(name.clone(), value.clone());
            }
        }

        let request = if method == Method::POST {
            self.client.post(&url).body(body)
        } else {
            self.client.get(&url)
        };

        let response = request
            .headers(forwarded_headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(%request_id, service = %service, "Downstream timeout");
                    AppError::GatewayTimeout(service.to_string())
                } else {
                    warn!(%request_id, service = %service, error = %e, "Downstream transport failure");
                    AppError::BadGateway(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(%request_id, service = %service, error = %e, "Failed reading downstream body");
            AppError::BadGateway(e.to_string())
        })?;

        debug!(%request_id, service = %service, status = %status, bytes = body.len(), "Relaying response");

        Ok(ProxiedResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct UnavailableResolver;

    #[async_trait]
    impl Resolve for UnavailableResolver {
        async fn resolve(&self, name: &str) -> Result<String> {
            Err(AppError::Unavailable(name.to_string()))
        }
    }

    /// Resolver that fails the test if the forwarder consults it.
    struct PanickingResolver;

    #[async_trait]
    impl Resolve for PanickingResolver {
        async fn resolve(&self, name: &str) -> Result<String> {
            panic!("resolution attempted for {}", name);
        }
    }

    #[test]
    fn test_hop_headers() {
        assert!(is_hop_header("host"));
        assert!(is_hop_header("content-length"));
        assert!(!is_hop_header("authorization"));
        assert!(!is_hop_header("content-type"));
    }

    #[tokio::test]
    async fn test_unsupported_method_rejected_before_resolution() {
        let forwarder =
            ProxyForwarder::new(Arc::new(PanickingResolver), Duration::from_secs(5)).unwrap();

        let result = forwarder
            .forward(
                "user-service",
                "things",
                Method::PUT,
                HeaderMap::new(),
                Bytes::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::MethodNotSupported(_))));
    }

    #[tokio::test]
    async fn test_unresolvable_service_skips_downstream_call() {
        let forwarder =
            ProxyForwarder::new(Arc::new(UnavailableResolver), Duration::from_secs(5)).unwrap();

        let result = forwarder
            .forward(
                "user-service",
                "hello",
                Method::GET,
                HeaderMap::new(),
                Bytes::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }
}
