//! Discovery cache behavior against a mocked registry

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use service_gateway::error::AppError;
use service_gateway::gateway::discovery::{DiscoveryCache, Resolve};
use service_gateway::registry::client::RegistryClient;

fn cache_for(uri: &str, ttl: Duration) -> DiscoveryCache {
    let client = Arc::new(RegistryClient::new(uri.to_string(), Duration::from_secs(2)).unwrap());
    DiscoveryCache::new(client, ttl)
}

fn discover_mock(name: &str, address: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/discover/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "address": address })))
}

#[tokio::test]
async fn test_hit_skips_registry_roundtrip() {
    let server = MockServer::start().await;
    discover_mock("user-service", "http://localhost:5001")
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_for(&server.uri(), Duration::from_secs(30));

    assert_eq!(
        cache.resolve("user-service").await.unwrap(),
        "http://localhost:5001"
    );
    assert_eq!(
        cache.resolve("user-service").await.unwrap(),
        "http://localhost:5001"
    );
    // The expect(1) above verifies the second resolve never left the cache.
}

#[tokio::test]
async fn test_stale_entry_is_refetched() {
    let server = MockServer::start().await;
    discover_mock("user-service", "http://old:5001")
        .mount(&server)
        .await;

    let cache = cache_for(&server.uri(), Duration::from_millis(200));
    assert_eq!(cache.resolve("user-service").await.unwrap(), "http://old:5001");

    // The registry's record changes; the cached copy keeps winning until the
    // cache TTL lapses.
    server.reset().await;
    discover_mock("user-service", "http://new:5002")
        .mount(&server)
        .await;

    assert_eq!(cache.resolve("user-service").await.unwrap(), "http://old:5001");

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(cache.resolve("user-service").await.unwrap(), "http://new:5002");
}

#[tokio::test]
async fn test_negative_result_is_not_cached() {
    let server = MockServer::start().await;

    let cache = cache_for(&server.uri(), Duration::from_secs(30));

    // No mock mounted: the registry answers 404.
    let result = cache.resolve("user-service").await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert!(cache.is_empty());

    // The service appears; the next resolve must query again instead of
    // replaying the failure.
    discover_mock("user-service", "http://localhost:5001")
        .mount(&server)
        .await;
    assert_eq!(
        cache.resolve("user-service").await.unwrap(),
        "http://localhost:5001"
    );
}

#[tokio::test]
async fn test_unreachable_registry_maps_to_unavailable() {
    // Bind and immediately drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let cache = cache_for(&format!("http://{}", addr), Duration::from_secs(30));

    let result = cache.resolve("user-service").await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn test_purge_expired_drops_stale_entries() {
    let server = MockServer::start().await;
    discover_mock("user-service", "http://localhost:5001")
        .mount(&server)
        .await;

    let cache = cache_for(&server.uri(), Duration::from_millis(100));
    cache.resolve("user-service").await.unwrap();
    assert_eq!(cache.len(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cache.purge_expired(), 1);
    assert!(cache.is_empty());
}
