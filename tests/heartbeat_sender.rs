//! Registrant heartbeat task against a live registry

use std::sync::Arc;
use std::time::Duration;

use service_gateway::registry::{
    client::RegistryClient, heartbeat::HeartbeatSender, routes, store::RegistryStore,
};

async fn spawn_registry(ttl: Duration) -> (String, Arc<RegistryStore>) {
    let store = Arc::new(RegistryStore::new(ttl));
    let app = routes::router(store.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), store)
}

#[tokio::test]
async fn test_sender_registers_and_keeps_record_alive() {
    let (registry_url, store) = spawn_registry(Duration::from_millis(300)).await;
    let client = Arc::new(RegistryClient::new(registry_url, Duration::from_secs(2)).unwrap());

    let sender = HeartbeatSender::new(
        client,
        "user-service".to_string(),
        "http://localhost:5001".to_string(),
    );
    sender.start(Duration::from_millis(100));

    // Well past the liveness TTL, the heartbeats are what keep it alive.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(
        store.discover("user-service").unwrap(),
        "http://localhost:5001"
    );

    sender.stop();

    // With the sender gone the record lapses again.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(store.discover("user-service").is_err());
}

#[tokio::test]
async fn test_sender_reregisters_after_record_is_reclaimed() {
    let (registry_url, store) = spawn_registry(Duration::from_millis(200)).await;
    let client = Arc::new(RegistryClient::new(registry_url, Duration::from_secs(2)).unwrap());

    let sender = HeartbeatSender::new(
        client,
        "user-service".to_string(),
        "http://localhost:5001".to_string(),
    );
    // Interval much longer than the TTL: every heartbeat finds the record
    // already purged and has to re-register on the following tick.
    sender.start(Duration::from_millis(300));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.purge_expired(), 1);

    // One tick answers NotRegistered, the next re-registers.
    let mut recovered = false;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if store.discover("user-service").is_ok() {
            recovered = true;
            break;
        }
    }
    assert!(recovered, "sender never re-registered");

    sender.stop();
}
