//! Integration tests against a live Redis server.
//!
//! Run with a server on 127.0.0.1:6379:
//! `cargo test -p polystore-redis -- --ignored`

use polystore_core::RedisConfig;
use polystore_redis::RedisStore;
use polystore_storage::{Connection, KeyValueStorage, PubSub};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn local_config() -> RedisConfig {
    RedisConfig {
        enabled: true,
        ..RedisConfig::default()
    }
}

#[tokio::test]
#[ignore]
async fn set_get_ttl_roundtrip() {
    init_tracing();
    let store = RedisStore::new(local_config());
    store.connect().await.unwrap();

    store.set_with_ttl("live.roundtrip", "value", 120).await;
    assert_eq!(store.get("live.roundtrip").await.as_deref(), Some("value"));
    assert!(store.contains("live.roundtrip").await);

    let ttl = store.remaining_ttl("live.roundtrip").await;
    assert!(ttl > 0 && ttl <= 120);

    store.remove("live.roundtrip").await;
    assert_eq!(store.get("live.roundtrip").await, None);
    assert_eq!(store.remaining_ttl("live.roundtrip").await, -1);

    store.disconnect().await;
    assert!(!store.is_connected().await);
}

#[tokio::test]
#[ignore]
async fn keys_hierarchy() {
    init_tracing();
    let store = RedisStore::new(local_config());
    store.connect().await.unwrap();

    store.set_with_ttl("tree.a.x", "1", 60).await;
    store.set_with_ttl("tree.a.y", "2", 60).await;
    store.set_with_ttl("tree.b", "3", 60).await;

    let children = store.keys("tree", false).await;
    assert_eq!(children.len(), 2);
    assert!(children.contains("a"));
    assert!(children.contains("b"));

    let all = store.keys("tree", true).await;
    assert_eq!(all.len(), 3);
    assert!(all.contains("tree.a.x"));

    for key in ["tree.a.x", "tree.a.y", "tree.b"] {
        store.remove(key).await;
    }
}

#[tokio::test]
#[ignore]
async fn publish_reaches_subscriber() {
    init_tracing();
    let publisher = RedisStore::new(local_config());
    publisher.connect().await.unwrap();
    let subscriber = RedisStore::new(local_config());
    subscriber.connect().await.unwrap();

    let mut rx = subscriber
        .subscribe(&["live.events".to_string()])
        .await
        .unwrap();

    // Give the server a moment to register the subscription
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(publisher.channel_exists("live.events").await);

    publisher.publish("live.events", "hello").await;

    let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.channel, "live.events");
    assert_eq!(message.payload, "hello");
}

#[tokio::test]
#[ignore]
async fn publish_without_listener_is_silent() {
    init_tracing();
    let store = RedisStore::new(local_config());
    store.connect().await.unwrap();

    assert!(!store.channel_exists("live.nobody").await);
    store.publish("live.nobody", "dropped").await;
}
