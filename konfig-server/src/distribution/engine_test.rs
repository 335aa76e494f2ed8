use std::collections::HashMap;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use prost::Message;
use tokio::sync::mpsc;

use super::engine::DeliveryError;
use super::*;
use konfig_core::cache::ConfigCache;
use konfig_core::cache::MockConfigCache;
use konfig_core::events::MockEventSink;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::MockConfigStore;
use konfig_core::CacheError;
use konfig_core::StoreError;
use konfig_proto::common::ConfigDocument;
use konfig_proto::distribution::UpdateType;

/// Real key/value semantics so tests can observe what a fetch left behind
/// for the next one, the way a shared redis would.
#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ConfigCache for MemoryCache {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        _ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn exists(
        &self,
        key: &str,
    ) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }
}

fn doc(version: i64) -> ConfigDocument {
    ConfigDocument {
        config_id: format!("svcA-v{version}"),
        service_name: "svcA".into(),
        version,
        content: Bytes::from_static(b"{\"k\":1}"),
        format: "json".into(),
        content_hash: "hash".into(),
        created_at: 1700000000,
        created_by: "api".into(),
    }
}

fn engine_with(
    store: MockConfigStore,
    cache: MockConfigCache,
    events: MockEventSink,
) -> DistributionEngine {
    DistributionEngine::new(
        Arc::new(store),
        Arc::new(cache),
        Arc::new(events),
        StatsdSink::disabled(),
        300,
        0,
    )
}

#[tokio::test]
async fn test_fetch_prefers_cache() {
    let mut cache = MockConfigCache::new();
    let encoded = doc(3).encode_to_vec();
    cache
        .expect_get()
        .withf(|key| key == "config:latest:svcA")
        .return_once(move |_| Ok(Some(encoded)));

    // No store expectations: a store call would panic the mock.
    let engine = engine_with(MockConfigStore::new(), cache, MockEventSink::new());

    let fetched = engine.fetch_document("svcA", -1).await.unwrap();
    assert_eq!(fetched.version, 3);
}

#[tokio::test]
async fn test_fetch_miss_falls_through_and_fills_cache() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));
    // Only the versioned key is filled; caching a latest pointer would
    // hide newer uploads until the TTL expired.
    cache
        .expect_set()
        .withf(|key, _, ttl| key == "config:svcA:v2" && *ttl == 300)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .withf(|service| service == "svcA")
        .return_once(|_| Ok(doc(2)));

    let engine = engine_with(store, cache, MockEventSink::new());

    let fetched = engine.fetch_document("svcA", -1).await.unwrap();
    assert_eq!(fetched.version, 2);
}

#[tokio::test]
async fn test_fetch_pinned_version_uses_versioned_key() {
    let mut cache = MockConfigCache::new();
    cache
        .expect_get()
        .withf(|key| key == "config:svcA:v5")
        .returning(|_| Ok(None));
    cache.expect_set().returning(|_, _, _| Ok(()));

    let mut store = MockConfigStore::new();
    store
        .expect_get_by_version()
        .withf(|service, version| service == "svcA" && *version == 5)
        .return_once(|_, _| Ok(doc(5)));

    let engine = engine_with(store, cache, MockEventSink::new());
    assert_eq!(engine.fetch_document("svcA", 5).await.unwrap().version, 5);
}

#[tokio::test]
async fn test_fetch_empty_sentinel_not_cached() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));
    // No expect_set: caching the sentinel would panic the mock.

    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .return_once(|service| Ok(ConfigDocument::empty(service)));

    let engine = engine_with(store, cache, MockEventSink::new());
    let fetched = engine.fetch_document("svcA", -1).await.unwrap();
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn test_fetch_store_error_propagates() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));

    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .return_once(|_| Err(StoreError::Unavailable("connection lost".into())));

    let engine = engine_with(store, cache, MockEventSink::new());
    assert!(engine.fetch_document("svcA", -1).await.is_err());
}

#[tokio::test]
async fn test_deliver_sends_newer_version() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));
    cache.expect_set().returning(|_, _, _| Ok(()));

    let mut store = MockConfigStore::new();
    store.expect_get_latest().return_once(|_| Ok(doc(1)));
    store
        .expect_update_instance_status()
        .withf(|_, _, version, _| *version == 1)
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    store
        .expect_record_delivery()
        .withf(|service, instance, version| {
            service == "svcA" && instance == "i-1" && *version == 1
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut events = MockEventSink::new();
    events
        .expect_publish()
        .withf(|event| event.event_type == "config_update" && event.version == Some(1))
        .times(1)
        .returning(|_| Ok(()));

    let engine = engine_with(store, cache, events);
    let session = engine.registry().register("svcA", "i-1", 0);
    let (tx, mut rx) = mpsc::channel(4);

    let sent = engine.deliver_if_newer(&session, 0, &tx).await;
    assert!(matches!(sent, Ok(true)));

    let update = rx.recv().await.unwrap().unwrap();
    assert_eq!(update.update_type(), UpdateType::NewConfig);
    assert!(update.force_reload);
    assert_eq!(update.config.unwrap().version, 1);
    assert_eq!(session.current_version(), 1);
}

#[tokio::test]
async fn test_deliver_skips_when_subscriber_current() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));
    cache.expect_set().returning(|_, _, _| Ok(()));

    let mut store = MockConfigStore::new();
    store.expect_get_latest().return_once(|_| Ok(doc(1)));
    // No instance/delivery expectations: skipping must not touch the store.

    let engine = engine_with(store, cache, MockEventSink::new());
    let session = engine.registry().register("svcA", "i-1", 1);
    let (tx, mut rx) = mpsc::channel(4);

    let sent = engine.deliver_if_newer(&session, 1, &tx).await;
    assert!(matches!(sent, Ok(false)));
    assert!(rx.try_recv().is_err());
    assert_eq!(session.current_version(), 1);
}

#[tokio::test]
async fn test_deliver_store_error_surfaces() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));

    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .return_once(|_| Err(StoreError::Unavailable("down".into())));

    let engine = engine_with(store, cache, MockEventSink::new());
    let session = engine.registry().register("svcA", "i-1", 0);
    let (tx, _rx) = mpsc::channel(4);

    let result = engine.deliver_if_newer(&session, 0, &tx).await;
    assert!(matches!(result, Err(DeliveryError::Store(_))));
}

#[tokio::test]
async fn test_reconnect_after_upload_sees_new_version() {
    // One cache shared across both subscriptions; the store serves v1 to
    // the first latest-fetch and v2 afterwards, the way an upload between
    // the two would.
    let cache = Arc::new(MemoryCache::default());

    let latest_calls = Arc::new(AtomicI64::new(0));
    let mut store = MockConfigStore::new();
    let calls = latest_calls.clone();
    store.expect_get_latest().returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(doc(1))
        } else {
            Ok(doc(2))
        }
    });
    store
        .expect_update_instance_status()
        .returning(|_, _, _, _| Ok(()));
    store
        .expect_record_delivery()
        .returning(|_, _, _| Ok(()));

    let mut events = MockEventSink::new();
    events.expect_publish().returning(|_| Ok(()));

    let engine = DistributionEngine::new(
        Arc::new(store),
        cache.clone(),
        Arc::new(events),
        StatsdSink::disabled(),
        300,
        0,
    );

    // First subscription observes v1 and disconnects.
    let session = engine.registry().register("svcA", "i-1", 0);
    let (tx, mut rx) = mpsc::channel(4);
    assert!(matches!(
        engine.deliver_if_newer(&session, 0, &tx).await,
        Ok(true)
    ));
    assert_eq!(rx.recv().await.unwrap().unwrap().config.unwrap().version, 1);
    engine.registry().unregister(&session);

    // v2 is uploaded while disconnected. The reconnecting subscriber's
    // latest-fetch must reach the store and come back with v2; a cached
    // latest pointer from the first fetch would have frozen it on v1.
    let session = engine.registry().register("svcA", "i-1", 1);
    let (tx, mut rx) = mpsc::channel(4);
    assert!(matches!(
        engine.deliver_if_newer(&session, 1, &tx).await,
        Ok(true)
    ));
    let update = rx.recv().await.unwrap().unwrap();
    assert_eq!(update.config.unwrap().version, 2);
    assert_eq!(session.current_version(), 2);

    // The write-through left only versioned entries behind.
    assert!(!cache.exists("config:latest:svcA").await.unwrap());
    assert!(cache.exists("config:svcA:v1").await.unwrap());
    assert!(cache.exists("config:svcA:v2").await.unwrap());
}

#[tokio::test]
async fn test_deliver_closed_stream_reports_stream_error() {
    let mut cache = MockConfigCache::new();
    cache.expect_get().returning(|_| Ok(None));
    cache.expect_set().returning(|_, _, _| Ok(()));

    let mut store = MockConfigStore::new();
    store.expect_get_latest().return_once(|_| Ok(doc(2)));

    let engine = engine_with(store, cache, MockEventSink::new());
    let session = engine.registry().register("svcA", "i-1", 0);
    let (tx, rx) = mpsc::channel(4);
    drop(rx);

    let result = engine.deliver_if_newer(&session, 0, &tx).await;
    assert!(matches!(result, Err(DeliveryError::StreamClosed)));
    // Version must not advance when the write never happened.
    assert_eq!(session.current_version(), 0);
}
