use bytes::Bytes;
use prost::Message;

use super::*;
use crate::cache::MockConfigCache;

#[test]
fn test_key_scheme() {
    assert_eq!(latest_key("payments"), "config:latest:payments");
    assert_eq!(versioned_key("payments", 3), "config:payments:v3");
    assert_eq!(document_key("payments", 0), "config:latest:payments");
    assert_eq!(document_key("payments", -1), "config:latest:payments");
    assert_eq!(document_key("payments", 9), "config:payments:v9");
}

fn doc(version: i64) -> ConfigDocument {
    ConfigDocument {
        config_id: format!("svcA-v{version}"),
        service_name: "svcA".into(),
        version,
        content: Bytes::from_static(b"{}"),
        format: "json".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_cached_document_decodes_hit() {
    let mut cache = MockConfigCache::new();
    let encoded = doc(4).encode_to_vec();
    cache
        .expect_get()
        .withf(|key| key == "config:latest:svcA")
        .return_once(move |_| Ok(Some(encoded)));

    let found = cached_document(&cache, "svcA", 0).await;
    assert_eq!(found.unwrap().version, 4);
}

#[tokio::test]
async fn test_cached_document_degrades_errors_to_miss() {
    let mut cache = MockConfigCache::new();
    cache
        .expect_get()
        .return_once(|_| Err(CacheError::Unavailable("down".into())));

    assert!(cached_document(&cache, "svcA", 1).await.is_none());
}

#[tokio::test]
async fn test_cached_document_rejects_garbage() {
    let mut cache = MockConfigCache::new();
    cache
        .expect_get()
        .return_once(|_| Ok(Some(vec![0xff, 0xfe, 0xfd])));

    assert!(cached_document(&cache, "svcA", 1).await.is_none());
}

#[tokio::test]
async fn test_cache_document_writes_only_versioned_key() {
    let mut cache = MockConfigCache::new();
    cache
        .expect_set()
        .withf(|key, _, ttl| key == "config:svcA:v4" && *ttl == 300)
        .times(1)
        .returning(|_, _, _| Ok(()));
    // No second expectation on purpose: writing config:latest:svcA would
    // pin every latest-lookup to v4 for the TTL, and the mock panics on
    // any unexpected set.

    cache_document(&cache, &doc(4), 300).await;
}
