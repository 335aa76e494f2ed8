use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use super::*;
use konfig_core::hash::content_hash;
use konfig_proto::common::ConfigDocument;

fn cached_doc(version: i64) -> ConfigDocument {
    let content: &'static [u8] = b"{\"k\":5}";
    ConfigDocument {
        config_id: format!("svcA-v{version}"),
        service_name: "svcA".into(),
        version,
        content: Bytes::from_static(content),
        format: "json".into(),
        content_hash: content_hash(content),
        created_at: 1700000000,
        created_by: "api".into(),
    }
}

// An address nothing listens on; connection attempts fail fast and the
// client must fall back to cached state.
const UNREACHABLE: &str = "http://127.0.0.1:9";

#[test]
fn test_builder_generates_instance_id() {
    let client = ClientBuilder::new(UNREACHABLE, "svcA").build();
    let id = client.instance_id();
    assert!(id.starts_with("instance-"), "unexpected id: {id}");
    assert_eq!(id.len(), "instance-".len() + 6);
    assert!(id["instance-".len()..].chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_builder_keeps_explicit_instance_id() {
    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .instance_id("pod-42")
        .build();
    assert_eq!(client.instance_id(), "pod-42");

    // Empty ids fall back to generation, matching the wire contract.
    let client = ClientBuilder::new(UNREACHABLE, "svcA").instance_id("").build();
    assert!(client.instance_id().starts_with("instance-"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_start_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .cache_dir(dir.path())
        .build();

    client.start().expect("first start");
    assert!(matches!(client.start(), Err(ClientError::AlreadyRunning)));

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cold_start_surfaces_cached_value_offline() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");

    // Seed the disk cache the way a previous run would have.
    DiskCache::new(Some(cache_dir.clone()))
        .save(&cached_doc(5))
        .expect("seed cache");

    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .cache_dir(cache_dir)
        .reconnect_delay(Duration::from_millis(50))
        .build();

    let seen: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_by_callback = seen.clone();
    client.on_config_update(move |doc| {
        seen_by_callback.lock().push(doc.version);
    });

    client.start().expect("start");

    // Hydration is synchronous: the callback has already fired with the
    // cached version even though no server is reachable.
    assert_eq!(*seen.lock(), vec![5]);
    assert_eq!(client.current_version(), 5);
    assert_eq!(
        client.current_config().expect("cached config").content.as_ref(),
        b"{\"k\":5}"
    );
    assert!(!client.is_connected());

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_corrupt_cache_yields_no_value() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");

    let disk = DiskCache::new(Some(cache_dir.clone()));
    let mut tampered = cached_doc(5);
    tampered.content_hash = content_hash(b"tampered");
    disk.save(&tampered).expect("seed corrupt cache");

    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .cache_dir(cache_dir)
        .build();
    client.start().expect("start");

    assert_eq!(client.current_version(), 0);
    assert!(client.current_config().is_none());

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_prompt_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .cache_dir(dir.path())
        // Long delay: stop must interrupt the reconnect wait, not ride it
        // out.
        .reconnect_delay(Duration::from_secs(600))
        .build();

    client.start().expect("start");
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(5), client.stop())
        .await
        .expect("stop should interrupt the reconnect wait");

    // A second stop is a no-op.
    client.stop().await;
    assert!(!client.is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_panic_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    DiskCache::new(Some(cache_dir.clone()))
        .save(&cached_doc(1))
        .expect("seed cache");

    let client = ClientBuilder::new(UNREACHABLE, "svcA")
        .cache_dir(cache_dir)
        .build();
    client.on_config_update(|_| panic!("application bug"));

    // The panic is swallowed; start still succeeds and state is intact.
    client.start().expect("start");
    assert_eq!(client.current_version(), 1);

    client.stop().await;
}
