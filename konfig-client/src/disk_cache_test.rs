use bytes::Bytes;

use super::disk_cache::DiskCache;
use konfig_core::hash::content_hash;
use konfig_proto::common::ConfigDocument;

fn doc(
    service_name: &str,
    version: i64,
    content: &'static [u8],
) -> ConfigDocument {
    ConfigDocument {
        config_id: format!("{service_name}-v{version}"),
        service_name: service_name.into(),
        version,
        content: Bytes::from_static(content),
        format: "json".into(),
        content_hash: content_hash(content),
        created_at: 1700000000,
        created_by: "api".into(),
    }
}

fn cache_in_tempdir() -> (tempfile::TempDir, DiskCache) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let cache = DiskCache::new(Some(dir.path().join("cache")));
    (dir, cache)
}

#[test]
fn test_save_load_round_trip() {
    let (_dir, cache) = cache_in_tempdir();
    let saved = doc("svcA", 5, b"{\"k\":1}");

    cache.save(&saved).expect("save");
    assert!(cache.exists("svcA"));

    let loaded = cache.load("svcA").expect("load");
    assert_eq!(loaded, saved);
}

#[test]
fn test_save_twice_keeps_final_bytes() {
    let (_dir, cache) = cache_in_tempdir();

    cache.save(&doc("svcA", 1, b"{\"k\":1}")).expect("save v1");
    cache.save(&doc("svcA", 2, b"{\"k\":2}")).expect("save v2");

    let loaded = cache.load("svcA").expect("load");
    assert_eq!(loaded.version, 2);
    assert_eq!(loaded.content.as_ref(), b"{\"k\":2}");
}

#[test]
fn test_load_missing_is_none_not_error() {
    let (_dir, cache) = cache_in_tempdir();
    assert!(cache.load("never-saved").is_none());
    assert!(!cache.exists("never-saved"));
}

#[test]
fn test_undecodable_file_is_deleted() {
    let (_dir, cache) = cache_in_tempdir();
    // Seed the directory, then corrupt the file wholesale.
    cache.save(&doc("svcA", 1, b"{}")).expect("save");
    std::fs::write(cache.path("svcA"), b"\xff\xfe not protobuf").expect("corrupt");

    assert!(cache.load("svcA").is_none());
    assert!(!cache.exists("svcA"));
}

#[test]
fn test_hash_mismatch_is_discarded() {
    let (_dir, cache) = cache_in_tempdir();

    let mut tampered = doc("svcA", 3, b"{\"k\":3}");
    tampered.content_hash = content_hash(b"something else entirely");
    cache.save(&tampered).expect("save");

    assert!(cache.load("svcA").is_none());
    // The corrupt entry is removed, not left to fail again.
    assert!(!cache.exists("svcA"));
}

#[test]
fn test_empty_hash_skips_verification() {
    let (_dir, cache) = cache_in_tempdir();

    let mut unhashed = doc("svcA", 1, b"{}");
    unhashed.content_hash = String::new();
    cache.save(&unhashed).expect("save");

    assert_eq!(cache.load("svcA").expect("load").version, 1);
}

#[test]
fn test_service_name_sanitized_in_path() {
    let (_dir, cache) = cache_in_tempdir();

    let path = cache.path("team/payments\\eu");
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "team_payments_eu.cache"
    );

    // And the sanitized name round-trips through save/load.
    cache
        .save(&doc("team/payments\\eu", 1, b"{}"))
        .expect("save");
    assert!(cache.load("team/payments\\eu").is_some());
}

#[test]
fn test_no_temp_file_left_behind() {
    let (_dir, cache) = cache_in_tempdir();
    cache.save(&doc("svcA", 1, b"{}")).expect("save");

    let dir = cache.path("svcA").parent().unwrap().to_path_buf();
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
