use std::time::Duration;

use super::registry::session_key;
use super::*;

#[tokio::test]
async fn test_register_and_len() {
    let registry = SubscriberRegistry::new();
    assert!(registry.is_empty());

    let session = registry.register("svcA", "i-1", 0);
    assert_eq!(registry.len(), 1);
    assert_eq!(session.key(), session_key("svcA", "i-1"));
    assert_eq!(session.current_version(), 0);
}

#[tokio::test]
async fn test_reregister_same_key_cancels_stale_session() {
    let registry = SubscriberRegistry::new();

    let old = registry.register("svcA", "i-1", 1);
    let new = registry.register("svcA", "i-1", 2);

    assert_eq!(registry.len(), 1);
    assert!(old.cancel_token().is_cancelled());
    assert!(!new.cancel_token().is_cancelled());
}

#[tokio::test]
async fn test_stale_unregister_spares_replacement() {
    let registry = SubscriberRegistry::new();

    let old = registry.register("svcA", "i-1", 1);
    let new = registry.register("svcA", "i-1", 2);

    // The old task's cleanup runs after the reconnect re-registered.
    assert!(!registry.unregister(&old));
    assert_eq!(registry.len(), 1);

    assert!(registry.unregister(&new));
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_evict_stale_keeps_touched_sessions() {
    let registry = SubscriberRegistry::new();

    let silent = registry.register("svcA", "silent", 0);
    let chatty = registry.register("svcA", "chatty", 0);

    tokio::time::advance(Duration::from_secs(60)).await;
    registry.touch(&chatty);

    let evicted = registry.evict_stale(Duration::from_secs(30));
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].key(), silent.key());
    assert_eq!(registry.len(), 1);

    // Eviction removes from the registry but leaves cancellation to the
    // watchdog.
    assert!(!silent.cancel_token().is_cancelled());
}

#[tokio::test]
async fn test_drain_cancels_everything() {
    let registry = SubscriberRegistry::new();
    let a = registry.register("svcA", "i-1", 0);
    let b = registry.register("svcB", "i-2", 0);

    assert_eq!(registry.drain(), 2);
    assert!(registry.is_empty());
    assert!(a.cancel_token().is_cancelled());
    assert!(b.cancel_token().is_cancelled());
}

#[tokio::test]
async fn test_session_version_updates() {
    let registry = SubscriberRegistry::new();
    let session = registry.register("svcA", "i-1", 3);
    session.set_current_version(5);
    assert_eq!(session.current_version(), 5);
}
