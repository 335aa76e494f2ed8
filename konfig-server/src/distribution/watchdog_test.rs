use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::*;
use konfig_core::metrics::StatsdSink;
use konfig_core::MonitoringConfig;

fn config(
    interval: u64,
    timeout: u64,
) -> MonitoringConfig {
    MonitoringConfig {
        heartbeat_interval: interval,
        heartbeat_timeout: timeout,
    }
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_evicts_silent_session() {
    let registry = Arc::new(SubscriberRegistry::new());
    let session = registry.register("svcA", "silent", 0);

    let (_shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = spawn_watchdog(
        registry.clone(),
        StatsdSink::disabled(),
        config(1, 2),
        shutdown_rx,
    );

    // Paused time auto-advances; a few watchdog ticks pass the 2 s timeout.
    tokio::time::timeout(Duration::from_secs(60), async {
        while !registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("silent session should be evicted");

    assert!(session.cancel_token().is_cancelled());
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_spares_heartbeating_session() {
    let registry = Arc::new(SubscriberRegistry::new());
    let session = registry.register("svcA", "chatty", 0);

    let (_shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = spawn_watchdog(
        registry.clone(),
        StatsdSink::disabled(),
        config(1, 3),
        shutdown_rx,
    );

    // Touch faster than the timeout for a while.
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        registry.touch(&session);
    }

    assert_eq!(registry.len(), 1);
    assert!(!session.cancel_token().is_cancelled());
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_stops_on_shutdown() {
    let registry = Arc::new(SubscriberRegistry::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = spawn_watchdog(
        registry,
        StatsdSink::disabled(),
        config(1, 2),
        shutdown_rx,
    );

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("watchdog should exit on shutdown")
        .expect("watchdog task should join cleanly");
}
