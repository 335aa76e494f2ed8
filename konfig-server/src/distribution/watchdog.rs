//! Background eviction of silent subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use super::registry::SubscriberRegistry;
use konfig_core::metrics::StatsdSink;
use konfig_core::MonitoringConfig;

/// Spawns the single watchdog task.
///
/// Every `heartbeat_interval` it scans the registry and evicts sessions
/// silent for longer than `heartbeat_timeout`. Eviction cancels the
/// session token; the session's own task runs the disconnect cleanup, so
/// no stream or store I/O happens here beyond logging.
pub fn spawn_watchdog(
    registry: Arc<SubscriberRegistry>,
    metrics: StatsdSink,
    config: MonitoringConfig,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(config.heartbeat_interval);
    let timeout = Duration::from_secs(config.heartbeat_timeout);

    tokio::spawn(async move {
        info!(
            interval_secs = config.heartbeat_interval,
            timeout_secs = config.heartbeat_timeout,
            "heartbeat watchdog started"
        );

        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh server does
        // not scan an empty registry.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = registry.evict_stale(timeout);
                    for session in evicted {
                        warn!(key = %session.key(), "heartbeat timeout, evicting");
                        metrics.incr("heartbeat.timeout");
                        session.cancel_token().cancel();
                    }
                    metrics.gauge("clients.active", registry.len() as i64);
                }
                _ = shutdown.changed() => {
                    info!("heartbeat watchdog stopping");
                    break;
                }
            }
        }
    })
}
