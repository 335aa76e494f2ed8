use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Process-local state for one connected subscriber.
///
/// The registry owns the session record; the stream's task owns the stream
/// handle and writes to it; the watchdog only reads the heartbeat tick and
/// cancels the token. Nothing here references the stream, which keeps
/// ownership acyclic and cancellation clean.
pub struct SubscriberSession {
    pub service_name: String,
    pub instance_id: String,
    current_version: AtomicI64,
    /// Milliseconds since the registry epoch, refreshed on every inbound
    /// message.
    last_heartbeat_ms: AtomicU64,
    cancel: CancellationToken,
}

impl SubscriberSession {
    pub fn key(&self) -> String {
        session_key(&self.service_name, &self.instance_id)
    }

    pub fn current_version(&self) -> i64 {
        self.current_version.load(Ordering::Acquire)
    }

    pub fn set_current_version(
        &self,
        version: i64,
    ) {
        self.current_version.store(version, Ordering::Release);
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn last_heartbeat_ms(&self) -> u64 {
        self.last_heartbeat_ms.load(Ordering::Acquire)
    }
}

pub fn session_key(
    service_name: &str,
    instance_id: &str,
) -> String {
    format!("{service_name}:{instance_id}")
}

/// All live subscriber sessions, keyed by `service:instance`.
pub struct SubscriberRegistry {
    epoch: Instant,
    sessions: DashMap<String, Arc<SubscriberSession>>,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            sessions: DashMap::new(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Creates and registers a session, cancelling any stale entry that
    /// still holds the same key (a reconnect racing its own cleanup).
    pub fn register(
        &self,
        service_name: &str,
        instance_id: &str,
        current_version: i64,
    ) -> Arc<SubscriberSession> {
        let session = Arc::new(SubscriberSession {
            service_name: service_name.to_string(),
            instance_id: instance_id.to_string(),
            current_version: AtomicI64::new(current_version),
            last_heartbeat_ms: AtomicU64::new(self.now_ms()),
            cancel: CancellationToken::new(),
        });

        if let Some(stale) = self.sessions.insert(session.key(), session.clone()) {
            stale.cancel.cancel();
        }

        info!(
            key = %session.key(),
            active = self.len(),
            "registered subscriber"
        );
        session
    }

    /// Removes the entry only if it still maps to this session, so a
    /// replacement registered by a reconnect survives the old task's
    /// cleanup.
    pub fn unregister(
        &self,
        session: &Arc<SubscriberSession>,
    ) -> bool {
        let removed = self
            .sessions
            .remove_if(&session.key(), |_, current| Arc::ptr_eq(current, session))
            .is_some();
        if removed {
            info!(key = %session.key(), active = self.len(), "unregistered subscriber");
        }
        removed
    }

    /// Refreshes a session's heartbeat tick.
    pub fn touch(
        &self,
        session: &SubscriberSession,
    ) {
        session
            .last_heartbeat_ms
            .store(self.now_ms(), Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Removes every session whose heartbeat is older than `timeout` and
    /// returns them. Only the map mutation happens under the shard locks;
    /// cancellation and any I/O are the caller's business.
    pub fn evict_stale(
        &self,
        timeout: Duration,
    ) -> Vec<Arc<SubscriberSession>> {
        let now = self.now_ms();
        let timeout_ms = timeout.as_millis() as u64;

        let mut evicted = Vec::new();
        self.sessions.retain(|_, session| {
            let silent_for = now.saturating_sub(session.last_heartbeat_ms());
            if silent_for > timeout_ms {
                evicted.push(session.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Cancels and drops every session; used at shutdown.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        self.sessions.retain(|_, session| {
            session.cancel.cancel();
            count += 1;
            false
        });
        count
    }
}
