use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Endpoint;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::disk_cache::DiskCache;
use crate::error::ClientError;
use crate::error::Result;
use konfig_core::constants::MAX_MESSAGE_SIZE_BYTES;
use konfig_proto::common::ConfigDocument;
use konfig_proto::distribution::distribution_service_client::DistributionServiceClient;
use konfig_proto::distribution::ConfigUpdate;
use konfig_proto::distribution::SubscribeRequest;

type UpdateCallback = Arc<dyn Fn(&ConfigDocument) + Send + Sync>;
type StatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

struct ClientShared {
    server_address: String,
    service_name: String,
    instance_id: String,
    reconnect_delay: Duration,
    heartbeat_interval: Duration,
    connect_timeout: Duration,
    disk_cache: DiskCache,
    /// Last received document; the version lives inside it.
    current: Mutex<Option<ConfigDocument>>,
    connected: AtomicBool,
    running: AtomicBool,
    update_callback: Mutex<Option<UpdateCallback>>,
    status_callback: Mutex<Option<StatusCallback>>,
}

impl ClientShared {
    fn current_version(&self) -> i64 {
        self.current
            .lock()
            .as_ref()
            .map(|doc| doc.version)
            .unwrap_or(0)
    }

    /// Replaces the held document and fans out to the application. The
    /// callback runs with no locks held; panics are contained.
    fn apply_document(
        &self,
        doc: ConfigDocument,
    ) {
        {
            let mut current = self.current.lock();
            *current = Some(doc.clone());
        }

        if let Err(e) = self.disk_cache.save(&doc) {
            warn!(service = %self.service_name, error = %e, "disk cache save failed");
        }

        let callback = self
            .update_callback
            .lock()
            .clone();
        if let Some(callback) = callback {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(&doc))).is_err() {
                warn!(service = %self.service_name, "config update callback panicked");
            }
        }
    }

    /// Edge-triggered connection status with callback fan-out.
    fn set_connected(
        &self,
        connected: bool,
    ) {
        let was_connected = self.connected.swap(connected, Ordering::AcqRel);
        if was_connected == connected {
            return;
        }

        info!(
            service = %self.service_name,
            status = if connected { "connected" } else { "disconnected" },
            "connection status changed"
        );

        let callback = self
            .status_callback
            .lock()
            .clone();
        if let Some(callback) = callback {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(connected))).is_err() {
                warn!(service = %self.service_name, "connection status callback panicked");
            }
        }
    }
}

/// Streaming subscriber for one service's configuration.
///
/// `start()` hydrates from the disk cache synchronously, then keeps a
/// subscription alive on a background task until `stop()`.
pub struct ConfigClient {
    shared: Arc<ClientShared>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl ConfigClient {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        server_address: String,
        service_name: String,
        instance_id: String,
        cache_dir: Option<PathBuf>,
        reconnect_delay: Duration,
        heartbeat_interval: Duration,
        connect_timeout: Duration,
    ) -> Self {
        info!(service = %service_name, instance = %instance_id, "created config client");
        Self {
            shared: Arc::new(ClientShared {
                server_address,
                service_name,
                instance_id,
                reconnect_delay,
                heartbeat_interval,
                connect_timeout,
                disk_cache: DiskCache::new(cache_dir),
                current: Mutex::new(None),
                connected: AtomicBool::new(false),
                running: AtomicBool::new(false),
                update_callback: Mutex::new(None),
                status_callback: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.shared.service_name
    }

    pub fn instance_id(&self) -> &str {
        &self.shared.instance_id
    }

    /// Loads the verified disk-cache entry (the application observes a
    /// value immediately), then launches the stream loop.
    pub fn start(&self) -> Result<()> {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Err(ClientError::AlreadyRunning);
        }

        info!(service = %self.shared.service_name, "starting config client");

        if let Some(cached) = self.shared.disk_cache.load(&self.shared.service_name) {
            info!(
                service = %self.shared.service_name,
                version = cached.version,
                "hydrated from disk cache"
            );
            self.shared.apply_document(cached);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(stream_loop(self.shared.clone(), token.clone()));
        *self.task.lock() = Some((token, handle));

        Ok(())
    }

    /// Cancels the active stream, wakes any reconnect sleep, and joins the
    /// background task. Idempotent.
    pub async fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        info!(service = %self.shared.service_name, "stopping config client");

        let task = self.task.lock().take();
        if let Some((token, handle)) = task {
            token.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "stream task join failed");
            }
        }

        self.shared.set_connected(false);
        info!(service = %self.shared.service_name, "config client stopped");
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// The most recent document, from the stream or the disk cache.
    pub fn current_config(&self) -> Option<ConfigDocument> {
        self.shared
            .current
            .lock()
            .clone()
    }

    pub fn current_version(&self) -> i64 {
        self.shared.current_version()
    }

    /// Registers the update callback; reassignment replaces the previous
    /// one.
    pub fn on_config_update<F>(
        &self,
        callback: F,
    ) where
        F: Fn(&ConfigDocument) + Send + Sync + 'static,
    {
        *self
            .shared
            .update_callback
            .lock() = Some(Arc::new(callback));
    }

    /// Registers the connection-status callback; reassignment replaces the
    /// previous one.
    pub fn on_connection_status<F>(
        &self,
        callback: F,
    ) where
        F: Fn(bool) + Send + Sync + 'static,
    {
        *self
            .shared
            .status_callback
            .lock() = Some(Arc::new(callback));
    }
}

/// Reconnect forever until stopped; every transport failure funnels into
/// the delay-and-retry path.
async fn stream_loop(
    shared: Arc<ClientShared>,
    token: CancellationToken,
) {
    while shared.running.load(Ordering::Acquire) && !token.is_cancelled() {
        match connect_and_subscribe(&shared, &token).await {
            Ok(()) => {}
            Err(e) => {
                debug!(service = %shared.service_name, error = %e, "subscription attempt failed");
            }
        }
        shared.set_connected(false);

        if shared.running.load(Ordering::Acquire) && !token.is_cancelled() {
            debug!(
                service = %shared.service_name,
                delay_secs = shared.reconnect_delay.as_secs(),
                "reconnecting after delay"
            );
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(shared.reconnect_delay) => {}
            }
        }
    }
}

async fn connect_and_subscribe(
    shared: &Arc<ClientShared>,
    token: &CancellationToken,
) -> Result<()> {
    let address = if shared.server_address.contains("://") {
        shared.server_address.clone()
    } else {
        format!("http://{}", shared.server_address)
    };

    let channel = Endpoint::from_shared(address)
        .map_err(|_| ClientError::InvalidAddress(shared.server_address.clone()))?
        .connect_timeout(shared.connect_timeout)
        .connect()
        .await
        .map_err(|e| ClientError::Transport(Box::new(e)))?;

    let mut client = DistributionServiceClient::new(channel)
        .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
        .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES);

    let (tx, rx) = mpsc::channel::<SubscribeRequest>(8);
    tx.send(SubscribeRequest {
        service_name: shared.service_name.clone(),
        instance_id: shared.instance_id.clone(),
        current_version: shared.current_version(),
    })
    .await
    .ok();

    let response = client
        .subscribe(ReceiverStream::new(rx))
        .await
        .map_err(|e| ClientError::Status(Box::new(e)))?;
    let mut inbound = response.into_inner();

    shared.set_connected(true);
    info!(
        service = %shared.service_name,
        server = %shared.server_address,
        "subscribed"
    );

    let mut heartbeat = tokio::time::interval(shared.heartbeat_interval);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(service = %shared.service_name, "stream cancelled");
                return Ok(());
            }
            _ = heartbeat.tick() => {
                let beat = SubscribeRequest::heartbeat(
                    &shared.service_name,
                    &shared.instance_id,
                    shared.current_version(),
                );
                if tx.send(beat).await.is_err() {
                    return Ok(());
                }
            }
            message = inbound.message() => {
                match message {
                    Ok(Some(update)) => handle_update(shared, update),
                    Ok(None) => {
                        debug!(service = %shared.service_name, "stream closed by server");
                        return Ok(());
                    }
                    Err(status) => {
                        return Err(ClientError::Status(Box::new(status)));
                    }
                }
            }
        }
    }
}

fn handle_update(
    shared: &Arc<ClientShared>,
    update: ConfigUpdate,
) {
    // Heartbeat acks carry no document.
    let Some(doc) = update.config else {
        return;
    };

    info!(
        service = %shared.service_name,
        version = doc.version,
        force_reload = update.force_reload,
        "received config update"
    );
    shared.apply_document(doc);
}
