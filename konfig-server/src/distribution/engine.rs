//! The Subscribe protocol and read-through fetch.
//!
//! Each stream runs on its own task writing into an mpsc channel; the
//! registry and watchdog only ever see session metadata, never the stream.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tonic::Streaming;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::registry::SubscriberRegistry;
use super::registry::SubscriberSession;
use konfig_core::cache::cache_document;
use konfig_core::cache::cached_document;
use konfig_core::cache::ConfigCache;
use konfig_core::constants::event_types;
use konfig_core::events::emit;
use konfig_core::events::Event;
use konfig_core::events::EventSink;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::store::InstanceStatus;
use konfig_core::StoreError;
use konfig_proto::common::ConfigDocument;
use konfig_proto::distribution::distribution_service_server::DistributionService;
use konfig_proto::distribution::ConfigUpdate;
use konfig_proto::distribution::SubscribeRequest;

/// Why a delivery attempt did not hand a document to the stream.
pub(crate) enum DeliveryError {
    Store(StoreError),
    StreamClosed,
}

/// The streaming fan-out engine.
///
/// Cheap to clone; every connection task carries its own handle.
#[derive(Clone)]
pub struct DistributionEngine {
    store: Arc<dyn ConfigStore>,
    cache: Arc<dyn ConfigCache>,
    events: Arc<dyn EventSink>,
    metrics: StatsdSink,
    registry: Arc<SubscriberRegistry>,
    cache_ttl: u64,
    max_subscribers: u32,
}

impl DistributionEngine {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        cache: Arc<dyn ConfigCache>,
        events: Arc<dyn EventSink>,
        metrics: StatsdSink,
        cache_ttl: u64,
        max_subscribers: u32,
    ) -> Self {
        Self {
            store,
            cache,
            events,
            metrics,
            registry: Arc::new(SubscriberRegistry::new()),
            cache_ttl,
            max_subscribers,
        }
    }

    /// The registry is shared with the heartbeat watchdog.
    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        self.registry.clone()
    }

    /// Read-through fetch: cache first, then store, filling the cache on a
    /// miss. A non-positive `version` means "latest". Returns the empty
    /// sentinel when the service has no config at all.
    pub(crate) async fn fetch_document(
        &self,
        service_name: &str,
        version: i64,
    ) -> Result<ConfigDocument, StoreError> {
        let _fetch_timer = self.metrics.timer("config.fetch_time");

        {
            let _cache_timer = self.metrics.timer("cache.lookup_time");
            if let Some(doc) = cached_document(self.cache.as_ref(), service_name, version).await {
                return Ok(doc);
            }
        }

        let doc = {
            let _db_timer = self.metrics.timer("database.query_time");
            if version <= 0 {
                self.store.get_latest(service_name).await?
            } else {
                self.store.get_by_version(service_name, version).await?
            }
        };

        if doc.version > 0 {
            cache_document(self.cache.as_ref(), &doc, self.cache_ttl).await;
        }
        Ok(doc)
    }

    /// Fetches the latest document and queues it when it is newer than
    /// `client_version`. Updates session state, the instance row, the
    /// audit trail, and the bus on delivery.
    pub(crate) async fn deliver_if_newer(
        &self,
        session: &Arc<SubscriberSession>,
        client_version: i64,
        tx: &mpsc::Sender<Result<ConfigUpdate, Status>>,
    ) -> Result<bool, DeliveryError> {
        let doc = self
            .fetch_document(&session.service_name, -1)
            .await
            .map_err(DeliveryError::Store)?;

        if doc.version <= client_version {
            return Ok(false);
        }

        let force_reload = doc.version > session.current_version();
        let version = doc.version;
        let update = ConfigUpdate::new_config(doc, force_reload);

        if tx.send(Ok(update)).await.is_err() {
            self.metrics.incr("config.failed");
            return Err(DeliveryError::StreamClosed);
        }

        session.set_current_version(version);
        self.metrics.incr("config.sent");
        info!(
            service = %session.service_name,
            instance = %session.instance_id,
            version,
            "sent config"
        );

        if let Err(e) = self
            .store
            .update_instance_status(
                &session.service_name,
                &session.instance_id,
                version,
                InstanceStatus::Connected,
            )
            .await
        {
            warn!(error = %e, "instance row update failed");
        }
        if let Err(e) = self
            .store
            .record_delivery(&session.service_name, &session.instance_id, version)
            .await
        {
            warn!(error = %e, "delivery audit failed");
        }
        emit(
            self.events.as_ref(),
            Event::new(event_types::CONFIG_UPDATE, &session.service_name)
                .instance(&session.instance_id)
                .version(version),
        )
        .await;

        Ok(true)
    }

    /// Heartbeat loop plus terminal cleanup for one connection. Runs on its
    /// own task until the peer goes away, the stream write fails, or the
    /// watchdog cancels the session.
    async fn serve_connection(
        self,
        session: Arc<SubscriberSession>,
        mut inbound: Streaming<SubscribeRequest>,
        tx: mpsc::Sender<Result<ConfigUpdate, Status>>,
    ) {
        loop {
            tokio::select! {
                _ = session.cancel_token().cancelled() => {
                    debug!(key = %session.key(), "session cancelled");
                    break;
                }
                message = inbound.message() => {
                    match message {
                        Ok(Some(_heartbeat)) => {
                            self.registry.touch(&session);
                            self.metrics.incr("heartbeat.received");

                            // A version committed while this subscriber was
                            // idle goes out on its next heartbeat.
                            match self
                                .deliver_if_newer(&session, session.current_version(), &tx)
                                .await
                            {
                                Ok(_) => {}
                                Err(DeliveryError::StreamClosed) => break,
                                Err(DeliveryError::Store(e)) => {
                                    warn!(error = %e, "heartbeat refetch failed");
                                }
                            }

                            if tx.send(Ok(ConfigUpdate::heartbeat_ack())).await.is_err() {
                                debug!(key = %session.key(), "ack write failed, closing");
                                break;
                            }
                        }
                        Ok(None) => {
                            debug!(key = %session.key(), "peer closed stream");
                            break;
                        }
                        Err(e) => {
                            debug!(key = %session.key(), error = %e, "stream read failed");
                            break;
                        }
                    }
                }
            }
        }

        self.registry.unregister(&session);
        self.metrics.incr("client.disconnect");
        self.metrics.gauge("clients.active", self.registry.len() as i64);

        emit(
            self.events.as_ref(),
            Event::new(event_types::CLIENT_DISCONNECT, &session.service_name)
                .instance(&session.instance_id),
        )
        .await;

        if let Err(e) = self
            .store
            .update_instance_status(
                &session.service_name,
                &session.instance_id,
                session.current_version(),
                InstanceStatus::Disconnected,
            )
            .await
        {
            warn!(error = %e, "instance row update failed");
        }

        info!(key = %session.key(), "subscription ended");
    }
}

#[tonic::async_trait]
impl DistributionService for DistributionEngine {
    type SubscribeStream = Pin<Box<dyn Stream<Item = Result<ConfigUpdate, Status>> + Send>>;

    async fn subscribe(
        &self,
        request: Request<Streaming<SubscribeRequest>>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let mut inbound = request.into_inner();

        let initial = match inbound.message().await {
            Ok(Some(request)) => request,
            Ok(None) | Err(_) => {
                self.metrics.incr("config.failed");
                return Err(Status::invalid_argument("Failed to read subscribe request"));
            }
        };

        if self.max_subscribers > 0 && self.registry.len() >= self.max_subscribers as usize {
            return Err(Status::resource_exhausted("Subscriber limit reached"));
        }

        info!(
            service = %initial.service_name,
            instance = %initial.instance_id,
            version = initial.current_version,
            "new subscription"
        );

        let session = self.registry.register(
            &initial.service_name,
            &initial.instance_id,
            initial.current_version,
        );

        self.metrics.incr("client.connect");
        self.metrics.gauge("clients.active", self.registry.len() as i64);
        emit(
            self.events.as_ref(),
            Event::new(event_types::CLIENT_CONNECT, &initial.service_name)
                .instance(&initial.instance_id),
        )
        .await;
        if let Err(e) = self
            .store
            .update_instance_status(
                &initial.service_name,
                &initial.instance_id,
                initial.current_version,
                InstanceStatus::Connected,
            )
            .await
        {
            warn!(error = %e, "instance row update failed");
        }

        let (tx, rx) = mpsc::channel(32);

        match self
            .deliver_if_newer(&session, initial.current_version, &tx)
            .await
        {
            Ok(_) => {}
            Err(DeliveryError::Store(e)) => {
                warn!(error = %e, "initial fetch failed");
                self.metrics.incr("config.failed");
                self.registry.unregister(&session);
                return Err(Status::internal("Failed to fetch config"));
            }
            Err(DeliveryError::StreamClosed) => {
                self.registry.unregister(&session);
                return Err(Status::internal("Failed to send config"));
            }
        }

        let engine = self.clone();
        tokio::spawn(engine.serve_connection(session, inbound, tx));

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}
