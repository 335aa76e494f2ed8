use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tonic::transport::Server;
use tracing::error;
use tracing::info;
use tracing::warn;

use konfig_core::cache::ConfigCache;
use konfig_core::cache::NoopCache;
use konfig_core::cache::RedisCache;
use konfig_core::constants::MAX_MESSAGE_SIZE_BYTES;
use konfig_core::events::EventSink;
use konfig_core::events::KafkaEvents;
use konfig_core::events::NoopEvents;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::store::PostgresStore;
use konfig_core::Error;
use konfig_core::KonfigConfig;
use konfig_proto::distribution::distribution_service_server::DistributionServiceServer;
use konfig_server::distribution::spawn_watchdog;
use konfig_server::distribution::DistributionEngine;
use konfig_server::runtime;

#[derive(Parser)]
#[command(name = "konfig-distribution", version)]
#[command(about = "konfig distribution service - streams config versions to subscribers")]
struct Args {
    /// Path to a YAML configuration file
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    runtime::init_tracing();
    let args = Args::parse();

    match run(args.config.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "distribution service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<&str>) -> konfig_core::Result<()> {
    let mut config = KonfigConfig::load(config_path)?;
    if config.statsd.prefix.is_empty() {
        config.statsd.prefix = "distribution".to_string();
    }
    let metrics = StatsdSink::new(&config.statsd);

    let store = PostgresStore::connect(&config.postgres).await?;
    store.ensure_schema().await?;
    let store: Arc<dyn ConfigStore> = Arc::new(store);

    // Cache and events are optional collaborators: a miss-only cache and a
    // silent bus degrade service quality, not availability.
    let cache: Arc<dyn ConfigCache> = match RedisCache::connect(&config.redis).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, "cache unavailable, continuing without cache");
            Arc::new(NoopCache)
        }
    };
    let kafka = match KafkaEvents::new(&config.kafka) {
        Ok(kafka) => Some(Arc::new(kafka)),
        Err(e) => {
            warn!(error = %e, "event producer unavailable, continuing without events");
            None
        }
    };
    let events: Arc<dyn EventSink> = match &kafka {
        Some(kafka) => kafka.clone(),
        None => Arc::new(NoopEvents),
    };

    let engine = DistributionEngine::new(
        store,
        cache,
        events,
        metrics.clone(),
        config.redis.cache_ttl,
        config.server.max_connections,
    );
    let registry = engine.registry();

    let (graceful_tx, graceful_rx) = watch::channel(());
    tokio::spawn(runtime::wait_for_signal(graceful_tx));

    let watchdog = spawn_watchdog(
        registry.clone(),
        metrics.clone(),
        config.monitoring.clone(),
        graceful_rx.clone(),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.server.port)
        .parse()
        .map_err(|e| Error::Fatal(format!("invalid listen address: {e}")))?;
    info!(%addr, "distribution service listening");

    let mut shutdown_rx = graceful_rx;
    Server::builder()
        .add_service(
            DistributionServiceServer::new(engine)
                .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
                .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES),
        )
        .serve_with_shutdown(addr, async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(|e| Error::Fatal(format!("server error: {e}")))?;

    let drained = registry.drain();
    info!(drained, "subscriber sessions drained");

    let _ = watchdog.await;
    if let Some(kafka) = kafka {
        let _ = tokio::task::spawn_blocking(move || kafka.flush()).await;
    }

    info!("distribution service stopped");
    Ok(())
}
