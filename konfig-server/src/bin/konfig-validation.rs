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
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::store::PostgresStore;
use konfig_core::Error;
use konfig_core::KonfigConfig;
use konfig_proto::validation::validation_service_server::ValidationServiceServer;
use konfig_server::runtime;
use konfig_server::validation::ValidationEngine;

#[derive(Parser)]
#[command(name = "konfig-validation", version)]
#[command(about = "konfig validation service - schema and rule checks for uploads")]
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
            error!(error = %e, "validation service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<&str>) -> konfig_core::Result<()> {
    let mut config = KonfigConfig::load(config_path)?;
    if config.statsd.prefix.is_empty() {
        config.statsd.prefix = "validation".to_string();
    }
    let metrics = StatsdSink::new(&config.statsd);

    let store = PostgresStore::connect(&config.postgres).await?;
    store.ensure_schema().await?;
    let store: Arc<dyn ConfigStore> = Arc::new(store);

    let cache: Arc<dyn ConfigCache> = match RedisCache::connect(&config.redis).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, "cache unavailable, verdict caching disabled");
            Arc::new(NoopCache)
        }
    };

    let engine = ValidationEngine::new(
        store,
        cache,
        metrics,
        config.validation.clone(),
        config.redis.cache_ttl,
    );

    let (graceful_tx, mut graceful_rx) = watch::channel(());
    tokio::spawn(runtime::wait_for_signal(graceful_tx));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.server.port)
        .parse()
        .map_err(|e| Error::Fatal(format!("invalid listen address: {e}")))?;
    info!(%addr, "validation service listening");

    Server::builder()
        .add_service(
            ValidationServiceServer::new(engine)
                .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
                .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES),
        )
        .serve_with_shutdown(addr, async move {
            let _ = graceful_rx.changed().await;
        })
        .await
        .map_err(|e| Error::Fatal(format!("server error: {e}")))?;

    info!("validation service stopped");
    Ok(())
}
