use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tonic::transport::Server;
use tracing::error;
use tracing::info;
use tracing::warn;

use konfig_core::constants::MAX_MESSAGE_SIZE_BYTES;
use konfig_core::events::EventSink;
use konfig_core::events::KafkaEvents;
use konfig_core::events::NoopEvents;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::store::PostgresStore;
use konfig_core::validator::ConfigValidator;
use konfig_core::validator::GrpcValidator;
use konfig_core::Error;
use konfig_core::KonfigConfig;
use konfig_proto::api::config_api_service_server::ConfigApiServiceServer;
use konfig_server::api::ApiService;
use konfig_server::runtime;

#[derive(Parser)]
#[command(name = "konfig-api", version)]
#[command(about = "konfig control-plane API - upload, list, rollout and rollback configs")]
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
            error!(error = %e, "api service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<&str>) -> konfig_core::Result<()> {
    let mut config = KonfigConfig::load(config_path)?;
    if config.statsd.prefix.is_empty() {
        config.statsd.prefix = "api".to_string();
    }
    let metrics = StatsdSink::new(&config.statsd);

    let store = PostgresStore::connect(&config.postgres).await?;
    store.ensure_schema().await?;
    let store: Arc<dyn ConfigStore> = Arc::new(store);

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

    let validator: Arc<dyn ConfigValidator> = Arc::new(GrpcValidator::new(&config.validation));

    let service = ApiService::new(
        store,
        events,
        validator,
        metrics,
        config.validation.clone(),
    );

    let (graceful_tx, mut graceful_rx) = watch::channel(());
    tokio::spawn(runtime::wait_for_signal(graceful_tx));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.server.port)
        .parse()
        .map_err(|e| Error::Fatal(format!("invalid listen address: {e}")))?;
    info!(%addr, "api service listening");

    Server::builder()
        .add_service(
            ConfigApiServiceServer::new(service)
                .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
                .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES),
        )
        .serve_with_shutdown(addr, async move {
            let _ = graceful_rx.changed().await;
        })
        .await
        .map_err(|e| Error::Fatal(format!("server error: {e}")))?;

    if let Some(kafka) = kafka {
        let _ = tokio::task::spawn_blocking(move || kafka.flush()).await;
    }

    info!("api service stopped");
    Ok(())
}
