//! Shared bootstrap for the server binaries: logging and graceful
//! shutdown signalling.

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stderr logging filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Signals the watch channel once SIGINT, SIGTERM, or Ctrl+C arrives.
///
/// The channel replaces process-global server handles: `main` hands the
/// receiver to everything that needs to stop.
pub async fn wait_for_signal(graceful_tx: watch::Sender<()>) {
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM received");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received");
        },
    }

    let _ = graceful_tx.send(());
}
