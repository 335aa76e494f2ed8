use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::client::ConfigClient;

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configurable builder for [`ConfigClient`] instances.
///
/// # Default Configuration
/// - Instance id: generated (`instance-<6 digits>`)
/// - Cache dir: `$HOME/.konfig/cache`
/// - Reconnect delay: 5s
/// - Heartbeat interval: 30s
pub struct ClientBuilder {
    server_address: String,
    service_name: String,
    instance_id: Option<String>,
    cache_dir: Option<PathBuf>,
    reconnect_delay: Duration,
    heartbeat_interval: Duration,
    connect_timeout: Duration,
}

impl ClientBuilder {
    pub fn new(
        server_address: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            server_address: server_address.into(),
            service_name: service_name.into(),
            instance_id: None,
            cache_dir: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Stable identity for this instance; generated when not set.
    pub fn instance_id(
        mut self,
        instance_id: impl Into<String>,
    ) -> Self {
        let instance_id = instance_id.into();
        if !instance_id.is_empty() {
            self.instance_id = Some(instance_id);
        }
        self
    }

    /// Overrides the disk-cache directory.
    pub fn cache_dir(
        mut self,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Wait between reconnect attempts (default: 5s).
    pub fn reconnect_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Cadence of liveness heartbeats on the stream (default: 30s). Keep
    /// it below the server's heartbeat timeout.
    pub fn heartbeat_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Channel connect timeout (default: 5s).
    pub fn connect_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> ConfigClient {
        let instance_id = self.instance_id.unwrap_or_else(generate_instance_id);
        ConfigClient::new(
            self.server_address,
            self.service_name,
            instance_id,
            self.cache_dir,
            self.reconnect_delay,
            self.heartbeat_interval,
            self.connect_timeout,
        )
    }
}

fn generate_instance_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    format!("instance-{suffix}")
}
