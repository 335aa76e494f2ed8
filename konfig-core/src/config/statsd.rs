use serde::Deserialize;
use serde::Serialize;

/// Metrics sink parameters.
///
/// Metrics are fire-and-forget UDP; an unreachable host disables the sink
/// rather than failing startup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StatsdConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Metric name prefix; each binary fills in its component name when the
    /// file leaves this empty.
    #[serde(default)]
    pub prefix: String,
}

impl Default for StatsdConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            prefix: String::new(),
        }
    }
}

fn default_host() -> String {
    "statsd-exporter".to_string()
}

fn default_port() -> u16 {
    9125
}
