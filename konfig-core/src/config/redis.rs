use serde::Deserialize;
use serde::Serialize;

/// Read-through cache connection parameters.
///
/// The cache is never the source of truth, so there is nothing to
/// validate: a bad host simply degrades every lookup to a miss.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub db: i64,

    /// TTL in seconds applied to cached documents.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

fn default_host() -> String {
    "redis".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_cache_ttl() -> u64 {
    300
}
