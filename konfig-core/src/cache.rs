//! Opaque key/value cache in front of the store.
//!
//! The cache is never the source of truth: every failure here is treated by
//! callers as a miss and answered from the store.

use async_trait::async_trait;
use prost::Message;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;
use tracing::warn;

use crate::config::RedisConfig;
use crate::CacheError;
use konfig_proto::common::ConfigDocument;

/// Key for the newest version of a service's config.
pub fn latest_key(service_name: &str) -> String {
    format!("config:latest:{service_name}")
}

/// Key for one pinned version.
pub fn versioned_key(
    service_name: &str,
    version: i64,
) -> String {
    format!("config:{service_name}:v{version}")
}

/// Key selection used by the read-through fetch: non-positive versions mean
/// "latest".
pub fn document_key(
    service_name: &str,
    version: i64,
) -> String {
    if version <= 0 {
        latest_key(service_name)
    } else {
        versioned_key(service_name, version)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ConfigCache: Send + Sync {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), CacheError>;

    /// `None` is a miss; errors are reported but callers degrade them to
    /// misses as well.
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>, CacheError>;

    async fn delete(
        &self,
        key: &str,
    ) -> Result<bool, CacheError>;

    async fn exists(
        &self,
        key: &str,
    ) -> Result<bool, CacheError>;
}

/// Decodes a cached document, treating parse failures as misses.
pub async fn cached_document(
    cache: &dyn ConfigCache,
    service_name: &str,
    version: i64,
) -> Option<ConfigDocument> {
    let key = document_key(service_name, version);
    match cache.get(&key).await {
        Ok(Some(bytes)) => match ConfigDocument::decode(bytes.as_slice()) {
            Ok(doc) if doc.version > 0 => {
                debug!(%key, version = doc.version, "cache hit");
                Some(doc)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(%key, error = %e, "cached document undecodable, treating as miss");
                None
            }
        },
        Ok(None) => {
            debug!(%key, "cache miss");
            None
        }
        Err(e) => {
            warn!(%key, error = %e, "cache lookup failed, treating as miss");
            None
        }
    }
}

/// Best-effort write-through of a fetched document.
///
/// Only the versioned key is written. The latest pointer is never cached:
/// it would pin subscribers to the fetched version for the TTL, while a
/// latest-lookup that falls through to the store sees a new upload on the
/// very next fetch.
pub async fn cache_document(
    cache: &dyn ConfigCache,
    doc: &ConfigDocument,
    ttl_seconds: u64,
) {
    let key = versioned_key(&doc.service_name, doc.version);
    if let Err(e) = cache.set(&key, &doc.encode_to_vec(), ttl_seconds).await {
        warn!(%key, error = %e, "cache write failed");
    }
}

/// Stand-in used when the cache collaborator is down at startup; every
/// lookup is a miss and every write succeeds silently.
pub struct NoopCache;

#[async_trait]
impl ConfigCache for NoopCache {
    async fn set(
        &self,
        _key: &str,
        _value: &[u8],
        _ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(
        &self,
        _key: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn delete(
        &self,
        _key: &str,
    ) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn exists(
        &self,
        _key: &str,
    ) -> Result<bool, CacheError> {
        Ok(false)
    }
}

/// Redis-backed cache over a multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ConfigCache for RedisCache {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        if ttl_seconds > 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        } else {
            conn.set::<_, _, ()>(key, value).await?;
        }
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(
        &self,
        key: &str,
    ) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }
}

#[cfg(test)]
mod cache_test;
