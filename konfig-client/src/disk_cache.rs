//! Per-service on-disk fallback for the last received document.
//!
//! One file per service, written atomically (temp file + rename) and
//! verified against the stored content hash on load. A corrupt or
//! undecodable file is deleted, never returned.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use prost::Message;
use tracing::debug;
use tracing::warn;

use konfig_core::hash::content_hash;
use konfig_proto::common::ConfigDocument;

pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    /// `None` resolves to `$HOME/.konfig/cache`, or `.konfig/cache` under
    /// the working directory when no home is discoverable.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.unwrap_or_else(default_cache_dir),
        }
    }

    /// `<cache_dir>/<sanitized_service>.cache`; path separators in the
    /// service name are flattened to underscores.
    pub fn path(
        &self,
        service_name: &str,
    ) -> PathBuf {
        let safe: String = service_name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.cache_dir.join(format!("{safe}.cache"))
    }

    pub fn exists(
        &self,
        service_name: &str,
    ) -> bool {
        self.path(service_name).is_file()
    }

    /// Atomic write: serialize, write `<path>.tmp`, rename over `<path>`.
    /// A failed rename unlinks the temp file.
    pub fn save(
        &self,
        doc: &ConfigDocument,
    ) -> io::Result<()> {
        ensure_dir(&self.cache_dir)?;

        let path = self.path(&doc.service_name);
        let tmp_path = path.with_extension("cache.tmp");

        fs::write(&tmp_path, doc.encode_to_vec())?;

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!(service = %doc.service_name, version = doc.version, path = %path.display(), "saved config");
        Ok(())
    }

    /// `None` for a missing file. A file that fails to decode or whose
    /// content no longer matches its stored hash is deleted and treated as
    /// missing.
    pub fn load(
        &self,
        service_name: &str,
    ) -> Option<ConfigDocument> {
        let path = self.path(service_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache read failed");
                return None;
            }
        };

        let doc = match ConfigDocument::decode(bytes.as_slice()) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache entry undecodable, discarding");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if !doc.content_hash.is_empty() && content_hash(&doc.content) != doc.content_hash {
            warn!(service = %service_name, "cache entry hash mismatch, discarding");
            let _ = fs::remove_file(&path);
            return None;
        }

        debug!(service = %service_name, version = doc.version, "loaded cached config");
        Some(doc)
    }
}

fn default_cache_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".konfig/cache"),
        _ => PathBuf::from(".konfig/cache"),
    }
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}
