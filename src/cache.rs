// =============================================================================
// File Cache — TTL'd JSON blobs on disk
// =============================================================================
//
// Computed chart payloads are cached as JSON envelopes on the local
// filesystem:
//
//   { "created": <unix secs>, "expires": <unix secs>, "data": <payload> }
//
// Keys are hashed (SHA-256 hex) into filenames so arbitrary key strings are
// safe.  Reads treat every failure mode — missing file, unreadable file,
// unparsable JSON — as a miss; an expired entry is deleted on read.  Writes
// use the atomic tmp + rename pattern so a crash never leaves a torn file.
// =============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// On-disk envelope around one cached value.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    created: i64,
    expires: i64,
    data: serde_json::Value,
}

/// TTL'd key→JSON-blob store backed by a directory of `.cache` files.
pub struct FileCache {
    directory: PathBuf,
    enabled: bool,
    default_ttl_secs: u64,
}

impl FileCache {
    /// Create a cache rooted at `directory`.
    ///
    /// The directory is created when the cache is enabled; construction fails
    /// if it cannot be created.
    pub fn new(directory: impl Into<PathBuf>, enabled: bool, default_ttl_secs: u64) -> Result<Self> {
        let directory = directory.into();

        if enabled {
            std::fs::create_dir_all(&directory).with_context(|| {
                format!("failed to create cache directory {}", directory.display())
            })?;
        }

        Ok(Self {
            directory,
            enabled,
            default_ttl_secs,
        })
    }

    /// Look up `key`; returns `None` on miss, expiry, or any read failure.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if !self.enabled {
            return None;
        }

        let path = self.cache_path(key);
        let content = std::fs::read_to_string(&path).ok()?;
        let envelope: CacheEnvelope = serde_json::from_str(&content).ok()?;

        if now_secs() > envelope.expires {
            debug!(key, "cache entry expired");
            self.delete(key);
            return None;
        }

        debug!(key, "cache hit");
        Some(envelope.data)
    }

    /// Store `data` under `key` with `ttl` seconds to live (the configured
    /// default when `None`).
    ///
    /// A disabled cache is a no-op.
    pub fn set(&self, key: &str, data: &serde_json::Value, ttl: Option<u64>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let now = now_secs();
        let envelope = CacheEnvelope {
            created: now,
            expires: now + ttl.unwrap_or(self.default_ttl_secs) as i64,
            data: data.clone(),
        };

        let content =
            serde_json::to_string(&envelope).context("failed to serialise cache envelope")?;

        // Atomic write: tmp sibling, then rename.
        let path = self.cache_path(key);
        let tmp_path = path.with_extension("cache.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp cache file {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to rename tmp cache file to {}", path.display()))?;

        debug!(key, "cache entry written");
        Ok(())
    }

    /// Remove the entry for `key`, if present.
    pub fn delete(&self, key: &str) {
        let path = self.cache_path(key);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(key, error = %e, "failed to delete cache file");
            }
        }
    }

    /// Remove every `.cache` file in the directory.
    pub fn clear(&self) -> Result<()> {
        for path in self.cache_files()? {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Whether a live (non-expired) entry exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Delete every expired entry; returns how many files were removed.
    ///
    /// Unreadable or unparsable files are left in place — they already read
    /// as misses and may be mid-write by another process.
    pub fn clean_expired(&self) -> usize {
        let files = match self.cache_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "cache sweep failed to list directory");
                return 0;
            }
        };

        let now = now_secs();
        let mut cleaned = 0;

        for path in files {
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(envelope) = serde_json::from_str::<CacheEnvelope>(&content) else {
                continue;
            };

            if now > envelope.expires && std::fs::remove_file(&path).is_ok() {
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            debug!(cleaned, "expired cache entries removed");
        }
        cleaned
    }

    /// Canonical cache key for one market-data request.
    pub fn market_data_key(symbol: &str, interval: &str, limit: u32) -> String {
        format!("market_data_{symbol}_{interval}_{limit}")
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(key.as_bytes()));
        self.directory.join(format!("{hash}.cache"))
    }

    fn cache_files(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.directory).with_context(|| {
            format!("failed to read cache directory {}", self.directory.display())
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("cache") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
