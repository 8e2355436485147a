/*!
 * Response caching keyed by prompt content.
 *
 * This module wraps a provider so that a prompt already answered once is
 * served from disk instead of asking the model again. The key is the
 * SHA-256 digest of the exact prompt text; each reply lives in its own file.
 */

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::providers::Provider;

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Provider wrapper serving repeated prompts from an on-disk cache
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    directory: PathBuf,
    stats: Arc<RwLock<CacheStats>>,
}

impl<P: Provider> CachedProvider<P> {
    /// Wrap `inner`, storing replies under `directory`
    pub fn new(inner: P, directory: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            directory: directory.into(),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    /// Cache key for a prompt
    pub fn cache_key(prompt: &str) -> String {
        format!("{:x}", Sha256::digest(prompt.as_bytes()))
    }

    /// File holding the cached reply for a prompt
    pub fn entry_path(&self, prompt: &str) -> PathBuf {
        self.directory.join(format!("{}.txt", Self::cache_key(prompt)))
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

#[async_trait]
impl<P: Provider> Provider for CachedProvider<P> {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let path = self.entry_path(prompt);

        match tokio::fs::read_to_string(&path).await {
            Ok(reply) => {
                self.stats.write().hits += 1;
                debug!("Cache hit: {:?}", path);
                return Ok(reply);
            }
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!("Ignoring unreadable cache entry {:?}: {}", path, e);
            }
            Err(_) => {}
        }

        self.stats.write().misses += 1;
        debug!("Cache miss: {:?}", path);

        let reply = self.inner.generate(prompt).await?;

        // A reply that cannot be cached is still a valid reply
        if let Err(e) = FileManager::write_atomic(&path, reply.as_bytes()) {
            warn!("Failed to write cache entry {:?}: {}", path, e);
        }

        Ok(reply)
    }

    async fn invalidate(&self, prompt: &str) {
        let path = self.entry_path(prompt);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Cache entry removed: {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove cache entry {:?}: {}", path, e),
        }
        self.inner.invalidate(prompt).await;
    }
}
