//! Caching layer for actor datasets to avoid repeated runs

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::api::{Dataset, DatasetSource};
use crate::error::Result;

/// Cache key for an actor run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Actor identifier
    pub actor_id: String,
    /// Actor input as a JSON string
    pub input: String,
}

impl CacheKey {
    pub fn new(actor_id: &str, input: &Value) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            input: input.to_string(),
        }
    }
}

/// [`DatasetSource`] decorator that reuses datasets for identical runs.
///
/// Only successful runs are cached; errors always reach the caller.
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<RwLock<TimedCache<CacheKey, Dataset>>>,
}

impl<S: DatasetSource> CachedSource<S> {
    /// Wrap `inner`, keeping datasets for `ttl`
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get the number of cached datasets
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clear all cached datasets
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }
}

#[async_trait]
impl<S: DatasetSource> DatasetSource for CachedSource<S> {
    async fn run_actor(&self, actor_id: &str, input: Value) -> Result<Dataset> {
        let key = CacheKey::new(actor_id, &input);

        {
            let mut cache = self.cache.write().await;
            if let Some(dataset) = cache.cache_get(&key) {
                debug!(actor = %actor_id, dataset = %dataset.id, "Cache hit");
                return Ok(dataset.clone());
            }
        }

        debug!(actor = %actor_id, "Cache miss");
        let dataset = self.inner.run_actor(actor_id, input).await?;

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, dataset.clone());
        Ok(dataset)
    }
}
