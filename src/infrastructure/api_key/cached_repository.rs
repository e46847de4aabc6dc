use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// Credential store wrapper that caches prefix lookups with a TTL
///
/// Writes go straight through and evict the affected prefix, so a revoked or
/// suspended key stops authenticating on the very next lookup.
///
/// Every invalidation bumps `epoch`. A lookup that read the store under an
/// older epoch does not leave its copy in the cache, so a read racing a
/// revocation cannot restore the pre-revocation key.
#[derive(Debug)]
pub struct CachedApiKeyRepository<R: ApiKeyRepository> {
    inner: R,
    cache: Cache<String, Arc<ApiKey>>,
    epoch: AtomicU64,
}

impl<R: ApiKeyRepository> CachedApiKeyRepository<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 10_000)
    }

    pub fn with_capacity(inner: R, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self {
            inner,
            cache,
            epoch: AtomicU64::new(0),
        }
    }

    pub async fn invalidate(&self, prefix: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(prefix).await;
    }

    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<R: ApiKeyRepository> ApiKeyRepository for CachedApiKeyRepository<R> {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.inner.get(id).await
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        if let Some(cached) = self.cache.get(prefix).await {
            tracing::debug!(key_prefix = %prefix, "Credential cache hit");
            return Ok(Some((*cached).clone()));
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let found = self.inner.get_by_prefix(prefix).await?;

        // Misses are not cached: a key issued a moment later must work immediately
        if let Some(ref key) = found {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!(key_prefix = %prefix, "Credential changed during lookup, not caching");
                return Ok(found);
            }

            self.cache
                .insert(prefix.to_string(), Arc::new(key.clone()))
                .await;

            // An invalidation that landed between the check and the insert
            if self.epoch.load(Ordering::SeqCst) != epoch {
                self.cache.invalidate(prefix).await;
            }
        }

        Ok(found)
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let created = self.inner.create(api_key).await?;
        self.invalidate(created.key_prefix()).await;
        Ok(created)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let updated = self.inner.update(api_key).await?;
        self.invalidate(updated.key_prefix()).await;
        Ok(updated)
    }
}
