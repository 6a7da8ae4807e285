use crate::core::cache::MemoryCache;
use crate::core::{CryptoFetcher, EquityFetcher, FetchError, PriceSnapshot, SeriesMap};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

// Only successful fetches are cached. A failure is retried on the next
// refresh instead of pinning the dashboard to sample data for a whole TTL.

pub struct CachingCryptoFetcher<T: CryptoFetcher> {
    inner: T,
    cache: MemoryCache<(BTreeSet<String>, u32), SeriesMap>,
}

impl<T: CryptoFetcher> CachingCryptoFetcher<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            cache: MemoryCache::new(ttl),
        }
    }
}

#[async_trait]
impl<T: CryptoFetcher> CryptoFetcher for CachingCryptoFetcher<T> {
    async fn fetch(
        &self,
        coin_ids: &BTreeSet<String>,
        window_days: u32,
    ) -> Result<SeriesMap, FetchError> {
        let key = (coin_ids.clone(), window_days);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Serving crypto prices from cache");
            return Ok(cached);
        }
        let result = self.inner.fetch(coin_ids, window_days).await?;
        self.cache.put(key, result.clone()).await;
        Ok(result)
    }
}

pub struct CachingEquityFetcher<T: EquityFetcher> {
    inner: T,
    cache: MemoryCache<String, PriceSnapshot>,
}

impl<T: EquityFetcher> CachingEquityFetcher<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            cache: MemoryCache::new(ttl),
        }
    }
}

#[async_trait]
impl<T: EquityFetcher> EquityFetcher for CachingEquityFetcher<T> {
    async fn fetch(&self, page_url: &str) -> Result<PriceSnapshot, FetchError> {
        if let Some(cached) = self.cache.get(&page_url.to_string()).await {
            debug!("Serving equity snapshot from cache: {}", page_url);
            return Ok(cached);
        }
        let result = self.inner.fetch(page_url).await?;
        self.cache.put(page_url.to_string(), result.clone()).await;
        Ok(result)
    }
}
