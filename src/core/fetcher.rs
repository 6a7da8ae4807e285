//! Live data source abstractions

use crate::core::error::FetchError;
use crate::core::series::{PriceSnapshot, SeriesMap};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Price history for a batch of coins. A failure for any coin fails the batch.
#[async_trait]
pub trait CryptoFetcher: Send + Sync {
    async fn fetch(
        &self,
        coin_ids: &BTreeSet<String>,
        window_days: u32,
    ) -> Result<SeriesMap, FetchError>;
}

/// Point-in-time prices scraped from a page. Zero parsed rows is an error.
#[async_trait]
pub trait EquityFetcher: Send + Sync {
    async fn fetch(&self, page_url: &str) -> Result<PriceSnapshot, FetchError>;
}
