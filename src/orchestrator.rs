//! Live-first data acquisition with sample fallback.

use crate::core::config::AppConfig;
use crate::core::{CryptoFetcher, EquityData, EquityFetcher, SeriesMap, SourceResult};
use crate::sample::SampleDataStore;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Everything one render cycle needs.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub crypto: SourceResult<SeriesMap>,
    pub equities: SourceResult<EquityData>,
    pub fetched_at: DateTime<Utc>,
}

pub struct DataAcquisitionOrchestrator<'a> {
    config: &'a AppConfig,
    crypto_fetcher: Box<dyn CryptoFetcher>,
    equity_fetcher: Box<dyn EquityFetcher>,
    samples: SampleDataStore,
}

impl<'a> DataAcquisitionOrchestrator<'a> {
    pub fn new(
        config: &'a AppConfig,
        crypto_fetcher: Box<dyn CryptoFetcher>,
        equity_fetcher: Box<dyn EquityFetcher>,
        samples: SampleDataStore,
    ) -> Self {
        Self {
            config,
            crypto_fetcher,
            equity_fetcher,
            samples,
        }
    }

    /// Live crypto history, or the crypto sample if the live fetch fails in any way.
    pub async fn acquire_crypto(&self) -> SourceResult<SeriesMap> {
        let coin_ids = self.config.coin_ids();
        match self
            .crypto_fetcher
            .fetch(&coin_ids, self.config.window_days)
            .await
        {
            Ok(data) => {
                info!(coins = data.len(), "Using live crypto prices");
                SourceResult::Live(data)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Live crypto fetch failed, using sample data");
                SourceResult::Sample(self.samples.load_crypto())
            }
        }
    }

    /// Live VN30 snapshot, or the equity sample history if scraping fails.
    pub async fn acquire_equities(&self) -> SourceResult<EquityData> {
        match self.equity_fetcher.fetch(&self.config.vn30_url).await {
            Ok(snapshot) => {
                info!(tickers = snapshot.len(), "Using live VN30 prices");
                SourceResult::Live(EquityData::Snapshot(snapshot))
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "VN30 scrape failed, using sample data");
                SourceResult::Sample(EquityData::History(self.samples.load_equities()))
            }
        }
    }

    /// Crypto first, then equities. The second fetch starts only after the
    /// first has finished.
    pub async fn acquire_all(&self) -> Snapshot {
        let crypto = self.acquire_crypto().await;
        let equities = self.acquire_equities().await;
        Snapshot {
            crypto,
            equities,
            fetched_at: Utc::now(),
        }
    }
}
