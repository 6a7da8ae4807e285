pub mod cli;
pub mod core;
pub mod indicators;
pub mod orchestrator;
pub mod providers;
pub mod sample;

use crate::core::config::{AppConfig, SampleConfig};
use crate::orchestrator::DataAcquisitionOrchestrator;
use crate::providers::caching::{CachingCryptoFetcher, CachingEquityFetcher};
use crate::providers::coingecko::CoinGeckoFetcher;
use crate::providers::vn30::Vn30Scraper;
use crate::sample::SampleDataStore;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Show,
    Watch { interval: Duration },
}

/// Wires the live fetchers (behind the time-boxed cache) and the sample store.
pub fn build_orchestrator(
    config: &AppConfig,
    samples: SampleDataStore,
) -> DataAcquisitionOrchestrator<'_> {
    let crypto_fetcher = CachingCryptoFetcher::new(
        CoinGeckoFetcher::new(&config.providers.coingecko),
        config.cache_ttl(),
    );
    let equity_fetcher =
        CachingEquityFetcher::new(Vn30Scraper::new(&config.scraper), config.cache_ttl());
    DataAcquisitionOrchestrator::new(
        config,
        Box::new(crypto_fetcher),
        Box::new(equity_fetcher),
        samples,
    )
}

/// Opens the configured sample directory, or the per-user default seeded with
/// the bundled crypto sample.
pub fn open_samples(config: &SampleConfig) -> Result<SampleDataStore> {
    let samples = match &config.dir {
        Some(dir) => SampleDataStore::open(dir, config.seed)?,
        None => {
            let dir = AppConfig::default_sample_dir()?;
            SampleDataStore::open_or_install(&dir, config.seed)?
        }
    };
    Ok(samples)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Finance dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let samples =
        open_samples(&config.sample).context("Sample data is unavailable, cannot start")?;
    let orchestrator = build_orchestrator(&config, samples);
    let vs_currency = &config.providers.coingecko.vs_currency;

    match command {
        AppCommand::Show => cli::dashboard::run(&orchestrator, vs_currency).await,
        AppCommand::Watch { interval } => {
            cli::dashboard::watch(&orchestrator, vs_currency, interval).await
        }
    }
}
