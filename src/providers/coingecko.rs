use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::CoinGeckoProviderConfig;
use crate::core::series::resample_hourly;
use crate::core::{CryptoFetcher, FetchError, PriceSeries, SeriesMap};
use crate::providers::util::{CLIENT_USER_AGENT, get_text, http_client};

// CoinGeckoFetcher implementation for CryptoFetcher
pub struct CoinGeckoFetcher {
    base_url: String,
    vs_currency: String,
    timeout: Duration,
}

impl CoinGeckoFetcher {
    pub fn new(config: &CoinGeckoProviderConfig) -> Self {
        CoinGeckoFetcher {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Builds `{base}/api/v3/coins/{id}/market_chart` with the coin id as an
    /// encoded path segment and an encoded query string.
    fn market_chart_url(&self, coin_id: &str, window_days: u32) -> Result<Url, FetchError> {
        let invalid =
            || FetchError::Network(format!("Invalid CoinGecko base URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["api", "v3", "coins", coin_id, "market_chart"]);
        url.query_pairs_mut()
            .append_pair("vs_currency", &self.vs_currency)
            .append_pair("days", &window_days.to_string());
        Ok(url)
    }

    #[instrument(
        name = "CoinGeckoFetch",
        skip(self, client),
        fields(coin = %coin_id)
    )]
    async fn fetch_coin(
        &self,
        client: &reqwest::Client,
        coin_id: &str,
        window_days: u32,
    ) -> Result<PriceSeries, FetchError> {
        let url = self.market_chart_url(coin_id, window_days)?;
        let text = get_text(client, url.as_str()).await?;

        let data: MarketChartResponse = serde_json::from_str(&text).map_err(|e| {
            FetchError::Malformed(format!("Failed to parse market chart for {coin_id}: {e}"))
        })?;

        if data.prices.is_empty() {
            return Err(FetchError::Empty(format!(
                "No price data found for coin: {coin_id}"
            )));
        }

        let raw: Vec<(i64, f64)> = data
            .prices
            .iter()
            .map(|&(ts_ms, price)| (ts_ms as i64, price))
            .collect();
        let series = resample_hourly(&raw)
            .map_err(|e| FetchError::Malformed(format!("Invalid price data for {coin_id}: {e}")))?;

        debug!(
            raw_points = raw.len(),
            hourly_points = series.len(),
            "Resampled market chart"
        );
        Ok(series)
    }
}

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    // [timestamp_ms, price] pairs
    prices: Vec<(f64, f64)>,
}

#[async_trait]
impl CryptoFetcher for CoinGeckoFetcher {
    async fn fetch(
        &self,
        coin_ids: &BTreeSet<String>,
        window_days: u32,
    ) -> Result<SeriesMap, FetchError> {
        if coin_ids.is_empty() {
            return Err(FetchError::Empty("No coin ids configured".to_string()));
        }

        let client = http_client(self.timeout, CLIENT_USER_AGENT)?;
        let mut result = SeriesMap::new();
        for coin_id in coin_ids {
            let series = self.fetch_coin(&client, coin_id, window_days).await?;
            result.insert(coin_id.clone(), series);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOUR_MS: i64 = 3_600_000;
    const BASE_MS: i64 = 1_760_000_400_000; // aligned to an hour

    async fn mount_chart(server: &MockServer, coin: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v3/coins/{coin}/market_chart")))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn fetcher_for(server: &MockServer, timeout_secs: u64) -> CoinGeckoFetcher {
        CoinGeckoFetcher::new(&CoinGeckoProviderConfig {
            base_url: server.uri(),
            vs_currency: "usd".to_string(),
            timeout_secs,
        })
    }

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_successful_fetch_resamples_hourly() {
        let mock_server = MockServer::start().await;
        let body = format!(
            r#"{{"prices": [[{}, 100.0], [{}, 102.0], [{}, 110.0]],
                "market_caps": [], "total_volumes": []}}"#,
            BASE_MS + 1_000,
            BASE_MS + 2_000,
            BASE_MS + 2 * HOUR_MS + 500,
        );
        mount_chart(&mock_server, "bitcoin", 200, &body).await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await.unwrap();

        let series = result.get("bitcoin").expect("bitcoin series");
        assert_eq!(series.prices(), vec![101.0, 101.0, 110.0]);
        assert_eq!(series.first().unwrap().timestamp.timestamp_millis(), BASE_MS);
    }

    #[tokio::test]
    async fn test_days_parameter_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/bitcoin/market_chart"))
            .and(query_param("days", "7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"prices": [[{BASE_MS}, 1.0]]}}"#)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, 5);
        assert!(fetcher.fetch(&ids(&["bitcoin"]), 7).await.is_ok());
    }

    #[tokio::test]
    async fn test_coin_id_and_currency_are_encoded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/bit%20coin%2Fx/market_chart"))
            .and(query_param("vs_currency", "usd&days=1"))
            .and(query_param("days", "30"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"prices": [[{BASE_MS}, 1.0]]}}"#)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = CoinGeckoFetcher::new(&CoinGeckoProviderConfig {
            base_url: mock_server.uri(),
            vs_currency: "usd&days=1".to_string(),
            timeout_secs: 5,
        });
        let result = fetcher.fetch(&ids(&["bit coin/x"]), 30).await.unwrap();
        assert_eq!(result["bit coin/x"].prices(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_missing_prices_is_malformed() {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, "bitcoin", 200, r#"{"error": "coin not found"}"#).await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_empty_prices_is_empty() {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, "bitcoin", 200, r#"{"prices": []}"#).await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await;
        assert_eq!(
            result,
            Err(FetchError::Empty(
                "No price data found for coin: bitcoin".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_one_failing_coin_fails_batch() {
        let mock_server = MockServer::start().await;
        mount_chart(
            &mock_server,
            "bitcoin",
            200,
            &format!(r#"{{"prices": [[{BASE_MS}, 1.0]]}}"#),
        )
        .await;
        mount_chart(&mock_server, "ethereum", 429, "rate limited").await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin", "ethereum"]), 30).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_negative_price_is_malformed() {
        let mock_server = MockServer::start().await;
        mount_chart(
            &mock_server,
            "bitcoin",
            200,
            &format!(r#"{{"prices": [[{BASE_MS}, -5.0]]}}"#),
        )
        .await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_negative_price_averaged_with_valid_one_is_malformed() {
        let mock_server = MockServer::start().await;
        mount_chart(
            &mock_server,
            "bitcoin",
            200,
            &format!(
                r#"{{"prices": [[{BASE_MS}, -5.0], [{}, 20.0]]}}"#,
                BASE_MS + 1_000
            ),
        )
        .await;

        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_no_coins_is_empty() {
        let mock_server = MockServer::start().await;
        let fetcher = fetcher_for(&mock_server, 5);
        let result = fetcher.fetch(&BTreeSet::new(), 30).await;
        assert!(matches!(result, Err(FetchError::Empty(_))));
    }

    #[tokio::test]
    async fn test_slow_api_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/bitcoin/market_chart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"prices": [[{BASE_MS}, 1.0]]}}"#))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, 1);
        let result = fetcher.fetch(&ids(&["bitcoin"]), 30).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
