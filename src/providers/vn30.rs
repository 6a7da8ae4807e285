//! Best-effort VN30 price scraper.
//!
//! Reads every table row of an HTML page and treats the first cell as a ticker
//! and the second as its price. Rows whose price does not parse are dropped.
//! Layout changes on the target site silently reduce what is extracted
//! instead of failing, and an empty extraction is reported as
//! [`FetchError::Empty`] so the caller falls back to sample data.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::ScraperConfig;
use crate::core::{EquityFetcher, FetchError, PriceSnapshot};
use crate::providers::util::{get_text, http_client};

pub struct Vn30Scraper {
    timeout: Duration,
    user_agent: String,
}

impl Vn30Scraper {
    pub fn new(config: &ScraperConfig) -> Self {
        Vn30Scraper {
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Keeps only digits and `.`, so `,` thousands separators and currency
/// suffixes vanish. `,` is never read as a decimal mark.
pub fn normalize_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Extracts `ticker -> price` from all table rows with at least two cells.
pub fn parse_snapshot(html: &str) -> Result<PriceSnapshot, FetchError> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse("tr").map_err(|e| FetchError::Malformed(format!("Bad selector: {e}")))?;
    let cell_selector = Selector::parse("td, th")
        .map_err(|e| FetchError::Malformed(format!("Bad selector: {e}")))?;

    let mut snapshot = PriceSnapshot::new();
    let mut skipped = 0usize;
    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>())
            .collect();
        if cells.len() < 2 {
            continue;
        }
        match normalize_price(&cells[1]) {
            Some(price) => {
                snapshot.insert(cells[0].trim().to_string(), price);
            }
            None => skipped += 1,
        }
    }

    debug!(parsed = snapshot.len(), skipped, "Parsed VN30 table rows");
    Ok(snapshot)
}

#[async_trait]
impl EquityFetcher for Vn30Scraper {
    #[instrument(name = "Vn30Scrape", skip(self, page_url), fields(url = %page_url))]
    async fn fetch(&self, page_url: &str) -> Result<PriceSnapshot, FetchError> {
        let client = http_client(self.timeout, &self.user_agent)?;
        let html = get_text(&client, page_url).await?;

        let snapshot = parse_snapshot(&html)?;
        if snapshot.is_empty() {
            return Err(FetchError::Empty(format!(
                "No price rows parsed from {page_url}"
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_USER_AGENT;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VN30_PAGE: &str = r#"
        <html><body>
          <table>
            <tr><th>Ma CK</th><th>Gia</th></tr>
            <tr><td> VCB </td><td>45.2</td></tr>
            <tr><td>bad</td><td>xyz</td></tr>
            <tr><td>VNM</td><td>78,900</td></tr>
            <tr><td>lonely</td></tr>
          </table>
        </body></html>"#;

    fn scraper_with_timeout(timeout_secs: u64) -> Vn30Scraper {
        Vn30Scraper::new(&ScraperConfig {
            timeout_secs,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("1,234.5"), Some(1234.5));
        assert_eq!(normalize_price("78,900"), Some(78900.0));
        assert_eq!(normalize_price(" 45.2 VND"), Some(45.2));
        assert_eq!(normalize_price("abc"), None);
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("1.2.3"), None);
    }

    #[test]
    fn test_parse_snapshot_skips_unparsable_rows() {
        let snapshot = parse_snapshot(VN30_PAGE).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("VCB"), Some(&45.2));
        assert_eq!(snapshot.get("VNM"), Some(&78900.0));
        assert!(!snapshot.contains_key("bad"));
    }

    #[test]
    fn test_parse_snapshot_later_duplicates_win() {
        let html = "<table><tr><td>FPT</td><td>1</td></tr><tr><td>FPT</td><td>2</td></tr></table>";
        let snapshot = parse_snapshot(html).unwrap();
        assert_eq!(snapshot.get("FPT"), Some(&2.0));
    }

    #[test]
    fn test_parse_snapshot_without_tables() {
        let snapshot = parse_snapshot("<html><body><p>maintenance</p></body></html>").unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vn30"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(VN30_PAGE))
            .mount(&mock_server)
            .await;

        let scraper = scraper_with_timeout(5);
        let snapshot = scraper
            .fetch(&format!("{}/vn30", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(
            snapshot,
            PriceSnapshot::from([("VCB".to_string(), 45.2), ("VNM".to_string(), 78900.0)])
        );
    }

    #[tokio::test]
    async fn test_fetch_with_no_rows_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vn30"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let scraper = scraper_with_timeout(5);
        let result = scraper.fetch(&format!("{}/vn30", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Empty(_))));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vn30"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let scraper = scraper_with_timeout(5);
        let result = scraper.fetch(&format!("{}/vn30", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
