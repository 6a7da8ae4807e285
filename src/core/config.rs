use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, info};

pub const DEFAULT_VN30_URL: &str = "https://s.cafef.vn/thi-truong-chung-khoan/vn30.chn";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub timeout_secs: u64,
}

impl Default for CoinGeckoProviderConfig {
    fn default() -> Self {
        CoinGeckoProviderConfig {
            base_url: "https://api.coingecko.com".to_string(),
            vs_currency: "usd".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub coingecko: CoinGeckoProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SampleConfig {
    /// Sample directory override. When unset, samples live in the per-user
    /// data directory and the bundled crypto sample is installed there.
    pub dir: Option<PathBuf>,
    /// Seed for synthesizing missing equity samples; random when unset.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub crypto: Vec<String>,
    pub vn30_url: String,
    pub window_days: u32,
    pub providers: ProvidersConfig,
    pub scraper: ScraperConfig,
    pub sample: SampleConfig,
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            crypto: vec!["bitcoin".to_string(), "ethereum".to_string()],
            vn30_url: DEFAULT_VN30_URL.to_string(),
            window_days: 30,
            providers: ProvidersConfig::default(),
            scraper: ScraperConfig::default(),
            sample: SampleConfig::default(),
            cache_ttl_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("vn", "findash", "findash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_sample_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("vn", "findash", "findash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("samples"))
    }

    /// Reads the config at `path`, falling back to the built-in defaults when
    /// the file does not exist. A file that exists but cannot be read or
    /// parsed is an error.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Configured coin ids, deduplicated.
    pub fn coin_ids(&self) -> BTreeSet<String> {
        self.crypto.iter().cloned().collect()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
crypto:
  - bitcoin
  - solana
vn30_url: "http://example.com/vn30"
window_days: 7
providers:
  coingecko:
    base_url: "http://example.com/cg"
    timeout_secs: 3
scraper:
  timeout_secs: 5
sample:
  dir: "/tmp/samples"
  seed: 42
cache_ttl_secs: 0
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.crypto, vec!["bitcoin", "solana"]);
        assert_eq!(config.vn30_url, "http://example.com/vn30");
        assert_eq!(config.window_days, 7);
        assert_eq!(config.providers.coingecko.base_url, "http://example.com/cg");
        // Unspecified nested keys keep their defaults
        assert_eq!(config.providers.coingecko.vs_currency, "usd");
        assert_eq!(config.providers.coingecko.timeout_secs, 3);
        assert_eq!(config.scraper.timeout_secs, 5);
        assert_eq!(config.scraper.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.sample.dir, Some(PathBuf::from("/tmp/samples")));
        assert_eq!(config.sample.seed, Some(42));
        assert_eq!(config.cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_yaml::from_str("vn30_url: \"http://example.com/x\"").unwrap();
        assert_eq!(config.crypto, vec!["bitcoin", "ethereum"]);
        assert_eq!(config.window_days, 30);
        assert_eq!(config.providers.coingecko.timeout_secs, 10);
        assert!(config.sample.dir.is_none());
        assert!(config.sample.seed.is_none());
    }

    #[test]
    fn test_default_sample_dir_is_absolute() {
        // Independent of the working directory the binary is started from
        let dir = AppConfig::default_sample_dir().unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("samples"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "crypto: [unterminated").unwrap();
        let result = AppConfig::load_from_path(file.path());
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse config file")
        );
    }

    #[test]
    fn test_coin_ids_are_deduplicated() {
        let config = AppConfig {
            crypto: vec![
                "bitcoin".to_string(),
                "bitcoin".to_string(),
                "ethereum".to_string(),
            ],
            ..AppConfig::default()
        };
        assert_eq!(config.coin_ids().len(), 2);
    }
}
