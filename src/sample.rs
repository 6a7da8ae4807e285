//! Bundled sample data used whenever a live source fails.
//!
//! Samples are CSV files with a `date` column followed by one price column per
//! instrument. The crypto sample ships inside the binary and is installed into
//! the default sample directory on first use. The equity sample is synthesized
//! on first use and persisted, so later runs against the same directory reuse
//! the same values.

use crate::core::{PricePoint, PriceSeries, SampleDataError, SeriesMap};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CRYPTO_SAMPLE_FILE: &str = "sample_crypto.csv";
pub const EQUITY_SAMPLE_FILE: &str = "sample_vn30.csv";

/// Crypto sample compiled into the binary.
pub const BUNDLED_CRYPTO_SAMPLE: &str = include_str!("../data/sample_crypto.csv");

const SYNTH_DAYS: i64 = 30;
const SYNTH_TICKERS: [&str; 2] = ["VCB", "VNM"];
const SYNTH_PRICE_RANGE: Range<f64> = 20.0..120.0;

/// Sample data loaded once at startup.
#[derive(Debug, Clone)]
pub struct SampleDataStore {
    crypto: SeriesMap,
    equities: SeriesMap,
}

impl SampleDataStore {
    /// Loads both samples from `dir`, synthesizing the equity sample if it is
    /// missing. `seed` fixes the synthesized prices; `None` draws from entropy.
    ///
    /// A missing or unreadable crypto sample is an error: there is nothing
    /// further to fall back on.
    pub fn open(dir: &Path, seed: Option<u64>) -> Result<Self, SampleDataError> {
        let crypto_path = dir.join(CRYPTO_SAMPLE_FILE);
        if !crypto_path.exists() {
            return Err(SampleDataError::Missing { path: crypto_path });
        }
        let crypto = read_series_csv(&crypto_path)?;
        if crypto.is_empty() {
            return Err(corrupt(&crypto_path, "no instrument has any price"));
        }

        let equity_path = dir.join(EQUITY_SAMPLE_FILE);
        if !equity_path.exists() {
            synthesize_equities(&equity_path, Utc::now().date_naive(), seed)?;
        }
        let equities = read_series_csv(&equity_path)?;
        if equities.is_empty() {
            return Err(corrupt(&equity_path, "no instrument has any price"));
        }

        debug!(
            crypto = crypto.len(),
            equities = equities.len(),
            "Loaded sample data from {}",
            dir.display()
        );
        Ok(Self { crypto, equities })
    }

    /// Like [`open`](Self::open), but first installs the bundled crypto sample
    /// into `dir` when it has none.
    pub fn open_or_install(dir: &Path, seed: Option<u64>) -> Result<Self, SampleDataError> {
        let crypto_path = dir.join(CRYPTO_SAMPLE_FILE);
        if !crypto_path.exists() {
            std::fs::create_dir_all(dir)?;
            let tmp_path = temp_sibling(&crypto_path);
            std::fs::write(&tmp_path, BUNDLED_CRYPTO_SAMPLE)?;
            std::fs::rename(&tmp_path, &crypto_path)?;
            info!("Installed bundled crypto sample at {}", crypto_path.display());
        }
        Self::open(dir, seed)
    }

    pub fn load_crypto(&self) -> SeriesMap {
        self.crypto.clone()
    }

    pub fn load_equities(&self) -> SeriesMap {
        self.equities.clone()
    }
}

/// Writes a placeholder equity sample: one row per day for the
/// `SYNTH_DAYS` days ending at `end`, uniform random prices per ticker.
///
/// The rows go to a sibling temp file that is renamed over `path` once
/// complete, so an interrupted write never leaves a truncated sample behind.
pub fn synthesize_equities(
    path: &Path,
    end: NaiveDate,
    seed: Option<u64>,
) -> Result<(), SampleDataError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_sibling(path);
    let mut writer = csv::Writer::from_path(&tmp_path)?;

    let mut header = vec!["date"];
    header.extend(SYNTH_TICKERS);
    writer.write_record(&header)?;

    for offset in (0..SYNTH_DAYS).rev() {
        let date = end - Duration::days(offset);
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        for _ in SYNTH_TICKERS {
            let price: f64 = rng.gen_range(SYNTH_PRICE_RANGE);
            record.push(format!("{price:.2}"));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);
    std::fs::rename(&tmp_path, path)?;

    info!(
        seeded = seed.is_some(),
        "Synthesized equity sample at {}",
        path.display()
    );
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> SampleDataError {
    SampleDataError::Corrupt {
        path: PathBuf::from(path),
        reason: reason.into(),
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn read_series_csv(path: &Path) -> Result<SeriesMap, SampleDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("date") {
        return Err(corrupt(path, "first column must be `date`"));
    }
    let instruments: Vec<String> = headers.iter().skip(1).map(String::from).collect();
    let mut columns: Vec<Vec<PricePoint>> = vec![Vec::new(); instruments.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let date = record.get(0).unwrap_or_default();
        let timestamp = parse_date(date)
            .ok_or_else(|| corrupt(path, format!("row {}: invalid date `{date}`", row + 1)))?;

        for (col, points) in columns.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            // Blank cells mean no observation for that instrument
            if cell.is_empty() {
                continue;
            }
            let price = cell.parse::<f64>().map_err(|e| {
                corrupt(path, format!("row {}: invalid price `{cell}`: {e}", row + 1))
            })?;
            points.push(PricePoint { timestamp, price });
        }
    }

    let mut result = SeriesMap::new();
    for (instrument, points) in instruments.into_iter().zip(columns) {
        if points.is_empty() {
            continue;
        }
        let series =
            PriceSeries::new(points).map_err(|e| corrupt(path, format!("{instrument}: {e}")))?;
        result.insert(instrument, series);
    }
    Ok(result)
}
