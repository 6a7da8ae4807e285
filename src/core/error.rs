//! Error kinds for live fetches, sample data and series construction.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a live data source. Every variant triggers the sample fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport failure, timeout or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The call succeeded but yielded zero usable records.
    #[error("empty result: {0}")]
    Empty(String),
}

impl FetchError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Malformed(_) => "malformed",
            FetchError::Empty(_) => "empty",
        }
    }
}

/// Invalid input to [`PriceSeries::new`](crate::core::series::PriceSeries::new).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamp at index {index} is not after the previous one")]
    NotIncreasing { index: usize },

    #[error("invalid price {price} at index {index}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("timestamp {millis}ms is out of range")]
    InvalidTimestamp { millis: i64 },

    #[error("observations span {hours} hours, too many to resample")]
    SpanTooLarge { hours: i64 },
}

/// Sample data could not be prepared. There is no lower fallback tier, so this
/// is fatal at startup.
#[derive(Debug, Error)]
pub enum SampleDataError {
    #[error("sample data file not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("sample data file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("sample data I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sample data CSV error: {0}")]
    Csv(#[from] csv::Error),
}
