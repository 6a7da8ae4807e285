//! Core data model, configuration and source abstractions

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod log;
pub mod series;
pub mod source;

// Re-export main types for cleaner imports
pub use error::{FetchError, SampleDataError, SeriesError};
pub use fetcher::{CryptoFetcher, EquityFetcher};
pub use series::{PricePoint, PriceSeries, PriceSnapshot, SeriesMap};
pub use source::{EquityData, Provenance, SourceResult};
