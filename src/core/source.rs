//! Provenance-tagged results handed to the presentation layer

use crate::core::series::{PriceSnapshot, SeriesMap};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Sample,
}

impl Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Provenance::Live => "live",
                Provenance::Sample => "sample",
            }
        )
    }
}

/// Data together with where it came from. The tag is set by whoever produced
/// the data and there is no way to change it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SourceResult<T> {
    Live(T),
    Sample(T),
}

impl<T> SourceResult<T> {
    pub fn provenance(&self) -> Provenance {
        match self {
            SourceResult::Live(_) => Provenance::Live,
            SourceResult::Sample(_) => Provenance::Sample,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance() == Provenance::Live
    }

    pub fn data(&self) -> &T {
        match self {
            SourceResult::Live(data) | SourceResult::Sample(data) => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            SourceResult::Live(data) | SourceResult::Sample(data) => data,
        }
    }
}

/// Equity data is a scraped snapshot when live and a daily history when it
/// comes from the bundled sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EquityData {
    Snapshot(PriceSnapshot),
    History(SeriesMap),
}

impl EquityData {
    pub fn len(&self) -> usize {
        match self {
            EquityData::Snapshot(snapshot) => snapshot.len(),
            EquityData::History(history) => history.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent price per instrument, whichever shape the data has.
    pub fn latest_prices(&self) -> PriceSnapshot {
        match self {
            EquityData::Snapshot(snapshot) => snapshot.clone(),
            EquityData::History(history) => history
                .iter()
                .filter_map(|(id, series)| series.last().map(|p| (id.clone(), p.price)))
                .collect(),
        }
    }
}
