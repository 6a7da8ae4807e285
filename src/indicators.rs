//! Moving averages and an RSI-style oscillator over a price series.
//!
//! All columns are aligned with the input series. A value exists only once its
//! window has enough history; before that it is `None`, never zero.

use crate::core::PriceSeries;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SHORT_WINDOW: usize = 9;
pub const LONG_WINDOW: usize = 21;
pub const RSI_WINDOW: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorEngine {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_window: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
            rsi_window: RSI_WINDOW,
        }
    }
}

/// One row of an [`IndicatorFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub timestamps: Vec<DateTime<Utc>>,
    pub prices: Vec<f64>,
    pub sma_short: Vec<Option<f64>>,
    pub sma_long: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        Some(IndicatorRow {
            timestamp: *self.timestamps.get(index)?,
            price: *self.prices.get(index)?,
            sma_short: self.sma_short.get(index).copied().flatten(),
            sma_long: self.sma_long.get(index).copied().flatten(),
            rsi: self.rsi.get(index).copied().flatten(),
        })
    }

    pub fn latest(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }
}

impl IndicatorEngine {
    pub fn compute(&self, series: &PriceSeries) -> IndicatorFrame {
        let prices = series.prices();
        IndicatorFrame {
            timestamps: series.points().iter().map(|p| p.timestamp).collect(),
            sma_short: rolling_mean(&prices, self.short_window),
            sma_long: rolling_mean(&prices, self.long_window),
            rsi: rsi(&prices, self.rsi_window),
            prices,
        }
    }
}

/// Trailing mean over `window` values; first defined at index `window - 1`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Oscillator on a 0-100 scale from simple trailing means of gains and losses.
///
/// The change at index `i` is `values[i] - values[i - 1]`, so the first value
/// needs `window` changes and lands at index `window`. Where the mean loss is
/// zero the gain/loss ratio is undefined and the entry stays `None`.
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() <= window {
        return result;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    for i in window..values.len() {
        // changes[j] is the move into values[j + 1]
        let recent = &changes[i - window..i];
        let avg_gain = recent.iter().map(|c| c.max(0.0)).sum::<f64>() / window as f64;
        let avg_loss = recent.iter().map(|c| (-c).max(0.0)).sum::<f64>() / window as f64;
        if avg_loss == 0.0 {
            continue;
        }
        let rs = avg_gain / avg_loss;
        result[i] = Some(100.0 - 100.0 / (1.0 + rs));
    }
    result
}
