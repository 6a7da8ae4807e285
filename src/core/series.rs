//! Price series and point-in-time snapshots

use crate::core::error::SeriesError;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const HOUR_MS: i64 = 60 * 60 * 1000;

// Ten years of hourly slots.
const MAX_RESAMPLE_HOURS: i64 = 24 * 366 * 10;

/// Instrument id to its latest scraped price.
pub type PriceSnapshot = BTreeMap<String, f64>;

/// Instrument id to its price history.
pub type SeriesMap = BTreeMap<String, PriceSeries>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ordered price history for one instrument.
///
/// Timestamps are strictly increasing and prices are finite and non-negative.
/// Both are checked on construction and the series cannot be mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price < 0.0 {
                return Err(SeriesError::InvalidPrice {
                    index,
                    price: point.price,
                });
            }
            if index > 0 && point.timestamp <= points[index - 1].timestamp {
                return Err(SeriesError::NotIncreasing { index });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Percentage change from the first to the last observation.
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.first()?.price;
        let last = self.last()?.price;
        if first > 0.0 {
            Some((last - first) / first * 100.0)
        } else {
            None
        }
    }
}

/// Aligns irregular `(timestamp_ms, price)` observations onto an hourly grid.
///
/// Observations are bucketed by the UTC hour they fall in and averaged. The grid
/// runs from the first to the last occupied hour and empty hours carry the
/// previous hour's value forward. Every raw price must be finite and
/// non-negative, before any averaging.
pub fn resample_hourly(raw: &[(i64, f64)]) -> Result<PriceSeries, SeriesError> {
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (index, &(ts_ms, price)) in raw.iter().enumerate() {
        if !price.is_finite() || price < 0.0 {
            return Err(SeriesError::InvalidPrice { index, price });
        }
        let entry = buckets.entry(ts_ms.div_euclid(HOUR_MS)).or_insert((0.0, 0));
        entry.0 += price;
        entry.1 += 1;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(PriceSeries::default());
    };
    if last - first > MAX_RESAMPLE_HOURS {
        return Err(SeriesError::SpanTooLarge {
            hours: last - first,
        });
    }

    let mut points = Vec::with_capacity((last - first + 1) as usize);
    let mut carried = 0.0;
    for hour in first..=last {
        if let Some((sum, count)) = buckets.get(&hour) {
            carried = sum / *count as f64;
        }
        let millis = hour * HOUR_MS;
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(SeriesError::InvalidTimestamp { millis })?;
        points.push(PricePoint {
            timestamp,
            price: carried,
        });
    }

    PriceSeries::new(points)
}
