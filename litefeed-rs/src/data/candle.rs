//! OHLCV candle data structures

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One normalized candle row.
///
/// `date` is a naive wall-clock value in the storage timezone; `None` marks a
/// row whose provider timestamp was missing. Price and volume fields use `None`
/// for values that could not be coerced to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: Option<NaiveDateTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Candle {
    /// Create a fully populated candle
    pub fn new(date: NaiveDateTime, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date: Some(date),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// True when no field carries the missing marker
    pub fn is_complete(&self) -> bool {
        self.date.is_some()
            && self.open.is_some()
            && self.high.is_some()
            && self.low.is_some()
            && self.close.is_some()
            && self.volume.is_some()
    }
}

/// Ascending by date, missing dates last
fn date_order(a: &Option<NaiveDateTime>, b: &Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ordered collection of candles for one (symbol, timeframe) key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleTable {
    candles: Vec<Candle>,
}

impl CandleTable {
    /// Create new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from vector of candles, order kept as given
    pub fn from_vec(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// Append a candle
    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    /// Get number of candles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Check if table is empty
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Get candle at index
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Get all candles
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Dates column
    pub fn dates(&self) -> Vec<Option<NaiveDateTime>> {
        self.candles.iter().map(|c| c.date).collect()
    }

    /// Stable sort ascending by date; rows without a date go last
    pub fn sort_by_date(&mut self) {
        self.candles.sort_by(|a, b| date_order(&a.date, &b.date));
    }

    /// Drop every row whose date was already seen; the first occurrence wins
    pub fn dedup_by_date(&mut self) {
        let mut seen = HashSet::new();
        self.candles.retain(|c| seen.insert(c.date));
    }

    /// Existing rows followed by incoming rows, deduplicated (existing wins) and sorted
    pub fn merge(existing: CandleTable, incoming: CandleTable) -> CandleTable {
        let mut merged = existing;
        merged.candles.extend(incoming.candles);
        merged.dedup_by_date();
        merged.sort_by_date();
        merged
    }
}

impl From<Vec<Candle>> for CandleTable {
    fn from(candles: Vec<Candle>) -> Self {
        Self::from_vec(candles)
    }
}
