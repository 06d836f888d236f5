//! Raw provider payload to canonical candle table

use crate::data::timestamp::MILLIS_THRESHOLD;
use crate::data::{Candle, CandleTable};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Parallel arrays as returned by the chart history endpoint.
///
/// Every key is optional and elements are kept as raw JSON so that junk
/// entries degrade to missing values instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOhlcPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<Value>,
}

impl RawOhlcPayload {
    /// Interpret a JSON value as a payload; anything but an object is empty
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// No recognised key at all
    pub fn is_empty(&self) -> bool {
        self.t.is_none()
            && self.o.is_none()
            && self.h.is_none()
            && self.l.is_none()
            && self.c.is_none()
            && self.v.is_none()
    }
}

fn elements(column: &Option<Value>) -> &[Value] {
    match column {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn coerce_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        _ => None,
    }
}

/// A single unit decision for the whole array: milliseconds if the largest
/// valid value is above the threshold
fn to_epoch_seconds(stamps: Vec<Option<i64>>) -> Vec<Option<i64>> {
    let max = stamps.iter().flatten().copied().max();
    match max {
        Some(max) if max > MILLIS_THRESHOLD => {
            stamps.into_iter().map(|s| s.map(|ms| ms / 1000)).collect()
        }
        _ => stamps,
    }
}

/// Coerce a value column and align it to `rows`, padding with missing values
fn numeric_column(column: &Option<Value>, rows: usize, name: &str) -> Vec<Option<f64>> {
    let items = elements(column);
    if items.len() != rows {
        warn!(
            "Column '{}' has {} values for {} timestamps, aligning to timestamps",
            name,
            items.len(),
            rows
        );
    }
    (0..rows)
        .map(|i| items.get(i).and_then(coerce_number))
        .collect()
}

fn local_wall_clock(seconds: i64, offset: &FixedOffset) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(offset).naive_local())
}

/// Build a time-ordered candle table from a raw payload.
///
/// Dates are shifted to `target_offset_minutes` east of UTC and then stored
/// without offset. Never fails: malformed entries become missing values.
pub fn normalize_ohlc(payload: &RawOhlcPayload, target_offset_minutes: i32) -> CandleTable {
    if payload.is_empty() {
        return CandleTable::new();
    }

    let offset = target_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            warn!("Invalid target offset {} minutes, using UTC", target_offset_minutes);
            Utc.fix()
        });

    let stamps = to_epoch_seconds(elements(&payload.t).iter().map(coerce_epoch).collect());
    let rows = stamps.len();

    let opens = numeric_column(&payload.o, rows, "o");
    let highs = numeric_column(&payload.h, rows, "h");
    let lows = numeric_column(&payload.l, rows, "l");
    let closes = numeric_column(&payload.c, rows, "c");
    let volumes = match payload.v {
        Some(_) => numeric_column(&payload.v, rows, "v"),
        None => vec![Some(0.0); rows],
    };

    let candles: Vec<Candle> = stamps
        .iter()
        .enumerate()
        .map(|(i, stamp)| Candle {
            date: stamp.and_then(|s| local_wall_clock(s, &offset)),
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
        })
        .collect();

    let mut table = CandleTable::from_vec(candles);
    table.sort_by_date();
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn payload(value: Value) -> RawOhlcPayload {
        RawOhlcPayload::from_json(&value)
    }

    fn wall(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 22)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_empty_payload() {
        assert!(normalize_ohlc(&RawOhlcPayload::default(), 210).is_empty());
        assert!(normalize_ohlc(&payload(json!({})), 210).is_empty());
        assert!(normalize_ohlc(&payload(json!(null)), 210).is_empty());
    }

    #[test]
    fn test_two_rows_without_volume() {
        let table = normalize_ohlc(
            &payload(json!({
                "t": [1690000000, 1690000300],
                "o": [100, 101],
                "h": [102, 103],
                "l": [99, 100],
                "c": [101, 102]
            })),
            210,
        );

        assert_eq!(table.len(), 2);
        assert!(table.candles().iter().all(Candle::is_complete));
        assert!(table.candles().iter().all(|c| c.volume == Some(0.0)));
        // 04:26:40 UTC shown at +03:30
        assert_eq!(table.get(0).unwrap().date, Some(wall(7, 56, 40)));
        assert_eq!(table.get(1).unwrap().date, Some(wall(8, 1, 40)));
    }

    #[test]
    fn test_millisecond_array_divided_once() {
        let table = normalize_ohlc(
            &payload(json!({
                "t": [1690000000000i64, null, 1690000300000i64],
                "o": [1, 2, 3], "h": [1, 2, 3], "l": [1, 2, 3], "c": [1, 2, 3],
                "v": [10, 20, 30]
            })),
            0,
        );

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).unwrap().date, Some(wall(4, 26, 40)));
        assert_eq!(table.get(1).unwrap().date, Some(wall(4, 31, 40)));
        // null timestamp sorts last and keeps its row
        assert_eq!(table.get(2).unwrap().date, None);
        assert_eq!(table.get(2).unwrap().volume, Some(20.0));
    }

    #[test]
    fn test_second_array_untouched() {
        let table = normalize_ohlc(
            &payload(json!({"t": [1690000000], "o": [1], "h": [1], "l": [1], "c": [1]})),
            0,
        );
        assert_eq!(table.get(0).unwrap().date, Some(wall(4, 26, 40)));
    }

    #[test]
    fn test_coercion_to_missing() {
        let table = normalize_ohlc(
            &payload(json!({
                "t": ["1690000000"],
                "o": ["1.5"],
                "h": ["oops"],
                "l": [null],
                "c": [{"x": 1}],
                "v": [true]
            })),
            0,
        );

        let candle = table.get(0).unwrap();
        assert_eq!(candle.date, Some(wall(4, 26, 40)));
        assert_eq!(candle.open, Some(1.5));
        assert_eq!(candle.high, None);
        assert_eq!(candle.low, None);
        assert_eq!(candle.close, None);
        assert_eq!(candle.volume, None);
    }

    #[test]
    fn test_sorted_ascending() {
        let table = normalize_ohlc(
            &payload(json!({
                "t": [1690000600, 1690000000, 1690000300],
                "o": [3, 1, 2], "h": [3, 1, 2], "l": [3, 1, 2], "c": [3, 1, 2]
            })),
            0,
        );

        let opens: Vec<_> = table.candles().iter().map(|c| c.open).collect();
        assert_eq!(opens, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_length_mismatch_aligns_to_timestamps() {
        let table = normalize_ohlc(
            &payload(json!({
                "t": [1690000000, 1690000300],
                "o": [1],
                "h": [1, 2, 3],
                "l": [1, 2],
                "c": [1, 2]
            })),
            0,
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().open, None);
        assert_eq!(table.get(1).unwrap().high, Some(2.0));
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let table = normalize_ohlc(
            &payload(json!({"t": [1690000000], "o": [1], "h": [1], "l": [1], "c": [1]})),
            100_000,
        );
        assert_eq!(table.get(0).unwrap().date, Some(wall(4, 26, 40)));
    }
}
