//! Conversion of heterogeneous timestamp inputs into UTC epoch seconds

use crate::error::IngestError;
use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde_json::Value;

/// Numeric epochs above this magnitude are milliseconds
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Timezone assumed for naive inputs unless the caller says otherwise
pub fn default_assume_tz() -> Tz {
    chrono_tz::Asia::Qatar
}

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// A timestamp value of any supported shape
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    Absent,
    Int(i64),
    Float(f64),
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
    Utc(DateTime<Utc>),
    Text(String),
}

impl TimestampInput {
    /// Map a JSON value; only null, numbers and strings are timestamps
    pub fn from_json(value: &Value) -> Result<Self, IngestError> {
        match value {
            Value::Null => Ok(Self::Absent),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(IngestError::UnsupportedType(format!("number {}", n)))
                }
            }
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Bool(_) => Err(IngestError::UnsupportedType("bool".to_string())),
            Value::Array(_) => Err(IngestError::UnsupportedType("array".to_string())),
            Value::Object(_) => Err(IngestError::UnsupportedType("object".to_string())),
        }
    }
}

impl From<i64> for TimestampInput {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for TimestampInput {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for TimestampInput {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for TimestampInput {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(v: NaiveDateTime) -> Self {
        Self::Naive(v)
    }
}

impl From<NaiveDate> for TimestampInput {
    fn from(v: NaiveDate) -> Self {
        Self::Naive(v.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<DateTime<FixedOffset>> for TimestampInput {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Zoned(v)
    }
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Utc(v)
    }
}

impl From<DateTime<Tz>> for TimestampInput {
    fn from(v: DateTime<Tz>) -> Self {
        Self::Zoned(v.fixed_offset())
    }
}

impl From<&str> for TimestampInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<TimestampInput>> From<Option<T>> for TimestampInput {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Absent)
    }
}

/// Convert `value` into UTC epoch seconds.
///
/// Naive calendar values are localized in `assume_tz` (UTC when `None`).
/// Returns `Ok(None)` for absent input.
pub fn to_unix_timestamp(
    value: impl Into<TimestampInput>,
    assume_tz: Option<Tz>,
) -> Result<Option<i64>, IngestError> {
    let tz = assume_tz.unwrap_or(chrono_tz::UTC);

    match value.into() {
        TimestampInput::Absent => Ok(None),
        TimestampInput::Int(v) => Ok(Some(epoch_seconds(v))),
        TimestampInput::Float(v) => {
            if v.is_nan() {
                return Ok(None);
            }
            if !v.is_finite() {
                return Err(IngestError::Parse(format!("non-finite timestamp {}", v)));
            }
            Ok(Some(epoch_seconds(v.trunc() as i64)))
        }
        TimestampInput::Naive(naive) => localize(&naive, tz).map(Some),
        TimestampInput::Zoned(dt) => Ok(Some(dt.timestamp())),
        TimestampInput::Utc(dt) => Ok(Some(dt.timestamp())),
        TimestampInput::Text(text) => parse_text(&text, tz),
    }
}

/// Seconds from a second-or-millisecond epoch
pub fn epoch_seconds(value: i64) -> i64 {
    if value.unsigned_abs() > MILLIS_THRESHOLD as u64 {
        value / 1000
    } else {
        value
    }
}

fn localize(naive: &NaiveDateTime, tz: Tz) -> Result<i64, IngestError> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp()),
        LocalResult::None => Err(IngestError::Parse(format!(
            "{} does not exist in {}",
            naive,
            tz.name()
        ))),
    }
}

fn parse_text(text: &str, tz: Tz) -> Result<Option<i64>, IngestError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    // bare epochs
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Some(epoch_seconds(v)));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(dt.timestamp()));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Ok(Some(dt.timestamp()));
        }
    }

    // explicit UTC suffixes on otherwise naive text
    for suffix in ["Z", " UTC", " GMT"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            if let Some(naive) = parse_naive(stripped.trim_end()) {
                return Ok(Some(naive.and_utc().timestamp()));
            }
        }
    }

    match parse_naive(text) {
        Some(naive) => localize(&naive, tz).map(Some),
        None => Err(IngestError::Parse(format!("unrecognized timestamp text: {:?}", text))),
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QATAR: Option<Tz> = Some(chrono_tz::Asia::Qatar);

    #[test]
    fn test_absent() {
        assert_eq!(to_unix_timestamp(TimestampInput::Absent, QATAR).unwrap(), None);
        assert_eq!(to_unix_timestamp(None::<i64>, QATAR).unwrap(), None);
        assert_eq!(to_unix_timestamp("   ", QATAR).unwrap(), None);
        assert_eq!(to_unix_timestamp(f64::NAN, QATAR).unwrap(), None);
    }

    #[test]
    fn test_numeric_units() {
        assert_eq!(to_unix_timestamp(1_690_000_000i64, QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp(1_690_000_000_000i64, QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp(1_690_000_000_999i64, QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp(1_690_000_000.9f64, QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp(-1_690_000_000_500i64, QATAR).unwrap(), Some(-1_690_000_000));
    }

    #[test]
    fn test_naive_uses_assumed_tz() {
        let naive = NaiveDate::from_ymd_opt(2023, 7, 22)
            .unwrap()
            .and_hms_opt(7, 26, 40)
            .unwrap();

        // Qatar is UTC+3 all year
        assert_eq!(to_unix_timestamp(naive, QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp(naive, None).unwrap(), Some(1_690_010_800));
    }

    #[test]
    fn test_zoned_ignores_assumed_tz() {
        let dt = DateTime::parse_from_rfc3339("2023-07-22T04:26:40+00:00").unwrap();
        assert_eq!(to_unix_timestamp(dt, QATAR).unwrap(), Some(1_690_000_000));

        let utc = Utc.timestamp_opt(1_690_000_000, 0).unwrap();
        assert_eq!(to_unix_timestamp(utc, QATAR).unwrap(), Some(1_690_000_000));
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(to_unix_timestamp("2023-07-22T04:26:40Z", QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp("2023-07-22 08:26:40+04:00", QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp("2023-07-22 07:26:40", QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp("2023-07-22 04:26:40 UTC", QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp("2023-07-22 07:26:40.750", QATAR).unwrap(), Some(1_690_000_000));
        assert_eq!(to_unix_timestamp("1690000000000", QATAR).unwrap(), Some(1_690_000_000));
        // midnight Qatar = 21:00 UTC the previous day
        assert_eq!(to_unix_timestamp("2023-07-22", QATAR).unwrap(), Some(1_689_973_200));
    }

    #[test]
    fn test_unparseable_text() {
        let err = to_unix_timestamp("next tuesday", QATAR).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn test_nonexistent_local_time() {
        // clocks jump from 02:00 to 03:00 in New York on this date
        let naive = NaiveDate::from_ymd_opt(2023, 3, 12)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let err = to_unix_timestamp(naive, Some(chrono_tz::America::New_York)).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(TimestampInput::from_json(&Value::Null).unwrap(), TimestampInput::Absent);
        assert_eq!(
            TimestampInput::from_json(&serde_json::json!(1690000000)).unwrap(),
            TimestampInput::Int(1_690_000_000)
        );
        assert!(matches!(
            TimestampInput::from_json(&serde_json::json!(true)),
            Err(IngestError::UnsupportedType(_))
        ));
        assert!(matches!(
            TimestampInput::from_json(&serde_json::json!([1, 2])),
            Err(IngestError::UnsupportedType(_))
        ));
    }
}
