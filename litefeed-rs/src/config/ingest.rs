//! Ingestion run configuration

use crate::config::{Symbol, Timeframe};
use crate::error::IngestError;
use chrono_tz::Tz;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://my.litefinance.org";
pub const DEFAULT_ASSUME_TZ: &str = "Asia/Qatar";
/// +03:30
pub const DEFAULT_TARGET_OFFSET_MINUTES: i32 = 3 * 60 + 30;
pub const DEFAULT_LOOKBACK_CANDLES: u32 = 10_000;

/// Everything the batch driver needs to know about a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Provider origin, without trailing slash
    pub base_url: String,
    /// Directory holding the per-pair CSV tables
    pub output_dir: PathBuf,
    pub symbols: Vec<Symbol>,
    pub timeframes: Vec<Timeframe>,
    /// Fetch attempts per pair
    pub max_retries: u32,
    /// Pause between failed attempts
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    /// Candle intervals requested in lookback mode
    pub lookback_candles: u32,
    /// Timezone assumed for naive from/to values
    pub assume_tz: String,
    /// Offset of the wall clock written to disk
    pub target_offset_minutes: i32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("csv_data"),
            symbols: Symbol::all(),
            timeframes: Timeframe::ALL.to_vec(),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(15),
            lookback_candles: DEFAULT_LOOKBACK_CANDLES,
            assume_tz: DEFAULT_ASSUME_TZ.to_string(),
            target_offset_minutes: DEFAULT_TARGET_OFFSET_MINUTES,
        }
    }
}

impl IngestConfig {
    /// Load from the process environment (and `.env`, if present)
    pub fn from_env() -> Result<Self, IngestError> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("LITEFEED_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("LITEFEED_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(list) = lookup("LITEFEED_SYMBOLS") {
            config.symbols = parse_list(&list)?;
        }
        if let Some(list) = lookup("LITEFEED_TIMEFRAMES") {
            config.timeframes = parse_list(&list)?;
        }
        if let Some(v) = lookup("LITEFEED_MAX_RETRIES") {
            config.max_retries = parse_value("LITEFEED_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("LITEFEED_RETRY_DELAY_SECS") {
            config.retry_delay = Duration::from_secs(parse_value("LITEFEED_RETRY_DELAY_SECS", &v)?);
        }
        if let Some(v) = lookup("LITEFEED_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_value("LITEFEED_REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("LITEFEED_LOOKBACK_CANDLES") {
            config.lookback_candles = parse_value("LITEFEED_LOOKBACK_CANDLES", &v)?;
        }
        if let Some(tz) = lookup("LITEFEED_ASSUME_TZ") {
            config.assume_tz = tz.trim().to_string();
        }
        if let Some(v) = lookup("LITEFEED_TARGET_OFFSET_MINUTES") {
            config.target_offset_minutes = parse_value("LITEFEED_TARGET_OFFSET_MINUTES", &v)?;
        }

        // fail early on a bad tz name rather than on the first explicit-range fetch
        config.assume_tz()?;
        Ok(config)
    }

    /// Resolved assumed timezone
    pub fn assume_tz(&self) -> Result<Tz, IngestError> {
        parse_tz(&self.assume_tz)
    }

    /// Attempts per pair, never less than one
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Symbol x timeframe matrix, symbols outer
    pub fn pairs(&self) -> Vec<(Symbol, Timeframe)> {
        self.symbols
            .iter()
            .flat_map(|&symbol| self.timeframes.iter().map(move |&tf| (symbol, tf)))
            .collect()
    }
}

/// Parse an IANA timezone name
pub fn parse_tz(name: &str) -> Result<Tz, IngestError> {
    name.parse::<Tz>()
        .map_err(|_| IngestError::UnknownTimezone(name.to_string()))
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>, IngestError>
where
    T: FromStr<Err = IngestError>,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(T::from_str)
        .collect()
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, IngestError> {
    raw.trim()
        .parse()
        .map_err(|_| IngestError::Config(format!("{} has invalid value: {}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_reference_configuration() {
        let config = IngestConfig::default();
        assert_eq!(config.pairs().len(), 70);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.target_offset_minutes, 210);
        assert_eq!(config.assume_tz().unwrap(), chrono_tz::Asia::Qatar);
    }

    #[test]
    fn test_pairs_order() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            ("LITEFEED_SYMBOLS", "btcusd, eurusd"),
            ("LITEFEED_TIMEFRAMES", "D,5"),
        ]))
        .unwrap();

        assert_eq!(
            config.pairs(),
            vec![
                (Symbol::Btcusd, Timeframe::D1),
                (Symbol::Btcusd, Timeframe::M5),
                (Symbol::Eurusd, Timeframe::D1),
                (Symbol::Eurusd, Timeframe::M5),
            ]
        );
    }

    #[test]
    fn test_lookup_overrides() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            ("LITEFEED_BASE_URL", "http://127.0.0.1:8080/"),
            ("LITEFEED_MAX_RETRIES", "5"),
            ("LITEFEED_RETRY_DELAY_SECS", "0"),
            ("LITEFEED_ASSUME_TZ", "UTC"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.assume_tz().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_symbol = IngestConfig::from_lookup(lookup_from(&[("LITEFEED_SYMBOLS", "btcusd,dogeusd")]));
        assert!(matches!(bad_symbol, Err(IngestError::Config(_))));

        let bad_retries = IngestConfig::from_lookup(lookup_from(&[("LITEFEED_MAX_RETRIES", "many")]));
        assert!(matches!(bad_retries, Err(IngestError::Config(_))));

        let bad_tz = IngestConfig::from_lookup(lookup_from(&[("LITEFEED_ASSUME_TZ", "Mars/Base")]));
        assert!(matches!(bad_tz, Err(IngestError::UnknownTimezone(_))));
    }

    #[test]
    fn test_attempts_clamped() {
        let config = IngestConfig {
            max_retries: 0,
            ..IngestConfig::default()
        };
        assert_eq!(config.attempts(), 1);
    }
}
