//! LiteFinance chart history client

use crate::config::{IngestConfig, Symbol, Timeframe, DEFAULT_LOOKBACK_CANDLES};
use crate::data::{
    default_assume_tz, normalize_ohlc, to_unix_timestamp, CandleTable, RawOhlcPayload,
    TimestampInput,
};
use crate::error::IngestError;
use crate::exchange::CandleSource;
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const HISTORY_PATH: &str = "/chart/get-history";

/// Provider-side failure. Carried in [`FetchOutcome::Failed`], never returned as `Err`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Json(String),
}

/// Time window of a history request
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRange {
    /// `candles` intervals ending now
    Lookback { candles: u32 },
    /// Caller-supplied bounds; naive values are read in `assume_tz` (UTC when `None`)
    Explicit {
        from: TimestampInput,
        to: TimestampInput,
        assume_tz: Option<Tz>,
    },
}

impl Default for FetchRange {
    fn default() -> Self {
        Self::Lookback {
            candles: DEFAULT_LOOKBACK_CANDLES,
        }
    }
}

impl FetchRange {
    /// Explicit range with the default assumed timezone
    pub fn explicit(from: impl Into<TimestampInput>, to: impl Into<TimestampInput>) -> Self {
        Self::Explicit {
            from: from.into(),
            to: to.into(),
            assume_tz: Some(default_assume_tz()),
        }
    }

    /// Resolve to `(from, to)` UTC epoch seconds
    pub fn resolve(&self, timeframe: Timeframe, now: i64) -> Result<(i64, i64), IngestError> {
        match self {
            FetchRange::Lookback { candles } => {
                let span = timeframe.seconds() * i64::from(*candles);
                Ok((now - span, now))
            }
            FetchRange::Explicit { from, to, assume_tz } => {
                let from_ts = to_unix_timestamp(from.clone(), *assume_tz)?
                    .ok_or_else(|| IngestError::Range("from resolved to no timestamp".to_string()))?;
                let to_ts = to_unix_timestamp(to.clone(), *assume_tz)?
                    .ok_or_else(|| IngestError::Range("to resolved to no timestamp".to_string()))?;
                if from_ts > to_ts {
                    return Err(IngestError::Range(format!(
                        "from {} is after to {}",
                        from_ts, to_ts
                    )));
                }
                Ok((from_ts, to_ts))
            }
        }
    }
}

/// Result of one history request
#[derive(Debug)]
pub enum FetchOutcome {
    /// Provider answered; the table may be empty
    Fetched(CandleTable),
    Failed(ProviderError),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// Fetched table, or an empty one on failure
    pub fn into_table(self) -> CandleTable {
        match self {
            FetchOutcome::Fetched(table) => table,
            FetchOutcome::Failed(_) => CandleTable::new(),
        }
    }
}

/// HTTP client for the chart history endpoint
#[derive(Debug, Clone)]
pub struct LiteFinanceClient {
    base_url: String,
    client: reqwest::Client,
    target_offset_minutes: i32,
    assume_tz: Tz,
    range: FetchRange,
}

impl LiteFinanceClient {
    /// Create client from run configuration; batch fetches use lookback mode
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IngestError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            target_offset_minutes: config.target_offset_minutes,
            assume_tz: config.assume_tz()?,
            range: FetchRange::Lookback {
                candles: config.lookback_candles,
            },
        })
    }

    /// Replace the range used by [`CandleSource::fetch_candles`]
    pub fn with_range(mut self, range: FetchRange) -> Self {
        self.range = range;
        self
    }

    /// Explicit range read in the configured timezone
    pub fn explicit_range(
        &self,
        from: impl Into<TimestampInput>,
        to: impl Into<TimestampInput>,
    ) -> FetchRange {
        FetchRange::Explicit {
            from: from.into(),
            to: to.into(),
            assume_tz: Some(self.assume_tz),
        }
    }

    pub fn history_url(&self) -> String {
        format!("{}{}", self.base_url, HISTORY_PATH)
    }

    /// Issue one history request.
    ///
    /// Only caller misuse (an unresolvable `range`) is an `Err`; network, status
    /// and body problems come back as [`FetchOutcome::Failed`].
    pub async fn fetch(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        range: &FetchRange,
    ) -> Result<FetchOutcome, IngestError> {
        let (from, to) = range.resolve(timeframe, Utc::now().timestamp())?;
        let url = self.history_url();
        debug!(
            "GET {} symbol={} resolution={} from={} to={}",
            url,
            symbol.provider_code(),
            timeframe.code(),
            from,
            to
        );

        let request = self.client.get(&url).query(&[
            ("symbol", symbol.provider_code()),
            ("resolution", timeframe.code().to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Ok(failed(symbol, timeframe, ProviderError::Network(e.to_string()))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(failed(symbol, timeframe, ProviderError::Status(status.as_u16())));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_decode() => {
                return Ok(failed(symbol, timeframe, ProviderError::Json(e.to_string())))
            }
            Err(e) => return Ok(failed(symbol, timeframe, ProviderError::Network(e.to_string()))),
        };

        let payload = body
            .get("data")
            .map(RawOhlcPayload::from_json)
            .unwrap_or_default();
        let table = normalize_ohlc(&payload, self.target_offset_minutes);
        info!("Fetched {} candles for {} {}", table.len(), symbol, timeframe);

        Ok(FetchOutcome::Fetched(table))
    }

    /// Fetch and return the table directly, empty on provider failure
    pub async fn get_ohlc(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        range: &FetchRange,
    ) -> Result<CandleTable, IngestError> {
        Ok(self.fetch(symbol, timeframe, range).await?.into_table())
    }
}

impl CandleSource for LiteFinanceClient {
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
    ) -> Result<FetchOutcome, IngestError> {
        self.fetch(symbol, timeframe, &self.range).await
    }
}

fn failed(symbol: Symbol, timeframe: Timeframe, error: ProviderError) -> FetchOutcome {
    warn!("[LiteFinance] OHLC error for {} {}: {}", symbol, timeframe, error);
    FetchOutcome::Failed(error)
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(REFERER, HeaderValue::from_static("https://my.litefinance.org/"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}
