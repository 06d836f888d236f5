//! Candle source abstraction used by the batch driver

use crate::config::{Symbol, Timeframe};
use crate::error::IngestError;
use crate::exchange::FetchOutcome;
use std::future::Future;

/// Anything that can produce one fetch attempt for a (symbol, timeframe) pair
pub trait CandleSource {
    fn fetch_candles(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
    ) -> impl Future<Output = Result<FetchOutcome, IngestError>> + Send;
}
