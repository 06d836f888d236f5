//! Sequential fetch-and-store over the configured pair matrix

use crate::batch::{BatchReport, PairOutcome, PairStatus};
use crate::config::{IngestConfig, Symbol, Timeframe};
use crate::data::{CandleTable, CsvStore};
use crate::exchange::{CandleSource, FetchOutcome};
use tracing::{error, info, warn};

/// Batch driver
///
/// Pairs are processed one at a time, retries and the store merge included,
/// before the next pair starts.
pub struct BatchDriver<S> {
    config: IngestConfig,
    source: S,
    store: CsvStore,
}

impl<S: CandleSource> BatchDriver<S> {
    pub fn new(config: IngestConfig, source: S, store: CsvStore) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Run every configured pair; individual failures never stop the batch
    pub async fn run(&self) -> BatchReport {
        let mut report = BatchReport::new();
        let pairs = self.config.pairs();
        info!(run_id = %report.run_id, pairs = pairs.len(), "Starting batch");

        for (symbol, timeframe) in pairs {
            let outcome = self.run_pair(symbol, timeframe).await;
            report.push(outcome);
        }

        report.finish();
        info!(
            run_id = %report.run_id,
            saved = report.saved(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }

    /// Fetch one pair with retries and merge a non-empty result into the store
    pub async fn run_pair(&self, symbol: Symbol, timeframe: Timeframe) -> PairOutcome {
        info!("Fetching {} {} ...", symbol, timeframe);
        let max_attempts = self.config.attempts();
        let mut reason = String::new();

        for attempt in 1..=max_attempts {
            match self.source.fetch_candles(symbol, timeframe).await {
                Ok(FetchOutcome::Fetched(table)) if !table.is_empty() => {
                    return self.store_pair(symbol, timeframe, attempt, table);
                }
                Ok(FetchOutcome::Fetched(_)) => {
                    reason = "empty result".to_string();
                }
                Ok(FetchOutcome::Failed(e)) => {
                    reason = e.to_string();
                }
                Err(e) => {
                    warn!("Attempt {} failed for {} {}: {}", attempt, symbol, timeframe, e);
                    reason = e.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        warn!(
            "Failed to fetch {} {} after {} retries: {}",
            symbol, timeframe, max_attempts, reason
        );
        PairOutcome {
            symbol,
            timeframe,
            attempts: max_attempts,
            status: PairStatus::Failed { reason },
        }
    }

    fn store_pair(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        attempts: u32,
        table: CandleTable,
    ) -> PairOutcome {
        let status = match self.store.save(&table, symbol, timeframe) {
            Ok(path) => {
                info!("Saved {} {} ({} rows)", symbol, timeframe, table.len());
                PairStatus::Saved {
                    rows: table.len(),
                    path,
                }
            }
            Err(e) => {
                error!("Failed to store {} {}: {}", symbol, timeframe, e);
                PairStatus::Failed {
                    reason: format!("store: {}", e),
                }
            }
        };

        PairOutcome {
            symbol,
            timeframe,
            attempts,
            status,
        }
    }
}
