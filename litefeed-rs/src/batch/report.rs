//! Batch run report

use crate::config::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

/// Final state of one (symbol, timeframe) pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairStatus {
    /// Fetched rows were merged into `path`
    Saved { rows: usize, path: PathBuf },
    /// Every attempt failed, or the store write did; `reason` is the last error
    Failed { reason: String },
}

/// Outcome of one pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    /// Fetch attempts made
    pub attempts: u32,
    pub status: PairStatus,
}

impl PairOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, PairStatus::Saved { .. })
    }
}

/// Batch report
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    outcomes: Vec<PairOutcome>,
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchReport {
    /// Start a new report with a fresh run id
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: PairOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcomes(&self) -> &[PairOutcome] {
        &self.outcomes
    }

    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }

    /// Outcome for a pair, if it was part of the run
    pub fn get(&self, symbol: Symbol, timeframe: Timeframe) -> Option<&PairOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.symbol == symbol && o.timeframe == timeframe)
    }

    /// Format report as string
    pub fn format(&self) -> String {
        let mut out = format!(
            r#"
Batch Results
=============
Run: {}
Pairs: {}
Saved: {}
Failed: {}
"#,
            self.run_id,
            self.outcomes.len(),
            self.saved(),
            self.failed(),
        );

        for outcome in self.outcomes.iter().filter(|o| !o.is_saved()) {
            if let PairStatus::Failed { reason } = &outcome.status {
                out.push_str(&format!(
                    "  {} {} after {} attempts: {}\n",
                    outcome.symbol, outcome.timeframe, outcome.attempts, reason
                ));
            }
        }

        out
    }
}
