//! Data storage and retrieval

use crate::config::{Symbol, Timeframe};
use crate::data::{Candle, CandleTable};
use crate::error::IngestError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column order of every persisted table
pub const COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const READ_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

impl From<&Candle> for CsvRow {
    fn from(candle: &Candle) -> Self {
        Self {
            date: candle
                .date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    READ_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

/// Append-merge CSV tables, one file per (symbol, timeframe)
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl Default for CsvStore {
    fn default() -> Self {
        Self::new("csv_data")
    }
}

impl CsvStore {
    /// Create new storage rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage location for a key: `{root}/csv_{symbol}_{timeframe}.csv`
    pub fn path_for(&self, symbol: Symbol, timeframe: Timeframe) -> PathBuf {
        self.root
            .join(format!("csv_{}_{}.csv", symbol.as_str(), timeframe.code()))
    }

    /// Load the stored table, if any
    pub fn load(&self, symbol: Symbol, timeframe: Timeframe) -> Result<Option<CandleTable>, IngestError> {
        let path = self.path_for(symbol, timeframe);
        if !path.exists() {
            return Ok(None);
        }
        read_table(&path).map(Some)
    }

    /// Save `table` under its key, merging into any existing table.
    ///
    /// Existing rows win over incoming rows with the same date, and repeated
    /// dates within `table` keep their first row. The written result is sorted
    /// ascending. Returns the file path.
    pub fn save(&self, table: &CandleTable, symbol: Symbol, timeframe: Timeframe) -> Result<PathBuf, IngestError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(symbol, timeframe);

        let existing = if path.exists() {
            read_table(&path)?
        } else {
            CandleTable::new()
        };
        debug!(
            "Merging {} new rows into {} existing rows",
            table.len(),
            existing.len()
        );
        let merged = CandleTable::merge(existing, table.clone());
        write_table(&path, &merged)?;

        info!("Updated: {}", path.display());
        Ok(path)
    }
}

fn read_table(path: &Path) -> Result<CandleTable, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut table = CandleTable::new();

    for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        let raw = row.date.trim();
        let date = if raw.is_empty() {
            None
        } else {
            Some(parse_date(raw).ok_or_else(|| {
                IngestError::Parse(format!(
                    "{}: bad Date {:?} on row {}",
                    path.display(),
                    raw,
                    line + 1
                ))
            })?)
        };

        table.push(Candle {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    Ok(table)
}

fn write_table(path: &Path, table: &CandleTable) -> Result<(), IngestError> {
    // header written by hand so empty tables still get one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(COLUMNS)?;
    for candle in table.candles() {
        writer.serialize(CsvRow::from(candle))?;
    }
    writer.flush()?;
    Ok(())
}
