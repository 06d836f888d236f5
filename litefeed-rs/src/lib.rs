//! Litefeed-RS: historical OHLC ingestion from the LiteFinance chart backend
//!
//! This crate fetches candle history for a fixed catalog of crypto and forex
//! symbols, normalizes it into a canonical table and merges it into one CSV
//! file per (symbol, timeframe).
//!
//! # Features
//!
//! - **Timestamp Normalization**: epoch seconds/milliseconds, calendar values and text to UTC seconds
//! - **Payload Normalization**: unit detection, timezone shift, numeric coercion
//! - **CSV Storage**: append-merge with date deduplication, existing rows win
//! - **Batch Driver**: sequential symbol x timeframe sweep with fixed retries
//!
//! # Example
//!
//! ```no_run
//! use litefeed_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let client = LiteFinanceClient::new(&config)?;
//!     let store = CsvStore::new(config.output_dir.clone());
//!     let report = BatchDriver::new(config, client, store).run().await;
//!     println!("{}", report.format());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod exchange;

// Re-export commonly used types
pub mod prelude {
    pub use crate::batch::*;
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::error::IngestError;
    pub use crate::exchange::*;
    pub use crate::Result;
}

pub use error::IngestError;

/// Result type alias
pub type Result<T> = std::result::Result<T, IngestError>;
