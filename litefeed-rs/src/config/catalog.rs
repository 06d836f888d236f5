//! Instrument and timeframe catalogs

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Btcusd,
    Ethusd,
    Xrpusd,
    Usdx,
    Eurusd,
    Gbpusd,
    Usdchf,
    Audusd,
    Nzdusd,
    Usdcad,
}

impl Symbol {
    pub const CRYPTO: [Symbol; 3] = [Symbol::Btcusd, Symbol::Ethusd, Symbol::Xrpusd];

    pub const FOREX: [Symbol; 7] = [
        Symbol::Usdx,
        Symbol::Eurusd,
        Symbol::Gbpusd,
        Symbol::Usdchf,
        Symbol::Audusd,
        Symbol::Nzdusd,
        Symbol::Usdcad,
    ];

    /// Full catalog, crypto first
    pub fn all() -> Vec<Symbol> {
        Self::CRYPTO.iter().chain(Self::FOREX.iter()).copied().collect()
    }

    /// Lowercase ticker, used for storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Btcusd => "btcusd",
            Symbol::Ethusd => "ethusd",
            Symbol::Xrpusd => "xrpusd",
            Symbol::Usdx => "usdx",
            Symbol::Eurusd => "eurusd",
            Symbol::Gbpusd => "gbpusd",
            Symbol::Usdchf => "usdchf",
            Symbol::Audusd => "audusd",
            Symbol::Nzdusd => "nzdusd",
            Symbol::Usdcad => "usdcad",
        }
    }

    /// Uppercase ticker, as the provider expects it
    pub fn provider_code(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|sym| sym.as_str() == wanted)
            .ok_or_else(|| IngestError::Config(format!("Unsupported symbol: {}", s)))
    }
}

/// Candle resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1")]
    M1,
    #[serde(rename = "5")]
    M5,
    #[serde(rename = "15")]
    M15,
    #[serde(rename = "30")]
    M30,
    #[serde(rename = "60")]
    H1,
    #[serde(rename = "240")]
    H4,
    #[serde(rename = "D")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Resolution code sent to the provider and used in storage keys
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1",
            Timeframe::M5 => "5",
            Timeframe::M15 => "15",
            Timeframe::M30 => "30",
            Timeframe::H1 => "60",
            Timeframe::H4 => "240",
            Timeframe::D1 => "D",
        }
    }

    /// Duration of one candle in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1_800,
            Timeframe::H1 => 3_600,
            Timeframe::H4 => 14_400,
            Timeframe::D1 => 86_400,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timeframe {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.code() == wanted)
            .ok_or_else(|| IngestError::Config(format!("Unsupported timeframe: {}", s)))
    }
}
