//! Data management module
//!
//! Candle types, timestamp and payload normalization, and CSV persistence.

pub mod candle;
pub mod normalize;
pub mod storage;
pub mod timestamp;

pub use candle::*;
pub use normalize::*;
pub use storage::*;
pub use timestamp::*;
