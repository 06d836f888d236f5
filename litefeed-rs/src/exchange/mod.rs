//! Exchange integration module
//!
//! Provides the LiteFinance history client and the source trait the batch
//! driver fetches through

pub mod client;
pub mod source;

pub use client::*;
pub use source::*;
