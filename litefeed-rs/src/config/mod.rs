//! Configuration module

pub mod catalog;
pub mod ingest;

pub use catalog::*;
pub use ingest::*;
