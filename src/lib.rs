//! fifostat - summary statistics for concurrent FIFO benchmark results
//!
//! This library turns headerless CSV benchmark results into comparable
//! statistics: per-configuration mean/standard deviation, complementary
//! cumulative distribution curves for rank-error and delay histograms, and a
//! weighted log-linear fit of performance against quality.

pub mod cli;
pub mod config;
pub mod distribution;
pub mod error;
pub mod ingest;
pub mod key;
pub mod report;
pub mod schema;
pub mod stats;

pub use error::{AnalysisError, Result};
