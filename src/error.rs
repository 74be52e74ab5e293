//! Error taxonomy for benchmark result analysis
//!
//! Fatal conditions are variants of [`AnalysisError`]. Recoverable ones
//! (single-sample spread, under-determined fits) are modelled as values in
//! the `stats` module and never surface here.

use std::path::PathBuf;
use thiserror::Error;

use crate::key::ParameterKey;

/// Errors that abort an analysis run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: u64,
        column: usize,
        message: String,
    },

    /// Raised while negotiating the field-size limit; recovered by halving
    #[error("Field size limit {requested} rejected by platform")]
    FieldSizeExceeded { requested: u128 },

    #[error("Histogram for {context} has a total count of zero")]
    EmptyHistogramTotal { context: String },

    #[error("Key {key} of group '{group}' is missing from the {missing_from} dataset")]
    MissingKey {
        group: String,
        key: ParameterKey,
        missing_from: &'static str,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Build a parse error for a 1-based line and 0-based column
    pub fn parse(line: u64, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
