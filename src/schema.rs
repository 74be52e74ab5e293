//! Typed records for the two dataset layouts
//!
//! Column roles are resolved once per row here; nothing downstream indexes
//! raw fields.
//!
//! - Sweep: `[param1], [param2], name, metric...` (key arity inferred per row)
//! - Distribution: `name, threads, ..., rank_error_blob, ..., delay_blob`

use crate::config::{DistributionConfig, SweepConfig};
use crate::error::{AnalysisError, Result};
use crate::ingest::RawRow;
use crate::key::{infer_key, ParameterKey};

/// One sample from a parameter sweep or named-implementation dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    pub line: u64,
    pub key: ParameterKey,
    pub group: String,
    pub metric: f64,
}

/// One run from a quality-distribution dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRecord {
    pub line: u64,
    pub name: String,
    pub threads: u32,
    pub rank_error: String,
    pub delay: String,
}

/// Column layout of a dataset variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSchema {
    Sweep {
        /// Metric position among the data fields after the key
        metric_column: usize,
    },
    Distribution {
        name_column: usize,
        threads_column: usize,
        rank_error_column: usize,
        delay_column: usize,
    },
}

impl From<&SweepConfig> for RecordSchema {
    fn from(config: &SweepConfig) -> Self {
        RecordSchema::Sweep {
            metric_column: config.metric_column,
        }
    }
}

impl From<&DistributionConfig> for RecordSchema {
    fn from(config: &DistributionConfig) -> Self {
        RecordSchema::Distribution {
            name_column: config.name_column,
            threads_column: config.threads_column,
            rank_error_column: config.rank_error_column,
            delay_column: config.delay_column,
        }
    }
}

fn parse_f64(row: &RawRow, column: usize) -> Result<f64> {
    let field = row.field(column)?;
    let value = field.parse::<f64>().map_err(|e| {
        AnalysisError::parse(
            row.line,
            column,
            format!("expected a number, got '{}': {}", field, e),
        )
    })?;
    if !value.is_finite() {
        return Err(AnalysisError::parse(
            row.line,
            column,
            format!("expected a finite number, got '{}'", field),
        ));
    }
    Ok(value)
}

impl RecordSchema {
    /// Resolve a raw row against a sweep layout
    pub fn sweep_record(&self, row: &RawRow) -> Result<SweepRecord> {
        let RecordSchema::Sweep { metric_column } = *self else {
            return Err(AnalysisError::Config(
                "sweep record requested from a distribution schema".to_string(),
            ));
        };

        let (key, data_start) = infer_key(&row.fields, row.line)?;
        let group = row.field(data_start)?.to_string();
        let metric = parse_f64(row, data_start + metric_column)?;

        Ok(SweepRecord {
            line: row.line,
            key,
            group,
            metric,
        })
    }

    /// Resolve a raw row against a distribution layout
    pub fn distribution_record(&self, row: &RawRow) -> Result<DistributionRecord> {
        let RecordSchema::Distribution {
            name_column,
            threads_column,
            rank_error_column,
            delay_column,
        } = *self
        else {
            return Err(AnalysisError::Config(
                "distribution record requested from a sweep schema".to_string(),
            ));
        };

        let threads_field = row.field(threads_column)?;
        let threads = threads_field.parse::<u32>().map_err(|e| {
            AnalysisError::parse(
                row.line,
                threads_column,
                format!("invalid thread count '{}': {}", threads_field, e),
            )
        })?;

        Ok(DistributionRecord {
            line: row.line,
            name: row.field(name_column)?.to_string(),
            threads,
            rank_error: row.field(rank_error_column)?.to_string(),
            delay: row.field(delay_column)?.to_string(),
        })
    }

    /// Resolve every row of a sweep dataset; the first bad row aborts
    ///
    /// All rows must agree on key arity. The first row fixes it, so a later
    /// row cannot read column 1 as data where an earlier one read it as key.
    pub fn sweep_records(&self, rows: &[RawRow]) -> Result<Vec<SweepRecord>> {
        let mut records = Vec::with_capacity(rows.len());
        let mut dataset_arity: Option<(usize, u64)> = None;

        for row in rows {
            let record = self.sweep_record(row)?;
            let arity = record.key.arity();
            match dataset_arity {
                None => dataset_arity = Some((arity, row.line)),
                Some((expected, first_line)) if expected != arity => {
                    return Err(AnalysisError::parse(
                        row.line,
                        expected.min(arity),
                        format!(
                            "key has {} components, but line {} set the dataset key arity to {}",
                            arity, first_line, expected
                        ),
                    ));
                }
                Some(_) => {}
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Resolve every row of a distribution dataset; the first bad row aborts
    pub fn distribution_records(&self, rows: &[RawRow]) -> Result<Vec<DistributionRecord>> {
        rows.iter().map(|row| self.distribution_record(row)).collect()
    }
}
