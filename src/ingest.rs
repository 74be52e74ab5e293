//! Whole-file ingestion of headerless delimited benchmark results
//!
//! Histogram payloads can be far longer than ordinary lines, so the accepted
//! field length is negotiated once, before any parsing, by halving a very
//! large ceiling until the platform accepts it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Maximum accepted length (in bytes) of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSizeLimit(usize);

impl FieldSizeLimit {
    /// Negotiate against the platform's largest allocation size
    ///
    /// # Example
    /// ```
    /// use fifostat::ingest::FieldSizeLimit;
    ///
    /// let limit = FieldSizeLimit::negotiate(u128::MAX).unwrap();
    /// assert!(limit.bytes() <= isize::MAX as usize);
    /// assert!(limit.bytes() > isize::MAX as usize / 2);
    /// ```
    pub fn negotiate(ceiling: u128) -> Result<Self> {
        Self::negotiate_with(ceiling, platform_accepts)
    }

    /// Halve `ceiling` until `accept` stops reporting `FieldSizeExceeded`
    pub fn negotiate_with<F>(ceiling: u128, accept: F) -> Result<Self>
    where
        F: Fn(u128) -> Result<usize>,
    {
        let mut requested = ceiling;
        loop {
            match accept(requested) {
                Ok(bytes) => {
                    debug!("Negotiated field size limit: {} bytes", bytes);
                    return Ok(Self(bytes));
                }
                Err(AnalysisError::FieldSizeExceeded { .. }) if requested > 1 => {
                    debug!("Field size limit {} rejected, halving", requested);
                    requested /= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn bytes(&self) -> usize {
        self.0
    }
}

fn platform_accepts(requested: u128) -> Result<usize> {
    usize::try_from(requested)
        .ok()
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .ok_or(AnalysisError::FieldSizeExceeded { requested })
}

/// One input record with its 1-based source line
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawRow {
    /// Field at `column`, or a parse error naming the row
    pub fn field(&self, column: usize) -> Result<&str> {
        self.fields.get(column).map(String::as_str).ok_or_else(|| {
            AnalysisError::parse(
                self.line,
                column,
                format!("row has {} fields, expected at least {}", self.fields.len(), column + 1),
            )
        })
    }
}

/// Reader for one delimited dataset
#[derive(Debug, Clone)]
pub struct DatasetReader {
    delimiter: u8,
    limit: FieldSizeLimit,
}

impl DatasetReader {
    pub fn new(delimiter: u8, limit: FieldSizeLimit) -> Self {
        Self { delimiter, limit }
    }

    /// Read every row of the file at `path`
    ///
    /// The file handle is scoped to this call.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRow>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
        let rows = self.read(BufReader::new(file))?;
        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Read every row from an arbitrary reader
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<RawRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());

            let mut fields = Vec::with_capacity(record.len());
            for (column, field) in record.iter().enumerate() {
                if field.len() > self.limit.bytes() {
                    return Err(AnalysisError::parse(
                        line,
                        column,
                        format!(
                            "field of {} bytes exceeds the {} byte limit",
                            field.len(),
                            self.limit.bytes()
                        ),
                    ));
                }
                fields.push(field.to_string());
            }
            rows.push(RawRow { line, fields });
        }

        Ok(rows)
    }
}
