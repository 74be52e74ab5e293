// Histogram decoding for packed "value;count|value;count|" fields
//
// Tokens are separated by '|', halves by ';'. The field ends with a '|',
// leaving one empty trailing token that is discarded.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AnalysisError, Result};

const TOKEN_SEPARATOR: char = '|';
const PAIR_SEPARATOR: char = ';';

/// Where a packed histogram came from, for error messages
#[derive(Debug, Clone, Copy)]
pub struct BlobOrigin<'a> {
    pub context: &'a str,
    pub line: u64,
    pub column: usize,
}

impl BlobOrigin<'static> {
    pub const UNKNOWN: BlobOrigin<'static> = BlobOrigin {
        context: "histogram",
        line: 0,
        column: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub value: u64,
    pub count: u64,
}

/// Decoded histogram: unique values in ascending order, positive total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    buckets: Vec<Bucket>,
    total: u64,
}

impl Histogram {
    /// Decode a packed histogram
    ///
    /// # Example
    /// ```
    /// use fifostat::stats::Histogram;
    ///
    /// let histogram = Histogram::decode("2;5|0;2|1;3|").unwrap();
    /// assert_eq!(histogram.total(), 10);
    /// assert_eq!(histogram.buckets()[0].value, 0);
    /// ```
    pub fn decode(blob: &str) -> Result<Self> {
        Self::decode_at(blob, BlobOrigin::UNKNOWN)
    }

    /// Decode a packed histogram, reporting failures against `origin`
    pub fn decode_at(blob: &str, origin: BlobOrigin<'_>) -> Result<Self> {
        let body = blob.trim();
        let body = body.strip_suffix(TOKEN_SEPARATOR).unwrap_or(body);

        let mut pairs = Vec::new();
        if !body.is_empty() {
            for (index, token) in body.split(TOKEN_SEPARATOR).enumerate() {
                pairs.push(parse_token(token, index, origin)?);
            }
        }

        Self::from_pairs(pairs, origin)
    }

    /// Build from (value, count) pairs in any order
    ///
    /// Repeated values are merged and zero counts carry no mass, so both are
    /// folded away before the total is checked.
    pub fn from_pairs<I>(pairs: I, origin: BlobOrigin<'_>) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut merged: BTreeMap<u64, u64> = BTreeMap::new();
        for (value, count) in pairs {
            if count == 0 {
                continue;
            }
            let slot = merged.entry(value).or_insert(0);
            *slot = slot.checked_add(count).ok_or_else(|| overflow(origin))?;
        }

        let total = merged
            .values()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
            .ok_or_else(|| overflow(origin))?;

        if total == 0 {
            return Err(AnalysisError::EmptyHistogramTotal {
                context: origin.context.to_string(),
            });
        }

        let buckets = merged
            .into_iter()
            .map(|(value, count)| Bucket { value, count })
            .collect();

        Ok(Self { buckets, total })
    }

    /// Buckets sorted ascending by value
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

fn overflow(origin: BlobOrigin<'_>) -> AnalysisError {
    AnalysisError::parse(
        origin.line,
        origin.column,
        format!("{}: histogram counts overflow", origin.context),
    )
}

fn parse_token(token: &str, index: usize, origin: BlobOrigin<'_>) -> Result<(u64, u64)> {
    let malformed = |why: String| {
        AnalysisError::parse(
            origin.line,
            origin.column,
            format!("{}: token {} '{}' {}", origin.context, index, token, why),
        )
    };

    let (value, count) = token
        .split_once(PAIR_SEPARATOR)
        .ok_or_else(|| malformed(format!("is not of the form value{}count", PAIR_SEPARATOR)))?;

    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|e| malformed(format!("has an invalid value: {}", e)))?;
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|e| malformed(format!("has an invalid count: {}", e)))?;

    Ok((value, count))
}
