// Summary statistics for benchmark result datasets
//
// Pipeline, leaves first:
// - aggregate: (group, key) -> samples -> mean / Bessel-corrected stdev
// - histogram: packed "value;count|" fields -> sorted buckets
// - cdf: buckets -> complementary cumulative fractions (full or thinned)
// - join: performance table joined with quality table on (group, key)
// - fit: weighted least squares of performance on ln(quality)
//
// Every stage consumes an immutable input and returns a new structure.

mod aggregate;
mod cdf;
mod fit;
mod histogram;
mod join;

pub use aggregate::{GroupSummary, KeySummary, SampleSet, SampleTable, Summary, SummaryTable};
pub use cdf::{CdfBuilder, CdfPoint, CdfPolicy};
pub use fit::{FitOutcome, FitResult, GroupFit, LogLinearFitter, SkipReason};
pub use histogram::{BlobOrigin, Bucket, Histogram};
pub use join::{join, JoinedGroup, JoinedPoint};
