//! Rank-error and delay distributions per benchmarked entity
//!
//! A distribution dataset may hold several runs of the same entity (e.g. one
//! per thread count). Only one run per name is turned into CDF curves; later
//! duplicates are ignored, never merged. The set of names already handled is
//! passed in explicitly so callers can share it across files.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::{DedupPolicy, DistributionConfig};
use crate::error::Result;
use crate::schema::DistributionRecord;
use crate::stats::{BlobOrigin, CdfBuilder, CdfPoint, Histogram};

/// Chooses which run of each entity is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSelector {
    policy: DedupPolicy,
}

impl RunSelector {
    pub fn new(policy: DedupPolicy) -> Self {
        Self { policy }
    }

    /// Select at most one run per entity name, in input order
    ///
    /// Names already in `done` are skipped; selected names are added to it.
    pub fn select<'a>(
        &self,
        records: &'a [DistributionRecord],
        done: &mut HashSet<String>,
    ) -> Vec<&'a DistributionRecord> {
        let required_threads = match self.policy {
            DedupPolicy::FirstSeen => None,
            DedupPolicy::MaxThreads => records.iter().map(|r| r.threads).max(),
        };

        let mut selected = Vec::new();
        for record in records {
            if required_threads.is_some_and(|threads| record.threads != threads) {
                continue;
            }
            if done.contains(&record.name) {
                debug!(
                    "Ignoring duplicate run of {} at line {}",
                    record.name, record.line
                );
                continue;
            }
            done.insert(record.name.clone());
            selected.push(record);
        }

        selected
    }
}

/// CDF curves for one selected run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDistribution {
    pub name: String,
    pub threads: u32,
    pub rank_error: Vec<CdfPoint>,
    pub delay: Vec<CdfPoint>,
}

/// Which histogram of a run a curve belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RankError,
    Delay,
}

impl Metric {
    /// Suffix used in report file names
    pub fn suffix(&self) -> &'static str {
        match self {
            Metric::RankError => "rank_error",
            Metric::Delay => "delay",
        }
    }
}

/// Decodes histograms of selected runs and builds their curves
#[derive(Debug, Clone)]
pub struct DistributionExtractor {
    rank_error_column: usize,
    delay_column: usize,
    selector: RunSelector,
    builder: CdfBuilder,
}

impl DistributionExtractor {
    pub fn new(columns: &DistributionConfig, builder: CdfBuilder) -> Self {
        Self {
            rank_error_column: columns.rank_error_column,
            delay_column: columns.delay_column,
            selector: RunSelector::new(columns.dedup),
            builder,
        }
    }

    /// Build curves for every selected run
    ///
    /// # Errors
    /// Parse errors for malformed histograms and `EmptyHistogramTotal` for a
    /// histogram with no mass, both naming the entity.
    pub fn extract(
        &self,
        records: &[DistributionRecord],
        done: &mut HashSet<String>,
    ) -> Result<Vec<EntityDistribution>> {
        let selected = self.selector.select(records, done);
        info!(
            "Selected {} of {} runs for distribution extraction",
            selected.len(),
            records.len()
        );

        selected
            .into_iter()
            .map(|record| {
                Ok(EntityDistribution {
                    name: record.name.clone(),
                    threads: record.threads,
                    rank_error: self.curve(record, Metric::RankError)?,
                    delay: self.curve(record, Metric::Delay)?,
                })
            })
            .collect()
    }

    fn curve(&self, record: &DistributionRecord, metric: Metric) -> Result<Vec<CdfPoint>> {
        let (blob, column) = match metric {
            Metric::RankError => (&record.rank_error, self.rank_error_column),
            Metric::Delay => (&record.delay, self.delay_column),
        };

        let context = format!("{} {}", record.name, metric.suffix());
        let histogram = Histogram::decode_at(
            blob,
            BlobOrigin {
                context: &context,
                line: record.line,
                column,
            },
        )?;
        Ok(self.builder.build(&histogram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::stats::CdfPolicy;

    fn record(line: u64, name: &str, threads: u32, rank_error: &str) -> DistributionRecord {
        DistributionRecord {
            line,
            name: name.to_string(),
            threads,
            rank_error: rank_error.to_string(),
            delay: "0;1|4;1|".to_string(),
        }
    }

    fn extractor(policy: DedupPolicy) -> DistributionExtractor {
        let columns = DistributionConfig {
            dedup: policy,
            ..DistributionConfig::default()
        };
        DistributionExtractor::new(&columns, CdfBuilder::new(CdfPolicy::Full))
    }

    #[test]
    fn test_first_seen_keeps_first_run() {
        let records = vec![
            record(1, "lcrq", 4, "0;1|"),
            record(2, "lcrq", 8, "5;1|"),
            record(3, "multififo", 8, "1;1|"),
        ];
        let mut done = HashSet::new();
        let selected = RunSelector::new(DedupPolicy::FirstSeen).select(&records, &mut done);
        let lines: Vec<u64> = selected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 3]);
        assert!(done.contains("lcrq"));
        assert!(done.contains("multififo"));
    }

    #[test]
    fn test_max_threads_restricts_runs() {
        let records = vec![
            record(1, "lcrq", 4, "0;1|"),
            record(2, "lcrq", 8, "5;1|"),
            record(3, "multififo", 4, "1;1|"),
            record(4, "lcrq", 8, "9;1|"),
        ];
        let mut done = HashSet::new();
        let selected = RunSelector::new(DedupPolicy::MaxThreads).select(&records, &mut done);
        let lines: Vec<u64> = selected.iter().map(|r| r.line).collect();
        // multififo never ran at 8 threads, second lcrq@8 is a duplicate
        assert_eq!(lines, vec![2]);
    }

    #[test]
    fn test_done_set_is_respected() {
        let records = vec![record(1, "lcrq", 4, "0;1|")];
        let mut done = HashSet::from(["lcrq".to_string()]);
        let selected = RunSelector::new(DedupPolicy::FirstSeen).select(&records, &mut done);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_extract_builds_both_curves() {
        let records = vec![record(1, "lcrq", 4, "0;2|1;3|2;5|")];
        let mut done = HashSet::new();
        let distributions = extractor(DedupPolicy::FirstSeen)
            .extract(&records, &mut done)
            .unwrap();

        assert_eq!(distributions.len(), 1);
        let d = &distributions[0];
        assert_eq!(d.name, "lcrq");
        assert_eq!(d.rank_error.len(), 3);
        assert_eq!(d.rank_error[1].fraction, 0.8);
        assert_eq!(d.delay.len(), 2);
        assert_eq!(d.delay[1].fraction, 0.5);
    }

    #[test]
    fn test_extract_empty_histogram_names_entity() {
        let records = vec![record(1, "lcrq", 4, "")];
        let mut done = HashSet::new();
        let err = extractor(DedupPolicy::FirstSeen)
            .extract(&records, &mut done)
            .unwrap_err();
        match err {
            AnalysisError::EmptyHistogramTotal { context } => {
                assert_eq!(context, "lcrq rank_error");
            }
            other => panic!("expected empty total, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_malformed_histogram_names_column() {
        let records = vec![record(7, "lcrq", 4, "x;1|")];
        let mut done = HashSet::new();
        let err = extractor(DedupPolicy::FirstSeen)
            .extract(&records, &mut done)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Parse {
                line: 7,
                column: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_metric_suffixes() {
        assert_eq!(Metric::RankError.suffix(), "rank_error");
        assert_eq!(Metric::Delay.suffix(), "delay");
    }
}
