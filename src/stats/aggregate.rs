// Sample aggregation: group label -> parameter key -> raw samples
//
// Groups keep encounter order; keys within a group are kept in ParameterKey
// order (numeric, then lexicographic) so reports are deterministic.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::key::ParameterKey;
use crate::schema::SweepRecord;

/// Raw observations for one (group, key). Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    samples: Vec<f64>,
}

impl SampleSet {
    pub fn new(first: f64) -> Self {
        Self {
            samples: vec![first],
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Reduce to mean and Bessel-corrected standard deviation
    ///
    /// A single sample has spread 0 and is flagged as degenerate.
    ///
    /// # Example
    /// ```
    /// use fifostat::stats::SampleSet;
    ///
    /// let mut set = SampleSet::new(10.0);
    /// set.push(12.0);
    /// let summary = set.summary();
    /// assert_eq!(summary.mean, 11.0);
    /// assert!((summary.stdev - 2f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn summary(&self) -> Summary {
        let n = self.samples.len();
        let mean = self.samples.iter().sum::<f64>() / n as f64;

        let (stdev, degenerate) = if n < 2 {
            (0.0, true)
        } else {
            let squared: f64 = self.samples.iter().map(|x| (x - mean).powi(2)).sum();
            ((squared / (n - 1) as f64).sqrt(), false)
        };

        Summary {
            count: n,
            mean,
            stdev,
            degenerate,
        }
    }
}

/// Mean/spread of one SampleSet
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
    /// Only one sample was observed; `stdev` is defined as 0
    pub degenerate: bool,
}

#[derive(Debug, Clone)]
struct GroupSamples {
    label: String,
    samples: BTreeMap<ParameterKey, SampleSet>,
}

/// Two-level accumulator: group (encounter order) -> key (sorted) -> samples
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    groups: Vec<GroupSamples>,
    index: HashMap<String, usize>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate every sweep record under (group, key)
    pub fn from_records(records: &[SweepRecord]) -> Self {
        let mut table = Self::new();
        for record in records {
            table.record(&record.group, record.key.clone(), record.metric);
        }
        debug!(
            "Aggregated {} records into {} groups",
            records.len(),
            table.groups.len()
        );
        table
    }

    pub fn record(&mut self, group: &str, key: ParameterKey, value: f64) {
        let slot = match self.index.get(group) {
            Some(&slot) => slot,
            None => {
                self.groups.push(GroupSamples {
                    label: group.to_string(),
                    samples: BTreeMap::new(),
                });
                self.index.insert(group.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        self.groups[slot]
            .samples
            .entry(key)
            .and_modify(|set| set.push(value))
            .or_insert_with(|| SampleSet::new(value));
    }

    pub fn get(&self, group: &str, key: &ParameterKey) -> Option<&SampleSet> {
        let slot = *self.index.get(group)?;
        self.groups[slot].samples.get(key)
    }

    /// Group labels in encounter order
    pub fn group_labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reduce every SampleSet, consuming the raw samples
    pub fn reduce(self) -> SummaryTable {
        let groups = self
            .groups
            .into_iter()
            .map(|group| GroupSummary {
                label: group.label,
                rows: group
                    .samples
                    .into_iter()
                    .map(|(key, set)| KeySummary {
                        key,
                        summary: set.summary(),
                    })
                    .collect(),
            })
            .collect();

        SummaryTable { groups }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeySummary {
    pub key: ParameterKey,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: String,
    /// Sorted by key
    pub rows: Vec<KeySummary>,
}

impl GroupSummary {
    pub fn get(&self, key: &ParameterKey) -> Option<&Summary> {
        self.rows
            .binary_search_by(|row| row.key.cmp(key))
            .ok()
            .map(|i| &self.rows[i].summary)
    }
}

/// Reduced table, same ordering guarantees as [`SampleTable`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryTable {
    groups: Vec<GroupSummary>,
}

impl SummaryTable {
    pub fn groups(&self) -> &[GroupSummary] {
        &self.groups
    }

    pub fn group(&self, label: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn get(&self, group: &str, key: &ParameterKey) -> Option<&Summary> {
        self.group(group)?.get(key)
    }
}
