// Inner join of a performance table and a quality table on (group, key)
//
// Orphaned keys are fatal: dropping them silently would bias the fit.

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::key::ParameterKey;
use crate::stats::aggregate::{Summary, SummaryTable};

/// Matched statistics for one configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedPoint {
    pub key: ParameterKey,
    pub performance: Summary,
    pub quality: Summary,
}

/// All matched configurations of one group, in key order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedGroup {
    pub label: String,
    pub points: Vec<JoinedPoint>,
}

/// Pair every (group, key) of `performance` with the same entry in `quality`
///
/// # Errors
/// `MissingKey` naming the first key present in one table but not the other.
pub fn join(performance: &SummaryTable, quality: &SummaryTable) -> Result<Vec<JoinedGroup>> {
    let mut joined = Vec::with_capacity(performance.groups().len());

    for group in performance.groups() {
        let mut points = Vec::with_capacity(group.rows.len());
        for row in &group.rows {
            let quality_summary = quality.get(&group.label, &row.key).ok_or_else(|| {
                AnalysisError::MissingKey {
                    group: group.label.clone(),
                    key: row.key.clone(),
                    missing_from: "quality",
                }
            })?;
            points.push(JoinedPoint {
                key: row.key.clone(),
                performance: row.summary,
                quality: *quality_summary,
            });
        }
        joined.push(JoinedGroup {
            label: group.label.clone(),
            points,
        });
    }

    for group in quality.groups() {
        for row in &group.rows {
            if performance.get(&group.label, &row.key).is_none() {
                return Err(AnalysisError::MissingKey {
                    group: group.label.clone(),
                    key: row.key.clone(),
                    missing_from: "performance",
                });
            }
        }
    }

    Ok(joined)
}
