// Weighted log-linear fit: performance ≈ slope · ln(quality) + intercept
//
// Points are ranked by ascending quality and weighted offset, offset+1, ...
// so configurations at high quality (sparsely sampled) count for more.
// Weights scale residuals, i.e. the minimised quantity is Σ (wᵢ·rᵢ)².

use serde::Serialize;
use tracing::debug;

use crate::config::FitConfig;
use crate::key::ParameterKey;
use crate::stats::join::JoinedGroup;

// Relative determinant below which the normal equations are treated as singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub slope: f64,
    pub intercept: f64,
    /// Weight of each point, in ascending-quality order
    pub weights: Vec<f64>,
}

impl FitResult {
    pub fn predict(&self, quality: f64) -> f64 {
        self.slope * quality.ln() + self.intercept
    }
}

/// Why a group was reported without a fit line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two distinct (quality, performance) pairs
    UnderDetermined { points: usize },
    /// Enough points, but too few with non-zero weight and distinct quality
    Singular,
    /// ln(quality) is undefined
    NonPositiveQuality { key: ParameterKey },
    /// A mean is NaN or infinite
    NonFinite { key: ParameterKey },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnderDetermined { points } => {
                write!(f, "under-determined ({} distinct points)", points)
            }
            SkipReason::Singular => write!(
                f,
                "singular weighted system (at weight offset 0 the lowest-quality \
                 point carries no weight; --weight-offset 1 weights every point)"
            ),
            SkipReason::NonPositiveQuality { key } => {
                write!(f, "non-positive quality at key {}", key)
            }
            SkipReason::NonFinite { key } => write!(f, "non-finite mean at key {}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    Fitted(FitResult),
    Skipped(SkipReason),
}

impl FitOutcome {
    pub fn fitted(&self) -> Option<&FitResult> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit),
            FitOutcome::Skipped(_) => None,
        }
    }
}

/// Fit outcome for one joined group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFit {
    pub label: String,
    pub outcome: FitOutcome,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogLinearFitter {
    weight_offset: u32,
}

impl LogLinearFitter {
    pub fn new(weight_offset: u32) -> Self {
        Self { weight_offset }
    }

    pub fn from_config(config: &FitConfig) -> Self {
        Self::new(config.weight_offset)
    }

    /// Fit (quality, performance) pairs
    ///
    /// # Example
    /// ```
    /// use fifostat::stats::{FitOutcome, LogLinearFitter};
    ///
    /// let points = [(1.0, 1.0), (2.0, 2.0), (4.0, 3.0), (8.0, 4.0)];
    /// let FitOutcome::Fitted(fit) = LogLinearFitter::default().fit(&points) else {
    ///     panic!("expected a fit");
    /// };
    /// assert!(fit.slope > 0.0);
    /// ```
    pub fn fit(&self, points: &[(f64, f64)]) -> FitOutcome {
        let keyed: Vec<(ParameterKey, f64, f64)> = points
            .iter()
            .map(|&(q, p)| (ParameterKey::Unkeyed, q, p))
            .collect();
        self.fit_keyed(&keyed)
    }

    /// Fit one joined group using the per-key means
    pub fn fit_group(&self, group: &JoinedGroup) -> GroupFit {
        let keyed: Vec<(ParameterKey, f64, f64)> = group
            .points
            .iter()
            .map(|p| (p.key.clone(), p.quality.mean, p.performance.mean))
            .collect();

        let outcome = self.fit_keyed(&keyed);
        if let FitOutcome::Skipped(reason) = &outcome {
            debug!("Skipping fit for group {}: {}", group.label, reason);
        }

        GroupFit {
            label: group.label.clone(),
            outcome,
        }
    }

    pub fn fit_groups(&self, groups: &[JoinedGroup]) -> Vec<GroupFit> {
        groups.iter().map(|g| self.fit_group(g)).collect()
    }

    fn fit_keyed(&self, points: &[(ParameterKey, f64, f64)]) -> FitOutcome {
        if let Some((key, _, _)) = points
            .iter()
            .find(|(_, q, p)| !q.is_finite() || !p.is_finite())
        {
            return FitOutcome::Skipped(SkipReason::NonFinite { key: key.clone() });
        }

        let distinct = count_distinct(points);
        if distinct < 2 {
            return FitOutcome::Skipped(SkipReason::UnderDetermined { points: distinct });
        }

        if let Some((key, _, _)) = points.iter().find(|(_, q, _)| *q <= 0.0) {
            return FitOutcome::Skipped(SkipReason::NonPositiveQuality { key: key.clone() });
        }

        let mut ranked: Vec<(f64, f64)> = points.iter().map(|&(_, q, p)| (q, p)).collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let weights: Vec<f64> = (0..ranked.len())
            .map(|rank| f64::from(self.weight_offset) + rank as f64)
            .collect();

        // Normal equations for y = a·x + b with per-point weight w², x = ln(q)
        let (mut s0, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&(q, y), w) in ranked.iter().zip(&weights) {
            let w2 = w * w;
            let x = q.ln();
            s0 += w2;
            sx += w2 * x;
            sy += w2 * y;
            sxx += w2 * x * x;
            sxy += w2 * x * y;
        }

        let det = s0 * sxx - sx * sx;
        if s0 == 0.0 || det.abs() <= SINGULAR_TOLERANCE * (s0 * sxx).abs().max(f64::MIN_POSITIVE) {
            return FitOutcome::Skipped(SkipReason::Singular);
        }

        FitOutcome::Fitted(FitResult {
            slope: (s0 * sxy - sx * sy) / det,
            intercept: (sxx * sy - sx * sxy) / det,
            weights,
        })
    }
}

fn count_distinct(points: &[(ParameterKey, f64, f64)]) -> usize {
    let mut pairs: Vec<(u64, u64)> = points
        .iter()
        .map(|&(_, q, p)| (q.to_bits(), p.to_bits()))
        .collect();
    pairs.sort_unstable();
    pairs.dedup();
    pairs.len()
}
