// Complementary cumulative distribution curves from decoded histograms
//
// The fraction reported for a bucket is taken before that bucket's own count
// is consumed: (total - mass at smaller values) / total. The first point is
// therefore always 1.0 and the curve is non-increasing.

use serde::Serialize;

use crate::config::{CdfConfig, CdfMode};
use crate::stats::histogram::Histogram;

// Absorbs rounding in `1.0 - i * step` so exact fractions hit their breakpoint.
const GOAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CdfPoint {
    pub value: u64,
    pub fraction: f64,
}

/// Which points of the curve are emitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CdfPolicy {
    /// Every bucket
    Full,
    /// One point per breakpoint 1.0, 1.0 - step, ... down to `step`.
    /// Mass below the last breakpoint is not covered unless `emit_tail`.
    Thinned { step: f64, emit_tail: bool },
}

impl CdfPolicy {
    pub fn thinned(step: f64) -> Self {
        CdfPolicy::Thinned {
            step,
            emit_tail: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdfBuilder {
    policy: CdfPolicy,
    remap_zero: bool,
}

impl CdfBuilder {
    pub fn new(policy: CdfPolicy) -> Self {
        Self {
            policy,
            remap_zero: false,
        }
    }

    /// Report value 0 as 1 so curves can go on a log axis
    pub fn with_remap_zero(mut self, remap_zero: bool) -> Self {
        self.remap_zero = remap_zero;
        self
    }

    pub fn from_config(config: &CdfConfig) -> Self {
        let policy = match config.mode {
            CdfMode::Full => CdfPolicy::Full,
            CdfMode::Thinned => CdfPolicy::Thinned {
                step: config.step,
                emit_tail: config.emit_tail,
            },
        };
        Self::new(policy).with_remap_zero(config.remap_zero)
    }

    pub fn policy(&self) -> CdfPolicy {
        self.policy
    }

    /// Build the curve for one histogram
    ///
    /// # Example
    /// ```
    /// use fifostat::stats::{CdfBuilder, CdfPolicy, Histogram};
    ///
    /// let histogram = Histogram::decode("0;2|1;3|2;5|").unwrap();
    /// let points = CdfBuilder::new(CdfPolicy::Full).build(&histogram);
    /// let fractions: Vec<f64> = points.iter().map(|p| p.fraction).collect();
    /// assert_eq!(fractions, vec![1.0, 0.8, 0.5]);
    /// ```
    pub fn build(&self, histogram: &Histogram) -> Vec<CdfPoint> {
        let buckets = histogram.buckets();
        let total = histogram.total();
        let fraction = |consumed: u64| (total - consumed) as f64 / total as f64;

        let mut consumed: u64 = 0;
        let mut points = Vec::new();

        match self.policy {
            CdfPolicy::Full => {
                for bucket in buckets {
                    points.push(self.point(bucket.value, fraction(consumed)));
                    consumed += bucket.count;
                }
            }
            CdfPolicy::Thinned { step, emit_tail } => {
                let breakpoints = (1.0 / step + GOAL_TOLERANCE).floor() as usize;
                let goal = |i: usize| 1.0 - i as f64 * step;
                let mut next_goal = 0usize;
                let mut last_emitted = None;

                for (i, bucket) in buckets.iter().enumerate() {
                    if next_goal >= breakpoints {
                        break;
                    }
                    let current = fraction(consumed);
                    if current <= goal(next_goal) + GOAL_TOLERANCE {
                        points.push(self.point(bucket.value, current));
                        last_emitted = Some(i);
                        while next_goal < breakpoints && current <= goal(next_goal) + GOAL_TOLERANCE
                        {
                            next_goal += 1;
                        }
                    }
                    consumed += bucket.count;
                }

                if let Some(last) = buckets.last() {
                    if emit_tail && last_emitted != Some(buckets.len() - 1) {
                        points.push(self.point(last.value, last.count as f64 / total as f64));
                    }
                }
            }
        }

        points
    }

    fn point(&self, value: u64, fraction: f64) -> CdfPoint {
        let value = if self.remap_zero && value == 0 { 1 } else { value };
        CdfPoint { value, fraction }
    }
}
