//! Analysis configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid. CLI flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// How a decoded histogram is turned into CDF points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdfMode {
    /// Emit every (value, fraction) pair
    Full,
    /// Emit only at percentile breakpoints
    Thinned,
}

/// Which run is kept when several rows share an entity name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// First row per name wins
    FirstSeen,
    /// First row per name among rows at the dataset's maximum thread count
    MaxThreads,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CdfConfig {
    pub mode: CdfMode,

    /// Distance between thinning breakpoints (fraction of total mass)
    pub step: f64,

    /// Also emit the last histogram value once the final breakpoint is passed.
    /// Off by default: the tail below the last breakpoint is omitted.
    pub emit_tail: bool,

    /// Report a value of 0 as 1 (smallest positive bucket)
    pub remap_zero: bool,
}

impl Default for CdfConfig {
    fn default() -> Self {
        Self {
            mode: CdfMode::Full,
            step: 0.01,
            emit_tail: false,
            remap_zero: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub dedup: DedupPolicy,
    pub name_column: usize,
    pub threads_column: usize,
    pub rank_error_column: usize,
    pub delay_column: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::FirstSeen,
            name_column: 0,
            threads_column: 1,
            rank_error_column: 5,
            delay_column: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Metric position among the data fields after the key (0 is the group name)
    pub metric_column: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { metric_column: 1 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Weight of the lowest-quality point; later points get offset+1, offset+2, ...
    pub weight_offset: u32,
}

/// Top-level configuration for one analysis run
///
/// # Example
/// ```
/// use fifostat::config::{AnalysisConfig, CdfMode};
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.cdf.mode, CdfMode::Full);
/// assert_eq!(config.distribution.rank_error_column, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub delimiter: char,

    /// Starting point for field-size negotiation; `None` starts at `u128::MAX`
    pub field_size_ceiling: Option<u128>,

    pub cdf: CdfConfig,
    pub distribution: DistributionConfig,
    pub sweep: SweepConfig,
    pub fit: FitConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            field_size_ceiling: None,
            cdf: CdfConfig::default(),
            distribution: DistributionConfig::default(),
            sweep: SweepConfig::default(),
            fit: FitConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Compact reporting: percentile breakpoints, zero remapped, one run per
    /// entity at the highest thread count
    pub fn compact() -> Self {
        Self {
            cdf: CdfConfig {
                mode: CdfMode::Thinned,
                remap_zero: true,
                ..CdfConfig::default()
            },
            distribution: DistributionConfig {
                dedup: DedupPolicy::MaxThreads,
                ..DistributionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Exhaustive reporting: every CDF point, first run per entity
    pub fn exhaustive() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AnalysisError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                AnalysisError::Config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;

        if !(self.cdf.step > 0.0 && self.cdf.step <= 1.0) {
            return Err(AnalysisError::Config(format!(
                "cdf.step must be in (0, 1], got {}",
                self.cdf.step
            )));
        }

        if self.distribution.rank_error_column == self.distribution.delay_column {
            return Err(AnalysisError::Config(format!(
                "rank_error_column and delay_column must differ, both are {}",
                self.distribution.delay_column
            )));
        }

        if self.sweep.metric_column == 0 {
            return Err(AnalysisError::Config(
                "sweep.metric_column 0 is the group name, not a metric".to_string(),
            ));
        }

        if self.field_size_ceiling == Some(0) {
            return Err(AnalysisError::Config(
                "field_size_ceiling must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
