//! CLI argument parsing for fifostat

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{AnalysisConfig, CdfMode, DedupPolicy};

/// Output format for reports printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fifostat")]
#[command(version)]
#[command(about = "Summary statistics, distributions and fits for FIFO benchmark results", long_about = None)]
pub struct Cli {
    /// TOML configuration file (CLI flags take precedence)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Field delimiter of the input files
    #[arg(short = 'd', long = "delimiter", value_name = "CHAR", global = true)]
    pub delimiter: Option<char>,

    /// Enable debug logging to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mean and standard deviation per group and parameter key
    Summarize {
        /// Results file: [param1,] [param2,] name, metric...
        file: PathBuf,

        /// Metric position among the fields after the key (name is 0)
        #[arg(long = "metric-column", value_name = "N")]
        metric_column: Option<usize>,
    },

    /// Rank-error and delay CDF files per benchmarked entity
    Distribution {
        /// Quality results file: name, threads, ..., histogram blobs
        file: PathBuf,

        /// Directory for <entity>_rank_error.txt / <entity>_delay.txt
        #[arg(short = 'o', long = "out-dir", value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Emit percentile breakpoints instead of every point
        #[arg(long = "thinned")]
        thinned: bool,

        /// Breakpoint distance for --thinned
        #[arg(long = "step", value_name = "FRACTION")]
        step: Option<f64>,

        /// Also emit the last value below the final breakpoint
        #[arg(long = "emit-tail")]
        emit_tail: bool,

        /// Report a value of 0 as 1
        #[arg(long = "remap-zero")]
        remap_zero: bool,

        /// Only use runs at the highest thread count in the file
        #[arg(long = "max-threads-only")]
        max_threads_only: bool,
    },

    /// Join performance and quality results and fit performance ~ ln(quality)
    Fit {
        /// Performance results file
        performance: PathBuf,

        /// Quality results file with the same keys
        quality: PathBuf,

        /// Metric position among the fields after the key (name is 0)
        #[arg(long = "metric-column", value_name = "N")]
        metric_column: Option<usize>,

        /// Weight of the lowest-quality point
        #[arg(long = "weight-offset", value_name = "W")]
        weight_offset: Option<u32>,
    },
}

impl Cli {
    /// Apply flags on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }

        match &self.command {
            Command::Summarize { metric_column, .. } => {
                if let Some(column) = metric_column {
                    config.sweep.metric_column = *column;
                }
            }
            Command::Distribution {
                thinned,
                step,
                emit_tail,
                remap_zero,
                max_threads_only,
                ..
            } => {
                if *thinned {
                    config.cdf.mode = CdfMode::Thinned;
                }
                if let Some(step) = step {
                    config.cdf.step = *step;
                }
                config.cdf.emit_tail |= *emit_tail;
                config.cdf.remap_zero |= *remap_zero;
                if *max_threads_only {
                    config.distribution.dedup = DedupPolicy::MaxThreads;
                }
            }
            Command::Fit {
                metric_column,
                weight_offset,
                ..
            } => {
                if let Some(column) = metric_column {
                    config.sweep.metric_column = *column;
                }
                if let Some(offset) = weight_offset {
                    config.fit.weight_offset = *offset;
                }
            }
        }
    }
}
