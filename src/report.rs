//! Text and JSON reports
//!
//! - Distribution reports: one file per (entity, metric), `err cum` header,
//!   `<value> <fraction>` lines, terminated by a blank line.
//! - Summary report: per group, `<group> <key...> <mean> <stdev>` lines.
//! - Fit report: per group, the label, the fitted line (or why it was
//!   skipped), then `mean_q mean_p stdev_q stdev_p key...` per key.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::distribution::{EntityDistribution, Metric};
use crate::error::{AnalysisError, Result};
use crate::key::ParameterKey;
use crate::stats::{CdfPoint, FitOutcome, GroupFit, JoinedGroup, JoinedPoint, SummaryTable};

/// Shortest round-trip form, always with a decimal point (`1.0`, `0.8`)
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

fn key_suffix(key: &ParameterKey) -> String {
    key.components()
        .iter()
        .map(|c| format!(" {}", c))
        .collect()
}

/// Write one CDF curve in the `err cum` layout
pub fn write_cdf<W: Write>(out: &mut W, points: &[CdfPoint]) -> std::io::Result<()> {
    writeln!(out, "err cum")?;
    for point in points {
        writeln!(out, "{} {}", point.value, format_float(point.fraction))?;
    }
    writeln!(out)
}

/// Path of the report for one entity and metric
///
/// # Errors
/// `Config` when the entity name would leave `out_dir` (path separators,
/// `.`/`..`, or empty).
pub fn distribution_path(out_dir: &Path, entity: &str, metric: Metric) -> Result<PathBuf> {
    let is_plain_name = !entity.is_empty()
        && entity != "."
        && entity != ".."
        && !entity.contains(['/', '\\'])
        && matches!(
            Path::new(entity).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
    if !is_plain_name {
        return Err(AnalysisError::Config(format!(
            "entity name {:?} cannot be used as a report file name",
            entity
        )));
    }
    Ok(out_dir.join(format!("{}_{}.txt", entity, metric.suffix())))
}

/// Write `<entity>_rank_error.txt` and `<entity>_delay.txt` into `out_dir`
pub fn write_distribution_reports(
    out_dir: &Path,
    distribution: &EntityDistribution,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| AnalysisError::io(out_dir, e))?;

    let mut written = Vec::with_capacity(2);
    for (metric, points) in [
        (Metric::RankError, &distribution.rank_error),
        (Metric::Delay, &distribution.delay),
    ] {
        let path = distribution_path(out_dir, &distribution.name, metric)?;
        write_report_file(&path, |out| write_cdf(out, points))?;
        debug!("Wrote {} points to {}", points.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

fn write_report_file<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut out = BufWriter::new(file);
    render(&mut out)
        .and_then(|_| out.flush())
        .map_err(|e| AnalysisError::io(path, e))
}

/// Render the per-group mean/stdev table
pub fn render_summary(table: &SummaryTable) -> String {
    let mut output = String::new();

    for group in table.groups() {
        output.push_str(&group.label);
        output.push('\n');
        for row in &group.rows {
            output.push_str(&format!(
                "{}{} {} {}\n",
                group.label,
                key_suffix(&row.key),
                format_float(row.summary.mean),
                format_float(row.summary.stdev)
            ));
        }
        output.push('\n');
    }

    output
}

fn render_point(point: &JoinedPoint) -> String {
    format!(
        "{} {} {} {}{}",
        format_float(point.quality.mean),
        format_float(point.performance.mean),
        format_float(point.quality.stdev),
        format_float(point.performance.stdev),
        key_suffix(&point.key)
    )
}

/// Render joined groups with their fits
///
/// `fits` must be in the same order as `groups`.
pub fn render_fit(groups: &[JoinedGroup], fits: &[GroupFit]) -> String {
    let mut output = String::new();

    for (group, fit) in groups.iter().zip(fits) {
        output.push_str(&group.label);
        output.push('\n');
        match &fit.outcome {
            FitOutcome::Fitted(result) => output.push_str(&format!(
                "fit {} {}\n",
                format_float(result.slope),
                format_float(result.intercept)
            )),
            FitOutcome::Skipped(reason) => {
                output.push_str(&format!("fit skipped: {}\n", reason))
            }
        }
        for point in &group.points {
            output.push_str(&render_point(point));
            output.push('\n');
        }
        output.push('\n');
    }

    output
}

/// One group of the JSON fit report
#[derive(Debug, Clone, Serialize)]
pub struct JsonFitGroup<'a> {
    pub label: &'a str,
    pub fit: &'a FitOutcome,
    pub points: &'a [JoinedPoint],
}

/// Render joined groups with their fits as pretty JSON
pub fn render_fit_json(groups: &[JoinedGroup], fits: &[GroupFit]) -> serde_json::Result<String> {
    let report: Vec<JsonFitGroup<'_>> = groups
        .iter()
        .zip(fits)
        .map(|(group, fit)| JsonFitGroup {
            label: &group.label,
            fit: &fit.outcome,
            points: &group.points,
        })
        .collect();
    serde_json::to_string_pretty(&report)
}

/// Render the mean/stdev table as pretty JSON
pub fn render_summary_json(table: &SummaryTable) -> serde_json::Result<String> {
    serde_json::to_string_pretty(table)
}

/// Render extracted distributions as pretty JSON
pub fn render_distributions_json(
    distributions: &[EntityDistribution],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(distributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{join, LogLinearFitter, SampleTable, SkipReason};
    use tempfile::TempDir;

    fn key(components: &[&str]) -> ParameterKey {
        ParameterKey::parse_components(components).unwrap()
    }

    #[test]
    fn test_format_float_keeps_decimal_point() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.8), "0.8");
        assert_eq!(format_float(0.5), "0.5");
    }

    #[test]
    fn test_write_cdf_layout() {
        let points = vec![
            CdfPoint { value: 0, fraction: 1.0 },
            CdfPoint { value: 1, fraction: 0.8 },
            CdfPoint { value: 2, fraction: 0.5 },
        ];
        let mut out = Vec::new();
        write_cdf(&mut out, &points).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "err cum\n0 1.0\n1 0.8\n2 0.5\n\n"
        );
    }

    #[test]
    fn test_write_distribution_reports_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("curves");
        let distribution = EntityDistribution {
            name: "lcrq".to_string(),
            threads: 8,
            rank_error: vec![CdfPoint { value: 0, fraction: 1.0 }],
            delay: vec![CdfPoint { value: 3, fraction: 1.0 }],
        };

        let written = write_distribution_reports(&out_dir, &distribution).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("lcrq_rank_error.txt"));
        assert!(written[1].ends_with("lcrq_delay.txt"));

        let delay = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(delay, "err cum\n3 1.0\n\n");
    }

    #[test]
    fn test_entity_name_cannot_escape_out_dir() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("curves");
        for name in ["../escaped", "a/b", "..", ".", "", "/abs", "a\\b"] {
            let err = distribution_path(&out_dir, name, Metric::Delay).unwrap_err();
            assert!(matches!(err, AnalysisError::Config(_)), "{:?}", name);
        }

        let distribution = EntityDistribution {
            name: "../escaped".to_string(),
            threads: 1,
            rank_error: vec![CdfPoint { value: 0, fraction: 1.0 }],
            delay: vec![CdfPoint { value: 0, fraction: 1.0 }],
        };
        assert!(write_distribution_reports(&out_dir, &distribution).is_err());
        assert!(!dir.path().join("escaped_rank_error.txt").exists());
    }

    #[test]
    fn test_distribution_path_plain_name() {
        let path = distribution_path(Path::new("out"), "lcrq..v2", Metric::RankError).unwrap();
        assert_eq!(path, Path::new("out").join("lcrq..v2_rank_error.txt"));
    }

    #[test]
    fn test_render_summary() {
        let mut samples = SampleTable::new();
        samples.record("bitset", key(&["64"]), 2.0);
        samples.record("bitset", key(&["64"]), 4.0);
        samples.record("lcrq", ParameterKey::Unkeyed, 7.0);

        let text = render_summary(&samples.reduce());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "bitset");
        assert!(lines[1].starts_with("bitset 64 3.0 1.414"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "lcrq");
        assert_eq!(lines[4], "lcrq 7.0 0.0");
    }

    #[test]
    fn test_render_fit_with_skipped_group() {
        let mut perf = SampleTable::new();
        let mut qual = SampleTable::new();
        perf.record("g", key(&["1", "2"]), 10.0);
        qual.record("g", key(&["1", "2"]), 0.5);
        let groups = join(&perf.reduce(), &qual.reduce()).unwrap();
        let fits = LogLinearFitter::default().fit_groups(&groups);
        assert_eq!(
            fits[0].outcome,
            FitOutcome::Skipped(SkipReason::UnderDetermined { points: 1 })
        );

        let text = render_fit(&groups, &fits);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "g");
        assert!(lines[1].starts_with("fit skipped: under-determined"));
        assert_eq!(lines[2], "0.5 10.0 0.0 0.0 1 2");
    }

    #[test]
    fn test_render_fit_json() {
        let mut perf = SampleTable::new();
        let mut qual = SampleTable::new();
        for (k, p, q) in [("1", 1.0, 1.0), ("2", 2.0, 2.0), ("3", 3.0, 4.0)] {
            perf.record("g", key(&[k]), p);
            qual.record("g", key(&[k]), q);
        }
        let groups = join(&perf.reduce(), &qual.reduce()).unwrap();
        let fits = LogLinearFitter::default().fit_groups(&groups);

        let json: serde_json::Value =
            serde_json::from_str(&render_fit_json(&groups, &fits).unwrap()).unwrap();
        assert_eq!(json[0]["label"], "g");
        assert!(json[0]["fit"]["fitted"]["slope"].as_f64().unwrap() > 0.0);
        assert_eq!(json[0]["points"][2]["key"][0], "3");
    }
}
