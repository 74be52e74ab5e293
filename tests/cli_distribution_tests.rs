// Integration tests for `fifostat distribution`

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// One quality row: name, threads, three unused columns, rank-error
/// histogram, three unused columns, delay histogram
fn quality_row(name: &str, threads: u32, rank_error: &str, delay: &str) -> String {
    format!(
        "{},{},0,0,0,{},0,0,0,{}\n",
        name, threads, rank_error, delay
    )
}

fn uniform_histogram(values: u64) -> String {
    (0..values).map(|v| format!("{};1|", v)).collect()
}

#[test]
fn test_distribution_writes_full_curves() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    fs::write(&data, quality_row("lcrq", 4, "0;2|1;3|2;5|", "0;1|4;1|")).unwrap();
    let out_dir = dir.path().join("curves");

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution").arg(&data).arg("-o").arg(&out_dir);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("lcrq_rank_error.txt"))
        .stdout(predicate::str::contains("lcrq_delay.txt"));

    let rank_error = fs::read_to_string(out_dir.join("lcrq_rank_error.txt")).unwrap();
    assert_eq!(rank_error, "err cum\n0 1.0\n1 0.8\n2 0.5\n\n");
    let delay = fs::read_to_string(out_dir.join("lcrq_delay.txt")).unwrap();
    assert_eq!(delay, "err cum\n0 1.0\n4 0.5\n\n");
}

#[test]
fn test_distribution_first_run_wins() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    let content = [
        quality_row("lcrq", 4, "0;1|", "0;1|"),
        quality_row("lcrq", 8, "7;1|", "7;1|"),
    ]
    .concat();
    fs::write(&data, content).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution").arg(&data).arg("-o").arg(dir.path());
    cmd.assert().success();

    let rank_error = fs::read_to_string(dir.path().join("lcrq_rank_error.txt")).unwrap();
    assert_eq!(rank_error, "err cum\n0 1.0\n\n");
}

#[test]
fn test_distribution_max_threads_only() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    let content = [
        quality_row("lcrq", 4, "0;1|", "0;1|"),
        quality_row("lcrq", 8, "7;1|", "7;1|"),
        quality_row("multififo", 4, "1;1|", "1;1|"),
    ]
    .concat();
    fs::write(&data, content).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution")
        .arg(&data)
        .arg("-o")
        .arg(dir.path())
        .arg("--max-threads-only");
    cmd.assert().success();

    let rank_error = fs::read_to_string(dir.path().join("lcrq_rank_error.txt")).unwrap();
    assert_eq!(rank_error, "err cum\n7 1.0\n\n");
    assert!(!dir.path().join("multififo_rank_error.txt").exists());
}

#[test]
fn test_distribution_thinned_uniform() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    let histogram = uniform_histogram(1000);
    fs::write(&data, quality_row("klsm", 16, &histogram, "0;1|")).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution")
        .arg(&data)
        .arg("-o")
        .arg(dir.path())
        .arg("--thinned");
    cmd.assert().success();

    let rank_error = fs::read_to_string(dir.path().join("klsm_rank_error.txt")).unwrap();
    let points: Vec<&str> = rank_error
        .lines()
        .skip(1)
        .filter(|l| !l.is_empty())
        .collect();
    assert_eq!(points.len(), 100);
    assert_eq!(points[0], "0 1.0");
    assert!(points[99].starts_with("990 "));
}

#[test]
fn test_distribution_remap_zero() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    fs::write(&data, quality_row("lcrq", 4, "0;1|3;1|", "0;1|")).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution")
        .arg(&data)
        .arg("-o")
        .arg(dir.path())
        .arg("--remap-zero");
    cmd.assert().success();

    let rank_error = fs::read_to_string(dir.path().join("lcrq_rank_error.txt")).unwrap();
    assert_eq!(rank_error, "err cum\n1 1.0\n3 0.5\n\n");
}

#[test]
fn test_distribution_json_output() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    fs::write(&data, quality_row("lcrq", 4, "0;2|1;3|2;5|", "0;1|")).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution")
        .arg(&data)
        .arg("-o")
        .arg(dir.path())
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json[0]["name"], "lcrq");
    assert_eq!(json[0]["threads"], 4);
    assert_eq!(json[0]["rank_error"][1]["fraction"], 0.8);
}

#[test]
fn test_distribution_empty_histogram_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    fs::write(&data, quality_row("lcrq", 4, "0;0|", "0;1|")).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution").arg(&data).arg("-o").arg(dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("total count of zero"))
        .stderr(predicate::str::contains("lcrq"));
}

#[test]
fn test_distribution_malformed_histogram_names_line() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    let content = [
        quality_row("lcrq", 4, "0;1|", "0;1|"),
        quality_row("klsm", 4, "0;one|", "0;1|"),
    ]
    .concat();
    fs::write(&data, content).unwrap();

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution").arg(&data).arg("-o").arg(dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_distribution_rejects_entity_outside_out_dir() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("quality.csv");
    fs::write(&data, quality_row("../escaped", 4, "0;1|", "0;1|")).unwrap();
    let out_dir = dir.path().join("curves");

    let mut cmd = Command::cargo_bin("fifostat").unwrap();
    cmd.arg("distribution").arg(&data).arg("-o").arg(&out_dir);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("report file name"));
    assert!(!dir.path().join("escaped_rank_error.txt").exists());
}
