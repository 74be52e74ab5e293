use anyhow::{Context, Result};
use clap::Parser;
use fifostat::cli::{Cli, Command, OutputFormat};
use fifostat::config::AnalysisConfig;
use fifostat::distribution::DistributionExtractor;
use fifostat::ingest::{DatasetReader, FieldSizeLimit};
use fifostat::report;
use fifostat::schema::RecordSchema;
use fifostat::stats::{self, CdfBuilder, LogLinearFitter, SampleTable, SummaryTable};
use std::collections::HashSet;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Read a sweep dataset and reduce it to per-(group, key) statistics
fn summarize_file(
    reader: &DatasetReader,
    config: &AnalysisConfig,
    path: &Path,
) -> Result<SummaryTable> {
    let rows = reader
        .read_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = RecordSchema::from(&config.sweep)
        .sweep_records(&rows)
        .with_context(|| format!("Invalid row in {}", path.display()))?;
    Ok(SampleTable::from_records(&records).reduce())
}

fn run_summarize(
    reader: &DatasetReader,
    config: &AnalysisConfig,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let table = summarize_file(reader, config, file)?;
    match format {
        OutputFormat::Text => print!("{}", report::render_summary(&table)),
        OutputFormat::Json => println!("{}", report::render_summary_json(&table)?),
    }
    Ok(())
}

fn run_distribution(
    reader: &DatasetReader,
    config: &AnalysisConfig,
    file: &Path,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let rows = reader
        .read_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = RecordSchema::from(&config.distribution)
        .distribution_records(&rows)
        .with_context(|| format!("Invalid row in {}", file.display()))?;

    let extractor = DistributionExtractor::new(
        &config.distribution,
        CdfBuilder::from_config(&config.cdf),
    );
    let mut done = HashSet::new();
    let distributions = extractor
        .extract(&records, &mut done)
        .with_context(|| format!("Failed to build distributions from {}", file.display()))?;

    for distribution in &distributions {
        let written = report::write_distribution_reports(out_dir, distribution)?;
        if format == OutputFormat::Text {
            for path in written {
                println!("{}", path.display());
            }
        }
    }

    if format == OutputFormat::Json {
        println!("{}", report::render_distributions_json(&distributions)?);
    }
    Ok(())
}

fn run_fit(
    reader: &DatasetReader,
    config: &AnalysisConfig,
    performance: &Path,
    quality: &Path,
    format: OutputFormat,
) -> Result<()> {
    let performance_table = summarize_file(reader, config, performance)?;
    let quality_table = summarize_file(reader, config, quality)?;

    let groups = stats::join(&performance_table, &quality_table).with_context(|| {
        format!(
            "Cannot join {} with {}",
            performance.display(),
            quality.display()
        )
    })?;
    let fits = LogLinearFitter::from_config(&config.fit).fit_groups(&groups);

    match format {
        OutputFormat::Text => print!("{}", report::render_fit(&groups, &fits)),
        OutputFormat::Json => println!("{}", report::render_fit_json(&groups, &fits)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    // Histogram fields can exceed ordinary line limits; settle the limit once
    let limit = FieldSizeLimit::negotiate(config.field_size_ceiling.unwrap_or(u128::MAX))?;
    let reader = DatasetReader::new(config.delimiter_byte()?, limit);

    match &args.command {
        Command::Summarize { file, .. } => run_summarize(&reader, &config, file, args.format),
        Command::Distribution { file, out_dir, .. } => {
            run_distribution(&reader, &config, file, out_dir, args.format)
        }
        Command::Fit {
            performance,
            quality,
            ..
        } => run_fit(&reader, &config, performance, quality, args.format),
    }
}
