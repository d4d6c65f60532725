mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use payroll_compute::{EncoderOptions, FeatureScaling, Pipeline, PipelineConfig};
use payroll_core::{Config, JsonFileSource, RecordSource};

use crate::cli::CliArgs;
use crate::report::ReportOptions;

fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    payroll_core::config::load_dotenv();
    let args = CliArgs::parse();

    if args.list_profiles {
        for profile in Config::available_profiles() {
            println!("{}", profile);
        }
        return Ok(());
    }

    let mut config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    args.apply_to(&mut config);
    config.log_summary();

    let scaling: FeatureScaling = config
        .model
        .scaling
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid PAYROLL_SCALING")?;

    let source = JsonFileSource::new(&config.input.path);
    let records = source
        .load()
        .with_context(|| format!("failed to load records from {}", source.name()))?;
    info!(records = records.len(), source = source.name(), "records loaded");

    let pipeline = Pipeline::with_config(PipelineConfig {
        scaling,
        encoder: EncoderOptions {
            include_identifier: config.model.include_identifier,
        },
        max_batch_size: config.model.max_batch_size,
    });
    let (results, metrics) = pipeline
        .run_with_metrics(&records, config.model.rank)
        .context("anomaly run failed")?;

    let opts = ReportOptions {
        threshold: config.report.threshold,
        top: config.report.top,
    };
    print!("{}", report::render(args.format, &results, &metrics, &opts)?);

    Ok(())
}
