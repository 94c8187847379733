//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_sync(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding log store endpoint from CLI");
        config.source.endpoint = endpoint.clone();
    }
    if let Some(overlap) = args.overlap_seconds {
        info!(overlap_seconds = overlap, "Overriding overlap from CLI");
        config.sync.overlap_seconds = overlap;
    }

    let mut settings = config_loader::ConfigLoader::sync_settings(&config);
    settings.dry_run = args.dry_run;

    info!(
        endpoint = %config.source.endpoint,
        destination = config.destination.kind(),
        timezone = settings.offset.as_str(),
        overlap_seconds = settings.window.overlap_seconds,
        lookback_seconds = settings.window.lookback_seconds,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        config,
        settings,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let stats = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        appended = stats.report.total_appended(),
        duplicates = stats.report.total_duplicates(),
        duration_secs = stats.duration.as_secs_f64(),
        rows_per_sec = format!("{:.2}", stats.rows_per_sec()),
        "Sync run completed"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize run report")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    if stats.report.has_failures() {
        return Err(CliError::group_failures(&stats.report).into());
    }
    Ok(())
}
