//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DestinationConfig, Offset, SyncerConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    endpoint: String,
    query: String,
    limit: usize,
    auth: &'static str,
    destination: String,
    timezone: String,
    overlap_seconds: u64,
    lookback_seconds: u64,
    group_field: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::InvalidConfig.into())
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            error: Some(CliError::config_not_found(config_path.clone()).to_string()),
            config_path,
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(summarize(&config)),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

fn summarize(config: &SyncerConfig) -> ConfigSummary {
    let destination = match &config.destination {
        DestinationConfig::Jsonl { path } => format!("jsonl ({})", path.display()),
        DestinationConfig::Memory => "memory".to_string(),
    };
    let auth = match &config.source.auth {
        None => "none",
        Some(contracts::AuthConfig::Basic { .. }) => "basic",
        Some(contracts::AuthConfig::Bearer { .. }) => "bearer",
    };

    ConfigSummary {
        endpoint: config.source.endpoint.clone(),
        query: config.source.query.clone(),
        limit: config.source.limit,
        auth,
        destination,
        timezone: config.sync.timezone.clone(),
        overlap_seconds: config.sync.overlap_seconds,
        lookback_seconds: config.sync.lookback_seconds,
        group_field: config.sync.group_field.clone(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SyncerConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let sync = &config.sync;

    if let Err(e) = Offset::parse(&sync.timezone) {
        warnings.push(format!("sync.timezone: {e}; +00:00 will be used"));
    }

    if sync.overlap_seconds == 0 {
        warnings.push(
            "sync.overlap_seconds is 0 - late-arriving lines at the boundary may be missed"
                .to_string(),
        );
    } else if sync.overlap_seconds > sync.lookback_seconds {
        warnings.push(format!(
            "sync.overlap_seconds ({}) exceeds lookback_seconds ({}) - the lookback bound applies",
            sync.overlap_seconds, sync.lookback_seconds
        ));
    }

    if matches!(config.destination, DestinationConfig::Memory) {
        warnings.push(
            "destination kind 'memory' keeps nothing between runs - every run starts from the full lookback"
                .to_string(),
        );
    }

    if config.source.endpoint.starts_with("http://") && config.source.auth.is_some() {
        warnings.push("credentials are sent over plain http".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Endpoint: {} (auth: {})", summary.endpoint, summary.auth);
            println!("  Query: {}", summary.query);
            println!("  Limit: {}", summary.limit);
            println!("  Destination: {}", summary.destination);
            println!("  Timezone: {}", summary.timezone);
            println!(
                "  Window: overlap {}s, lookback {}s",
                summary.overlap_seconds, summary.lookback_seconds
            );
            println!("  Group field: {}", summary.group_field);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
