//! `status` command implementation.

use anyhow::{Context, Result};
use contracts::{DestinationStore, SyncSettings};
use serde::Serialize;
use sync_engine::{timestamp, SyncEngine};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::pipeline::AnyStore;

#[derive(Serialize)]
struct StatusReport {
    destination: String,
    /// Resume point for the next run (Unix seconds)
    last_processed: Option<i64>,
    groups: Vec<GroupStatus>,
}

#[derive(Serialize)]
struct GroupStatus {
    name: String,
    ignored: bool,
    rows: usize,
    columns: Vec<String>,
    /// Timestamp cell of the last row, as stored
    last_timestamp: Option<String>,
    /// Decoded last timestamp, RFC 3339 in UTC
    last_timestamp_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `status` command
pub async fn run_status(args: &StatusArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }
    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let settings = config_loader::ConfigLoader::sync_settings(&config);

    let store = AnyStore::open(&config.destination)?;
    info!(destination = config.destination.kind(), "Inspecting destination");

    let report = collect_status(&store, settings).await?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize status report")?;
        println!("{}", json);
    } else {
        print_status(&report, args.columns);
    }
    Ok(())
}

async fn collect_status<S: DestinationStore>(
    store: &S,
    settings: SyncSettings,
) -> Result<StatusReport> {
    let groups = store
        .list_groups()
        .await
        .context("Failed to list destination groups")?;

    let mut statuses = Vec::with_capacity(groups.len());
    for name in groups {
        let ignored = settings.is_ignored_group(&name);
        let status = match group_status(store, &name, &settings).await {
            Ok(status) => status,
            Err(e) => {
                warn!(group = %name, error = %e, "group unreadable");
                GroupStatus {
                    name: name.clone(),
                    ignored,
                    rows: 0,
                    columns: Vec::new(),
                    last_timestamp: None,
                    last_timestamp_utc: None,
                    error: Some(e.to_string()),
                }
            }
        };
        statuses.push(GroupStatus { ignored, ..status });
    }

    let last_processed = SyncEngine::new(settings)
        .last_processed(store)
        .await
        .context("Failed to determine last processed time")?;

    Ok(StatusReport {
        destination: store.name().to_string(),
        last_processed,
        groups: statuses,
    })
}

async fn group_status<S: DestinationStore>(
    store: &S,
    name: &str,
    settings: &SyncSettings,
) -> Result<GroupStatus, contracts::ContractError> {
    let columns = store.header(name).await?.unwrap_or_default();
    let rows = store.row_count(name).await?;

    let last_timestamp = if rows == 0 {
        None
    } else {
        let ts_index = columns.iter().position(|c| *c == settings.timestamp_field);
        store
            .read_rows(name, rows - 1, rows)
            .await?
            .into_iter()
            .next()
            .zip(ts_index)
            .and_then(|(row, idx)| row.into_iter().nth(idx))
    };
    let last_timestamp_utc = last_timestamp
        .as_deref()
        .and_then(|cell| timestamp::decode(cell, &settings.offset).ok())
        .map(|nanos| chrono::DateTime::from_timestamp_nanos(nanos).to_rfc3339());

    Ok(GroupStatus {
        name: name.to_string(),
        ignored: false,
        rows,
        columns,
        last_timestamp,
        last_timestamp_utc,
        error: None,
    })
}

fn print_status(report: &StatusReport, show_columns: bool) {
    println!("\nDestination: {}", report.destination);
    match report
        .last_processed
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    {
        Some(at) => println!("Last processed: {}", at.to_rfc3339()),
        None => println!("Last processed: never (next run uses the full lookback)"),
    }

    if report.groups.is_empty() {
        println!("\nNo groups stored.");
        return;
    }

    println!(
        "\n   {:<24} {:>8} {:>8}  {}",
        "group", "rows", "columns", "last timestamp"
    );
    for group in &report.groups {
        let marker = if group.ignored { " (ignored)" } else { "" };
        let last = match (&group.error, &group.last_timestamp) {
            (Some(e), _) => format!("error: {e}"),
            (None, Some(ts)) if group.last_timestamp_utc.is_none() => format!("{ts} (unreadable)"),
            (None, Some(ts)) => ts.clone(),
            (None, None) => "-".to_string(),
        };
        println!(
            "   {:<24} {:>8} {:>8}  {}{}",
            group.name,
            group.rows,
            group.columns.len(),
            last,
            marker
        );
        if show_columns && !group.columns.is_empty() {
            println!("   {:<24} [{}]", "", group.columns.join(", "));
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Offset;
    use destination::MemoryStore;

    const SEC: i64 = 1_000_000_000;

    #[tokio::test]
    async fn test_collect_status_reports_groups() {
        let mut store = MemoryStore::new();
        let header = vec!["timestamp".to_string(), "msg".to_string()];
        let ts = timestamp::encode(1_700_000_000 * SEC, &Offset::utc()).unwrap();

        store.write_header("api", &header).await.unwrap();
        store
            .append_rows("api", &[vec![ts.clone(), "a".into()]])
            .await
            .unwrap();
        store.write_header("_internal", &header).await.unwrap();
        store.write_header("web", &header).await.unwrap();
        store
            .append_rows("web", &[vec!["garbage".into(), "b".into()]])
            .await
            .unwrap();

        let report = collect_status(&store, SyncSettings::default()).await.unwrap();
        assert_eq!(report.last_processed, Some(1_700_000_000));

        let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["_internal", "api", "web"]);
        assert!(report.groups[0].ignored);

        let api = &report.groups[1];
        assert_eq!(api.rows, 1);
        assert_eq!(api.last_timestamp.as_deref(), Some(ts.as_str()));
        assert_eq!(
            api.last_timestamp_utc.as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );

        let web = &report.groups[2];
        assert_eq!(web.last_timestamp.as_deref(), Some("garbage"));
        assert!(web.last_timestamp_utc.is_none());
    }

    #[tokio::test]
    async fn test_collect_status_empty_store() {
        let report = collect_status(&MemoryStore::new(), SyncSettings::default())
            .await
            .unwrap();
        assert!(report.groups.is_empty());
        assert_eq!(report.last_processed, None);
        assert_eq!(report.destination, "memory");
    }
}
