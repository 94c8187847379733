//! Pipeline orchestrator - wires source, engine and destination for one run.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{LogSource, SyncSettings, SyncerConfig};
use ingestion::LokiSource;
use sync_engine::SyncEngine;
use tracing::info;

use super::{AnyStore, PipelineStats};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded and validated configuration file
    pub config: SyncerConfig,

    /// Runtime sync settings (CLI overrides already applied)
    pub settings: SyncSettings,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One-shot sync pipeline
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run one invocation against the configured log store
    pub async fn run(self) -> Result<PipelineStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let source = LokiSource::new(
            "loki",
            &self.config.config.source,
            self.config.settings.timestamp_field.clone(),
        )
        .context("Failed to build log store client")?;

        self.run_with_source(&source, chrono::Utc::now().timestamp())
            .await
    }

    /// Run one invocation against an arbitrary source; `now` is Unix seconds
    pub async fn run_with_source<L: LogSource>(&self, source: &L, now: i64) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let source_config = &self.config.config.source;

        let mut store = AnyStore::open(&self.config.config.destination)?;
        let engine = SyncEngine::new(self.config.settings.clone())
            .with_query(source_config.query.clone(), source_config.limit);

        info!(
            source = source.name(),
            destination = self.config.config.destination.kind(),
            dry_run = self.config.settings.dry_run,
            "Starting sync run"
        );

        let report = engine
            .run_once(source, &mut store, now)
            .await
            .context("Sync run failed")?;

        Ok(PipelineStats {
            report,
            duration: start_time.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DestinationConfig, Record, SourceConfig, SyncSection};
    use ingestion::MockLogSource;

    const NOW: i64 = 1_700_000_000;
    const SEC: i64 = 1_000_000_000;

    fn pipeline(destination: DestinationConfig, dry_run: bool) -> Pipeline {
        let config = SyncerConfig {
            version: Default::default(),
            source: SourceConfig {
                endpoint: "http://127.0.0.1:3100".into(),
                query: r#"{job="app"} | json"#.into(),
                limit: 1000,
                timeout_secs: 5,
                auth: None,
            },
            destination,
            sync: SyncSection::default(),
        };
        let mut settings = config_loader::ConfigLoader::sync_settings(&config);
        settings.dry_run = dry_run;
        Pipeline::new(PipelineConfig {
            config,
            settings,
            metrics_port: None,
        })
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new((NOW - 120) * SEC)
                .with_field("service", "api")
                .with_field("msg", "a"),
            Record::new((NOW - 60) * SEC)
                .with_field("service", "web")
                .with_field("msg", "b"),
        ]
    }

    #[tokio::test]
    async fn test_run_into_jsonl_directory() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            DestinationConfig::Jsonl {
                path: dir.path().to_path_buf(),
            },
            false,
        );
        let source = MockLogSource::new(records());

        let stats = pipeline.run_with_source(&source, NOW).await.unwrap();
        assert_eq!(stats.report.total_appended(), 2);
        assert!(dir.path().join("api.jsonl").exists());
        assert!(dir.path().join("web.jsonl").exists());

        let queries = source.queries();
        assert_eq!(queries[0].query, r#"{job="app"} | json"#);
        assert_eq!(queries[0].limit, 1000);

        // A second invocation resumes from the files and appends nothing
        let stats = pipeline.run_with_source(&source, NOW + 5).await.unwrap();
        assert_eq!(stats.report.total_appended(), 0);
        assert_eq!(stats.report.last_processed, Some(NOW - 60));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_directory_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            DestinationConfig::Jsonl {
                path: dir.path().to_path_buf(),
            },
            true,
        );

        let stats = pipeline
            .run_with_source(&MockLogSource::new(records()), NOW)
            .await
            .unwrap();
        assert!(stats.report.dry_run);
        assert_eq!(stats.report.total_appended(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let pipeline = pipeline(DestinationConfig::Memory, false);
        let err = pipeline
            .run_with_source(&MockLogSource::failing(502), NOW)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Sync run failed"));
    }
}
