//! One-shot sync run: plan → fetch → route → reconcile → write.

use std::time::Instant;

use contracts::{
    DestinationStore, GroupFailure, GroupReport, LogDirection, LogQuery, LogSource, Record,
    RunReport, SyncSettings,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::SyncError;
use crate::reconcile::reconcile;
use crate::router::route;
use crate::timestamp::{self, nanos_to_seconds};
use crate::window;

const DEFAULT_FETCH_LIMIT: usize = 5000;

/// Incremental log sync engine
///
/// Stateless between runs: the resume point is always rediscovered from the
/// destination itself.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    settings: SyncSettings,
    query: String,
    limit: usize,
}

impl SyncEngine {
    /// Create a new engine with the given settings
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            query: String::new(),
            limit: DEFAULT_FETCH_LIMIT,
        }
    }

    /// Set the query text and result cap sent to the source
    pub fn with_query(mut self, query: impl Into<String>, limit: usize) -> Self {
        self.query = query.into();
        self.limit = limit;
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Newest stored timestamp across non-ignored groups, in Unix seconds.
    ///
    /// Each group contributes the newest readable timestamp among its trailing
    /// `tail_window_rows` rows, the same slice reconciliation reads first.
    /// Groups with no readable timestamp there are skipped with a warning.
    #[instrument(level = "debug", skip(self, store), fields(store = store.name()))]
    pub async fn last_processed<S: DestinationStore>(
        &self,
        store: &S,
    ) -> Result<Option<i64>, SyncError> {
        let groups = store.list_groups().await.map_err(SyncError::Destination)?;

        let mut latest: Option<i64> = None;
        for group in groups
            .iter()
            .filter(|g| !self.settings.is_ignored_group(g))
        {
            match self.tail_max_timestamp(store, group).await {
                Ok(Some(ts)) => latest = latest.max(Some(ts)),
                Ok(None) => debug!(group = %group, "group has no rows"),
                Err(e) => warn!(group = %group, error = %e, "skipping group for last processed time"),
            }
        }

        Ok(latest.map(nanos_to_seconds))
    }

    async fn tail_max_timestamp<S: DestinationStore>(
        &self,
        store: &S,
        group: &str,
    ) -> Result<Option<i64>, contracts::ContractError> {
        let Some(header) = store.header(group).await? else {
            return Ok(None);
        };
        let count = store.row_count(group).await?;
        if count == 0 {
            return Ok(None);
        }

        let ts_index = header
            .iter()
            .position(|c| *c == self.settings.timestamp_field)
            .ok_or_else(|| {
                contracts::ContractError::destination_read(group, "header has no timestamp column")
            })?;
        let start = count.saturating_sub(self.settings.tail_window_rows.max(1));
        let rows = store.read_rows(group, start, count).await?;

        rows.iter()
            .filter_map(|row| row.get(ts_index))
            .filter_map(|cell| timestamp::decode(cell, &self.settings.offset).ok())
            .max()
            .map(Some)
            .ok_or_else(|| {
                contracts::ContractError::destination_read(
                    group,
                    "no readable timestamp in trailing rows",
                )
            })
    }

    /// Run one sync invocation.
    ///
    /// `now` is the current time in Unix seconds. A fetch failure aborts the
    /// run before anything is written; a failing group is recorded in the
    /// report and the remaining groups still run.
    #[instrument(
        name = "sync_run",
        skip(self, source, store),
        fields(source = source.name(), store = store.name(), dry_run = self.settings.dry_run)
    )]
    pub async fn run_once<L, S>(
        &self,
        source: &L,
        store: &mut S,
        now: i64,
    ) -> Result<RunReport, SyncError>
    where
        L: LogSource,
        S: DestinationStore,
    {
        let started = Instant::now();

        let last_processed = self.last_processed(store).await?;
        let window = window::plan(last_processed, now, &self.settings.window);
        info!(
            last_processed = ?last_processed,
            start = window.start_seconds,
            end = window.end_seconds,
            "fetch window planned"
        );

        let query = LogQuery {
            query: self.query.clone(),
            start_nanos: window.start_nanos(),
            limit: self.limit,
            direction: LogDirection::Forward,
        };
        let records = source.fetch(&query).await.map_err(SyncError::Fetch)?;
        let fetched = records.len();
        info!(fetched, "records fetched");
        if fetched >= self.limit {
            warn!(limit = self.limit, "fetch hit the result limit; later records wait for the next run");
        }

        let routed = route(records, &self.settings);

        let mut report = RunReport {
            window: Some(window),
            last_processed,
            fetched,
            rejected: routed.rejected,
            ignored: routed.ignored,
            dry_run: self.settings.dry_run,
            ..RunReport::default()
        };

        for (group, records) in &routed.groups {
            match self.process_group(store, group, records).await {
                Ok(group_report) => report.groups.push(group_report),
                Err(e) => {
                    error!(group = %group, error = %e, "group processing failed");
                    report.failures.push(GroupFailure {
                        group: group.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        observability::record_run_report(&report);
        observability::record_run_duration(started.elapsed().as_secs_f64());

        info!(
            appended = report.total_appended(),
            duplicates = report.total_duplicates(),
            failed_groups = report.failures.len(),
            "sync run finished"
        );
        Ok(report)
    }

    #[instrument(level = "debug", skip(self, store, records), fields(group = %group))]
    async fn process_group<S: DestinationStore>(
        &self,
        store: &mut S,
        group: &str,
        records: &[Record],
    ) -> Result<GroupReport, SyncError> {
        let outcome = reconcile(store, group, records, &self.settings)
            .await
            .map_err(|e| SyncError::group(group, e))?;

        if !outcome.rows.is_empty() && !self.settings.dry_run {
            if outcome.header_changed() {
                store
                    .write_header(group, &outcome.columns)
                    .await
                    .map_err(|e| SyncError::group(group, e))?;
                debug!(added = ?outcome.columns_added, "header updated");
            }
            store
                .append_rows(group, &outcome.rows)
                .await
                .map_err(|e| SyncError::group(group, e))?;
        }

        info!(
            case = outcome.case.as_str(),
            appended = outcome.rows.len(),
            duplicates = outcome.duplicates,
            "group synced"
        );

        Ok(GroupReport {
            group: group.to_string(),
            incoming: records.len(),
            appended: outcome.rows.len(),
            duplicates: outcome.duplicates,
            rows_compared: outcome.rows_compared,
            case: outcome.case,
            columns_added: if outcome.rows.is_empty() {
                Vec::new()
            } else {
                outcome.columns_added
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, ReconcileCase};
    use destination::MemoryStore;

    const NOW: i64 = 1_700_000_000;
    const SEC: i64 = 1_000_000_000;

    struct StaticSource {
        records: Vec<Record>,
        fail: bool,
    }

    impl StaticSource {
        fn new(records: Vec<Record>) -> Self {
            Self {
                records,
                fail: false,
            }
        }
    }

    impl LogSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, query: &LogQuery) -> Result<Vec<Record>, ContractError> {
            if self.fail {
                return Err(ContractError::source_fetch("503 Service Unavailable", Some(503)));
            }
            Ok(self
                .records
                .iter()
                .filter(|r| r.timestamp >= query.start_nanos)
                .cloned()
                .collect())
        }
    }

    fn record(ts: i64, service: &str, msg: &str) -> Record {
        Record::new(ts)
            .with_field("service", service)
            .with_field("msg", msg)
    }

    #[tokio::test]
    async fn test_first_run_writes_groups() {
        let engine = SyncEngine::new(SyncSettings::default());
        let source = StaticSource::new(vec![
            record((NOW - 60) * SEC, "api", "a"),
            record((NOW - 50) * SEC, "web", "b"),
            record((NOW - 40) * SEC, "api", "c"),
            record((NOW - 30) * SEC, "_internal", "x"),
        ]);
        let mut store = MemoryStore::new();

        let report = engine.run_once(&source, &mut store, NOW).await.unwrap();
        assert_eq!(report.fetched, 4);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.total_appended(), 3);
        assert_eq!(store.rows("api").unwrap().len(), 2);
        assert_eq!(store.rows("web").unwrap().len(), 1);
        assert!(store.rows("_internal").is_none());
        assert_eq!(
            report.window.unwrap().start_seconds,
            NOW - 3600,
            "no state means full lookback"
        );
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let engine = SyncEngine::new(SyncSettings::default());
        let source = StaticSource::new(vec![
            record((NOW - 60) * SEC, "api", "a"),
            record((NOW - 40) * SEC, "api", "c"),
        ]);
        let mut store = MemoryStore::new();

        engine.run_once(&source, &mut store, NOW).await.unwrap();
        let report = engine.run_once(&source, &mut store, NOW + 10).await.unwrap();

        assert_eq!(report.last_processed, Some(NOW - 40));
        assert_eq!(report.window.unwrap().start_seconds, NOW - 40 - 300);
        assert_eq!(report.total_appended(), 0);
        assert_eq!(report.total_duplicates(), 2);
        assert_eq!(store.rows("api").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let engine = SyncEngine::new(SyncSettings {
            dry_run: true,
            ..SyncSettings::default()
        });
        let source = StaticSource::new(vec![record((NOW - 60) * SEC, "api", "a")]);
        let mut store = MemoryStore::new();

        let report = engine.run_once(&source, &mut store, NOW).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.total_appended(), 1);
        assert!(store.list_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let engine = SyncEngine::new(SyncSettings::default());
        let source = StaticSource {
            records: vec![],
            fail: true,
        };
        let mut store = MemoryStore::new();

        let err = engine.run_once(&source, &mut store, NOW).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(ContractError::SourceFetch { .. })));
    }

    #[tokio::test]
    async fn test_last_processed_skips_unreadable_and_ignored_groups() {
        let engine = SyncEngine::new(SyncSettings::default());
        let mut store = MemoryStore::new();
        let header = vec!["timestamp".to_string(), "msg".to_string()];
        let ts = |secs: i64| timestamp::encode(secs * SEC + 999, &contracts::Offset::utc()).unwrap();

        store.write_header("api", &header).await.unwrap();
        store.append_rows("api", &[vec![ts(NOW - 100), "a".into()]]).await.unwrap();
        store.write_header("web", &header).await.unwrap();
        store.append_rows("web", &[vec!["garbage".into(), "b".into()]]).await.unwrap();
        store.write_header("_meta", &header).await.unwrap();
        store.append_rows("_meta", &[vec![ts(NOW), "m".into()]]).await.unwrap();
        store.write_header("empty", &header).await.unwrap();

        assert_eq!(engine.last_processed(&store).await.unwrap(), Some(NOW - 100));
    }

    #[tokio::test]
    async fn test_late_arrivals_do_not_duplicate_on_rerun() {
        let at = |x: i64| (NOW - 2000 + x) * SEC;
        let source = |xs: &[i64]| {
            StaticSource::new(xs.iter().map(|&x| record(at(x), "api", &format!("m{x}"))).collect())
        };
        let engine = SyncEngine::new(SyncSettings::default());
        let mut store = MemoryStore::new();

        engine.run_once(&source(&[1000, 1250]), &mut store, NOW).await.unwrap();
        engine
            .run_once(&source(&[1000, 1100, 1200, 1250]), &mut store, NOW)
            .await
            .unwrap();
        engine
            .run_once(&source(&[1000, 1100, 1200, 1250, 1450]), &mut store, NOW)
            .await
            .unwrap();

        let msgs: Vec<_> = store.rows("api").unwrap().iter().map(|r| r[1].clone()).collect();
        assert_eq!(msgs, vec!["m1000", "m1250", "m1100", "m1200", "m1450"]);

        let report = engine
            .run_once(&source(&[1000, 1100, 1200, 1250, 1450]), &mut store, NOW)
            .await
            .unwrap();
        assert_eq!(report.window.unwrap().start_seconds, NOW - 2000 + 1150);
        assert_eq!(report.groups[0].case, ReconcileCase::Overlap);
        assert_eq!(report.total_appended(), 0);
        assert_eq!(store.rows("api").unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_last_processed_uses_max_of_trailing_rows() {
        let engine = SyncEngine::new(SyncSettings::default());
        let mut store = MemoryStore::new();
        let header = vec!["timestamp".to_string(), "msg".to_string()];
        let ts = |secs: i64| timestamp::encode(secs * SEC, &contracts::Offset::utc()).unwrap();

        store.write_header("api", &header).await.unwrap();
        store
            .append_rows(
                "api",
                &[
                    vec![ts(NOW - 100), "newest".into()],
                    vec![ts(NOW - 400), "late".into()],
                    vec!["garbage".into(), "broken".into()],
                ],
            )
            .await
            .unwrap();

        assert_eq!(engine.last_processed(&store).await.unwrap(), Some(NOW - 100));
    }

    #[tokio::test]
    async fn test_boundary_equal_group_report() {
        let engine = SyncEngine::new(SyncSettings::default());
        let mut store = MemoryStore::new();
        let first = StaticSource::new(vec![record((NOW - 60) * SEC, "api", "a")]);
        engine.run_once(&first, &mut store, NOW).await.unwrap();

        let second = StaticSource::new(vec![
            record((NOW - 60) * SEC, "api", "a"),
            record((NOW - 60) * SEC, "api", "different"),
        ]);
        let report = engine.run_once(&second, &mut store, NOW).await.unwrap();
        let group = &report.groups[0];
        assert_eq!(group.case, ReconcileCase::BoundaryEqual);
        assert_eq!(group.appended, 1);
        assert_eq!(group.duplicates, 1);
    }
}
