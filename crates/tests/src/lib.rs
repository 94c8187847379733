//! # Integration Tests
//!
//! End-to-end runs across crate boundaries:
//! - config file -> settings -> engine
//! - mock source -> engine -> memory / jsonl destinations
//! - resuming across invocations from destination content only

#[cfg(test)]
mod contract_tests {
    use contracts::SyncSettings;

    #[test]
    fn test_default_settings_match_config_defaults() {
        let config = config_loader::ConfigLoader::load_from_str(
            r#"
[source]
endpoint = "http://loki:3100"
query = '{job="app"} | json'

[destination]
kind = "memory"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let loaded = config_loader::ConfigLoader::sync_settings(&config);
        let defaults = SyncSettings::default();
        assert_eq!(loaded.window, defaults.window);
        assert_eq!(loaded.offset, defaults.offset);
        assert_eq!(loaded.timestamp_field, defaults.timestamp_field);
        assert_eq!(loaded.group_field, defaults.group_field);
        assert_eq!(loaded.tail_window_rows, defaults.tail_window_rows);
    }

    #[test]
    fn test_run_report_serializes() {
        let report = contracts::RunReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fetched"], 0);
        assert_eq!(json["dry_run"], false);
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{
        ContractError, DestinationStore, Offset, ReconcileCase, Record, SyncSettings,
    };
    use destination::{JsonlStore, MemoryStore};
    use ingestion::MockLogSource;
    use sync_engine::{timestamp, SyncEngine};

    const NOW: i64 = 1_700_000_000;
    const SEC: i64 = 1_000_000_000;

    fn record(ts: i64, service: &str, msg: &str) -> Record {
        Record::new(ts)
            .with_field("service", service)
            .with_field("msg", msg)
    }

    fn engine() -> SyncEngine {
        SyncEngine::new(SyncSettings::default()).with_query(r#"{job="app"} | json"#, 1000)
    }

    /// Destination that refuses writes for one group
    struct FailingStore {
        inner: MemoryStore,
        failing_group: Option<String>,
    }

    impl FailingStore {
        fn check(&self, group: &str) -> Result<(), ContractError> {
            if self.failing_group.as_deref() == Some(group) {
                return Err(ContractError::destination_write(group, "quota exceeded"));
            }
            Ok(())
        }
    }

    impl DestinationStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn list_groups(&self) -> Result<Vec<String>, ContractError> {
            self.inner.list_groups().await
        }

        async fn header(&self, group: &str) -> Result<Option<Vec<String>>, ContractError> {
            self.inner.header(group).await
        }

        async fn row_count(&self, group: &str) -> Result<usize, ContractError> {
            self.inner.row_count(group).await
        }

        async fn read_rows(
            &self,
            group: &str,
            start: usize,
            end: usize,
        ) -> Result<Vec<Vec<String>>, ContractError> {
            self.inner.read_rows(group, start, end).await
        }

        async fn write_header(
            &mut self,
            group: &str,
            columns: &[String],
        ) -> Result<(), ContractError> {
            self.check(group)?;
            self.inner.write_header(group, columns).await
        }

        async fn append_rows(
            &mut self,
            group: &str,
            rows: &[Vec<String>],
        ) -> Result<(), ContractError> {
            self.check(group)?;
            self.inner.append_rows(group, rows).await
        }
    }

    /// Empty group, records at nanoseconds 100 and 200
    #[tokio::test]
    async fn test_disjoint_ahead_into_empty_group() {
        let source = MockLogSource::new(vec![
            Record::new(200).with_field("service", "svc").with_field("b", "2"),
            Record::new(100).with_field("service", "svc").with_field("a", "1"),
        ]);
        let mut store = MemoryStore::new();

        let report = engine().run_once(&source, &mut store, 1_000).await.unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].case, ReconcileCase::DisjointAhead);
        assert_eq!(report.groups[0].appended, 2);
        assert_eq!(
            store.columns("svc").unwrap(),
            ["timestamp", "a", "b", "service"]
        );

        let rows = store.rows("svc").unwrap();
        let offset = Offset::utc();
        assert_eq!(timestamp::decode(&rows[0][0], &offset).unwrap(), 100);
        assert_eq!(timestamp::decode(&rows[1][0], &offset).unwrap(), 200);
    }

    /// Same timestamp as the stored tail: identical content is dropped,
    /// differing content is kept
    #[tokio::test]
    async fn test_boundary_equal_through_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let t = (NOW - 30) * SEC + 123_456_789;

        let mut store = JsonlStore::new("jsonl", dir.path()).unwrap();
        engine()
            .run_once(
                &MockLogSource::new(vec![record(t, "svc", "stored")]),
                &mut store,
                NOW,
            )
            .await
            .unwrap();

        let source = MockLogSource::new(vec![
            record(t, "svc", "stored"),
            record(t, "svc", "changed"),
            record(t + 1, "svc", "later"),
        ]);
        let report = engine().run_once(&source, &mut store, NOW).await.unwrap();

        let group = &report.groups[0];
        assert_eq!(group.case, ReconcileCase::BoundaryEqual);
        assert_eq!(group.duplicates, 1);
        assert_eq!(group.appended, 2);
        assert_eq!(store.row_count("svc").await.unwrap(), 3);
    }

    /// Batch reaching back before the stored tail
    #[tokio::test]
    async fn test_overlap_keeps_only_unseen_rows() {
        let t_old = (NOW - 100) * SEC;
        let mut store = MemoryStore::new();
        let first = MockLogSource::new(vec![
            record(t_old - 50, "svc", "a"),
            record(t_old - 30, "svc", "b"),
            record(t_old, "svc", "c"),
        ]);
        engine().run_once(&first, &mut store, NOW).await.unwrap();

        let second = MockLogSource::new(vec![
            record(t_old - 50, "svc", "a"),
            record(t_old - 40, "svc", "late arrival"),
            record(t_old - 30, "svc", "b"),
            record(t_old, "svc", "c"),
            record(t_old + 10, "svc", "d"),
        ]);
        let report = engine().run_once(&second, &mut store, NOW).await.unwrap();

        let group = &report.groups[0];
        assert_eq!(group.case, ReconcileCase::Overlap);
        assert_eq!(group.duplicates, 3);
        assert_eq!(group.appended, 2);

        let msgs: Vec<&str> = store
            .rows("svc")
            .unwrap()
            .iter()
            .map(|row| row[1].as_str())
            .collect();
        assert_eq!(msgs, vec!["a", "b", "c", "late arrival", "d"]);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent_and_resumes_with_overlap() {
        let source = MockLogSource::new(vec![
            record((NOW - 200) * SEC, "api", "a"),
            record((NOW - 100) * SEC + 10, "api", "b"),
            record((NOW - 150) * SEC, "web", "c"),
        ]);
        let mut store = MemoryStore::new();

        let first = engine().run_once(&source, &mut store, NOW).await.unwrap();
        assert_eq!(first.total_appended(), 3);
        assert_eq!(first.last_processed, None);

        let second = engine().run_once(&source, &mut store, NOW + 60).await.unwrap();
        assert_eq!(second.total_appended(), 0);
        assert_eq!(second.last_processed, Some(NOW - 100));

        let queries = source.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].start_nanos, (NOW - 3600) * SEC);
        assert_eq!(queries[1].start_nanos, (NOW - 100 - 300) * SEC);
        assert_eq!(queries[1].query, r#"{job="app"} | json"#);

        assert_eq!(store.rows("api").unwrap().len(), 2);
        assert_eq!(store.rows("web").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_widening_appends_new_columns_last() {
        let mut store = MemoryStore::new();
        engine()
            .run_once(
                &MockLogSource::new(vec![record((NOW - 60) * SEC, "svc", "a")]),
                &mut store,
                NOW,
            )
            .await
            .unwrap();
        assert_eq!(store.columns("svc").unwrap(), ["timestamp", "msg", "service"]);

        let wider = record((NOW - 10) * SEC, "svc", "b").with_field("region", "eu");
        let report = engine()
            .run_once(&MockLogSource::new(vec![wider]), &mut store, NOW)
            .await
            .unwrap();

        assert_eq!(report.groups[0].columns_added, vec!["region"]);
        assert_eq!(
            store.columns("svc").unwrap(),
            ["timestamp", "msg", "service", "region"]
        );
        let rows = store.rows("svc").unwrap();
        assert_eq!(rows[0].len(), 3, "existing rows are not rewritten");
        assert_eq!(rows[1][1..], ["b", "svc", "eu"]);
    }

    #[tokio::test]
    async fn test_group_failure_is_isolated() {
        let source = MockLogSource::new(vec![
            record((NOW - 60) * SEC, "api", "a"),
            record((NOW - 50) * SEC, "web", "b"),
        ]);
        let mut store = FailingStore {
            inner: MemoryStore::new(),
            failing_group: Some("web".to_string()),
        };

        let report = engine().run_once(&source, &mut store, NOW).await.unwrap();
        assert!(report.has_failures());
        assert_eq!(report.failures[0].group, "web");
        assert_eq!(report.groups.len(), 1);
        assert_eq!(store.inner.rows("api").unwrap().len(), 1);
        assert!(store.inner.rows("web").is_none());

        // The failed group catches up on the next run
        store.failing_group = None;
        let report = engine().run_once(&source, &mut store, NOW).await.unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.total_appended(), 1);
        assert_eq!(report.total_duplicates(), 1);
        assert_eq!(store.inner.rows("web").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_jsonl_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockLogSource::new(vec![
            record((NOW - 90) * SEC, "api", "a"),
            record((NOW - 80) * SEC, "api", "b"),
        ]);

        {
            let mut store = JsonlStore::new("jsonl", dir.path()).unwrap();
            let report = engine().run_once(&source, &mut store, NOW).await.unwrap();
            assert_eq!(report.total_appended(), 2);
        }

        let mut reopened = JsonlStore::new("jsonl", dir.path()).unwrap();
        let report = engine().run_once(&source, &mut reopened, NOW + 30).await.unwrap();
        assert_eq!(report.last_processed, Some(NOW - 80));
        assert_eq!(report.total_appended(), 0);
        assert_eq!(reopened.row_count("api").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_then_real_run() {
        let source = MockLogSource::new(vec![record((NOW - 60) * SEC, "api", "a")]);
        let mut store = MemoryStore::new();

        let dry = SyncEngine::new(SyncSettings {
            dry_run: true,
            ..SyncSettings::default()
        });
        let report = dry.run_once(&source, &mut store, NOW).await.unwrap();
        assert_eq!(report.total_appended(), 1);
        assert!(store.list_groups().await.unwrap().is_empty());

        let report = engine().run_once(&source, &mut store, NOW).await.unwrap();
        assert_eq!(report.total_appended(), 1);
        assert_eq!(store.rows("api").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let mut store = MemoryStore::new();
        let result = engine()
            .run_once(&MockLogSource::failing(503), &mut store, NOW)
            .await;
        assert!(matches!(result, Err(sync_engine::SyncError::Fetch(_))));
        assert!(store.list_groups().await.unwrap().is_empty());
    }
}
