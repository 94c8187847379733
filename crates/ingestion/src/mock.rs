//! Mock log source
//!
//! Serves a fixed set of records, for tests and offline runs.

use std::sync::Mutex;

use contracts::{ContractError, LogQuery, LogSource, Record};
use tracing::debug;

/// In-memory log source
///
/// Honors the query start and limit the way a real store would: only records
/// at or after `start_nanos` are returned, oldest first, capped at `limit`.
#[derive(Debug, Default)]
pub struct MockLogSource {
    records: Vec<Record>,
    failure: Option<u16>,
    queries: Mutex<Vec<LogQuery>>,
}

impl MockLogSource {
    /// Create a source serving `records`
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Create a source whose every fetch fails with the given HTTP status
    pub fn failing(status: u16) -> Self {
        Self {
            failure: Some(status),
            ..Default::default()
        }
    }

    /// Add records served by later fetches
    pub fn push(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<LogQuery> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl LogSource for MockLogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, query: &LogQuery) -> Result<Vec<Record>, ContractError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(status) = self.failure {
            return Err(ContractError::source_fetch(
                format!("mock source configured to fail with HTTP {status}"),
                Some(status),
            ));
        }

        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.timestamp >= query.start_nanos)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        records.truncate(query.limit);

        debug!(records = records.len(), start = query.start_nanos, "mock fetch");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LogDirection;

    fn query(start_nanos: i64, limit: usize) -> LogQuery {
        LogQuery {
            query: String::new(),
            start_nanos,
            limit,
            direction: LogDirection::Forward,
        }
    }

    #[tokio::test]
    async fn test_filters_by_start_and_limit() {
        let source = MockLogSource::new(
            [30, 10, 20, 40]
                .into_iter()
                .map(|ts| Record::new(ts).with_field("service", "svc"))
                .collect(),
        );

        let records = source.fetch(&query(20, 2)).await.unwrap();
        let ts: Vec<_> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![20, 30]);
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockLogSource::failing(502);
        let err = source.fetch(&query(0, 10)).await.unwrap_err();
        assert!(matches!(err, ContractError::SourceFetch { status: Some(502), .. }));
    }
}
