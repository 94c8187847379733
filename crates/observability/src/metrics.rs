//! Sync run metrics
//!
//! Thin wrappers over the `metrics` macros so metric names live in one place,
//! plus a printable summary of a [`RunReport`].

use std::fmt;

use contracts::RunReport;
use metrics::{counter, gauge, histogram};

/// Record the outcome of one sync invocation
///
/// Called once per run after every group has been processed.
///
/// # Example
///
/// ```ignore
/// let report = engine.run_once(&source, &mut store, now).await?;
/// observability::metrics::record_run_report(&report);
/// ```
pub fn record_run_report(report: &RunReport) {
    counter!("log_syncer_runs_total").increment(1);
    record_records_fetched(report.fetched);

    if report.rejected > 0 {
        counter!("log_syncer_records_rejected_total").increment(report.rejected as u64);
    }
    if report.ignored > 0 {
        counter!("log_syncer_records_ignored_total").increment(report.ignored as u64);
    }

    for group in &report.groups {
        record_rows_appended(&group.group, group.appended);
        if group.duplicates > 0 {
            counter!("log_syncer_duplicates_dropped_total").increment(group.duplicates as u64);
        }
        counter!(
            "log_syncer_reconcile_case_total",
            "case" => group.case.as_str()
        )
        .increment(1);
    }

    for failure in &report.failures {
        record_group_failure(&failure.group);
    }

    if let Some(last) = report.last_processed {
        gauge!("log_syncer_last_processed_seconds").set(last as f64);
    }
}

/// Record fetched records
pub fn record_records_fetched(count: usize) {
    counter!("log_syncer_records_fetched_total").increment(count as u64);
}

/// Record rows appended to a group
pub fn record_rows_appended(group: &str, count: usize) {
    counter!(
        "log_syncer_rows_appended_total",
        "group" => group.to_string()
    )
    .increment(count as u64);
}

/// Record a failed group
pub fn record_group_failure(group: &str) {
    counter!(
        "log_syncer_group_failures_total",
        "group" => group.to_string()
    )
    .increment(1);
}

/// Record a payload the source could not parse
pub fn record_payload_unparsable(source: &str) {
    counter!(
        "log_syncer_payloads_unparsable_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record wall-clock duration of a run
pub fn record_run_duration(seconds: f64) {
    histogram!("log_syncer_run_duration_seconds").record(seconds);
}

/// Human-readable run summary
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub rejected: usize,
    pub ignored: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub groups: usize,
    pub failed_groups: Vec<String>,
    pub dry_run: bool,
    pub window: Option<(i64, i64)>,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            fetched: report.fetched,
            rejected: report.rejected,
            ignored: report.ignored,
            appended: report.total_appended(),
            duplicates: report.total_duplicates(),
            groups: report.groups.len(),
            failed_groups: report.failures.iter().map(|f| f.group.clone()).collect(),
            dry_run: report.dry_run,
            window: report.window.map(|w| (w.start_seconds, w.end_seconds)),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sync Run Summary ===")?;
        if let Some((start, end)) = self.window {
            writeln!(f, "Window: {start} .. {end} ({}s)", end - start)?;
        }
        writeln!(f, "Fetched records: {}", self.fetched)?;
        writeln!(
            f,
            "Rejected / ignored: {} / {}",
            self.rejected, self.ignored
        )?;
        writeln!(f, "Groups processed: {}", self.groups)?;
        let verb = if self.dry_run { "Would append" } else { "Appended" };
        writeln!(f, "{verb}: {} rows", self.appended)?;
        writeln!(f, "Duplicates dropped: {}", self.duplicates)?;

        if !self.failed_groups.is_empty() {
            writeln!(f, "Failed groups:")?;
            for group in &self.failed_groups {
                writeln!(f, "  {group}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GroupFailure, GroupReport, ReconcileCase, TimeRange};

    fn report() -> RunReport {
        RunReport {
            window: Some(TimeRange {
                start_seconds: 1_000,
                end_seconds: 4_600,
            }),
            last_processed: Some(900),
            fetched: 12,
            rejected: 1,
            ignored: 2,
            groups: vec![GroupReport {
                group: "svc".into(),
                incoming: 9,
                appended: 7,
                duplicates: 2,
                rows_compared: 4,
                case: ReconcileCase::Overlap,
                columns_added: vec![],
            }],
            failures: vec![GroupFailure {
                group: "broken".into(),
                error: "quota".into(),
            }],
            dry_run: false,
        }
    }

    #[test]
    fn test_summary_from_report() {
        let summary = RunSummary::from(&report());
        assert_eq!(summary.appended, 7);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.failed_groups, vec!["broken"]);
    }

    #[test]
    fn test_summary_display() {
        let output = format!("{}", RunSummary::from(&report()));
        assert!(output.contains("Fetched records: 12"));
        assert!(output.contains("Appended: 7 rows"));
        assert!(output.contains("(3600s)"));
        assert!(output.contains("  broken"));
    }

    #[test]
    fn test_dry_run_wording() {
        let mut report = report();
        report.dry_run = true;
        let output = RunSummary::from(&report).to_string();
        assert!(output.contains("Would append: 7 rows"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_run_report(&report());
        record_run_duration(0.5);
        record_payload_unparsable("loki");
    }
}
