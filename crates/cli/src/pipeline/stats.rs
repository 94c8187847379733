//! Pipeline statistics.

use std::time::Duration;

use contracts::RunReport;
use observability::RunSummary;
use serde::Serialize;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Engine report for the invocation
    pub report: RunReport,

    /// Total duration of the run
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
}

impl PipelineStats {
    /// Appended rows per second of wall time
    pub fn rows_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.report.total_appended() as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        print!("{}", RunSummary::from(&self.report));
        println!("Duration: {:.2}s", self.duration.as_secs_f64());

        if !self.report.groups.is_empty() {
            println!("\nGroups");
            println!(
                "   {:<24} {:>8} {:>8} {:>10}  {}",
                "name", "incoming", "appended", "duplicates", "case"
            );
            for group in &self.report.groups {
                println!(
                    "   {:<24} {:>8} {:>8} {:>10}  {}",
                    group.group,
                    group.incoming,
                    group.appended,
                    group.duplicates,
                    group.case.as_str()
                );
                if !group.columns_added.is_empty() {
                    println!("   {:<24} + {}", "", group.columns_added.join(", "));
                }
            }
        }

        for failure in &self.report.failures {
            println!("   ! {}: {}", failure.group, failure.error);
        }

        println!();
    }
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
