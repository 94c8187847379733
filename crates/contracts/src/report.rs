//! RunReport - Sync Engine output
//!
//! Summary of one sync invocation, per group and overall.

use serde::{Deserialize, Serialize};

/// Reconciliation case chosen for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileCase {
    /// Group empty, or every incoming record is newer than the stored tail
    DisjointAhead,
    /// Oldest incoming record shares the stored tail's last timestamp
    BoundaryEqual,
    /// Incoming records reach back before the stored tail's last timestamp
    Overlap,
}

impl ReconcileCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileCase::DisjointAhead => "disjoint_ahead",
            ReconcileCase::BoundaryEqual => "boundary_equal",
            ReconcileCase::Overlap => "overlap",
        }
    }
}

/// Per-group result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    /// Group name
    pub group: String,
    /// Records routed to this group
    pub incoming: usize,
    /// Rows appended (or that would be appended in a dry run)
    pub appended: usize,
    /// Records discarded as already stored
    pub duplicates: usize,
    /// Existing rows read back for comparison
    pub rows_compared: usize,
    /// Case selected by the reconciler
    pub case: ReconcileCase,
    /// Columns added to the header in this run
    pub columns_added: Vec<String>,
}

/// Group that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFailure {
    pub group: String,
    pub error: String,
}

/// Result of one sync invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Window the fetch was planned for
    pub window: Option<TimeRange>,
    /// Last processed time discovered in the destination (Unix seconds)
    pub last_processed: Option<i64>,
    /// Records returned by the source
    pub fetched: usize,
    /// Records rejected by the grouping-key filter
    pub rejected: usize,
    /// Records routed to ignored groups
    pub ignored: usize,
    /// Successful groups
    pub groups: Vec<GroupReport>,
    /// Failed groups
    pub failures: Vec<GroupFailure>,
    /// Whether writes were suppressed
    pub dry_run: bool,
}

impl RunReport {
    /// Total rows appended across groups
    pub fn total_appended(&self) -> usize {
        self.groups.iter().map(|g| g.appended).sum()
    }

    /// Total duplicates discarded across groups
    pub fn total_duplicates(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates).sum()
    }

    /// Whether any group failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Planned fetch window (Unix seconds)
///
/// `end_seconds` is informational; the fetch itself is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_seconds: i64,
    pub end_seconds: i64,
}

impl TimeRange {
    /// Inclusive start in nanoseconds, as sent to the source
    pub fn start_nanos(&self) -> i64 {
        self.start_seconds.saturating_mul(1_000_000_000)
    }
}
