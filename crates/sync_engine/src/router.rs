//! Record routing by grouping key.

use std::collections::BTreeMap;

use contracts::{GroupName, Record, SyncSettings};
use tracing::{debug, trace};

/// Records split per destination group
#[derive(Debug, Default)]
pub struct RoutedRecords {
    /// Records per group, in a deterministic (sorted) group order
    pub groups: BTreeMap<GroupName, Vec<Record>>,
    /// Records without a usable grouping key
    pub rejected: usize,
    /// Records routed to ignored groups
    pub ignored: usize,
}

impl RoutedRecords {
    /// Total records kept for processing
    pub fn routed(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Split records by the value of `settings.group_field`.
///
/// The key must be a string matching the group-name pattern; anything else is
/// rejected. Groups under the ignored prefix are dropped. Records keep their
/// arrival order inside each group.
pub fn route(records: Vec<Record>, settings: &SyncSettings) -> RoutedRecords {
    let mut routed = RoutedRecords::default();

    for record in records {
        let Some(group) = record
            .get_str(&settings.group_field)
            .and_then(GroupName::parse)
        else {
            trace!(timestamp = record.timestamp, "record rejected: invalid grouping key");
            routed.rejected += 1;
            continue;
        };

        if settings.is_ignored_group(&group) {
            routed.ignored += 1;
            continue;
        }

        routed.groups.entry(group).or_default().push(record);
    }

    debug!(
        groups = routed.groups.len(),
        routed = routed.routed(),
        rejected = routed.rejected,
        ignored = routed.ignored,
        "records routed"
    );
    routed
}
