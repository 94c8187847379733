//! Sync engine settings that can be shared across crates.
//!
//! These are the validated runtime values. The raw file representation lives
//! in [`crate::SyncSection`]; the config loader converts one into the other.

use serde::{Deserialize, Serialize};

use crate::Offset;

pub const DEFAULT_TIMESTAMP_FIELD: &str = "timestamp";
pub const DEFAULT_GROUP_FIELD: &str = "service";
pub const DEFAULT_IGNORED_GROUP_PREFIX: &str = "_";

/// Sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Fixed offset used to read stored timestamps and format new ones
    pub offset: Offset,

    /// Reserved timestamp column (always the first column of every group)
    pub timestamp_field: String,

    /// Record field whose value selects the destination group
    pub group_field: String,

    /// Groups whose name starts with this prefix are never read or written
    pub ignored_group_prefix: Option<String>,

    /// Fetch window configuration
    pub window: WindowConfig,

    /// Trailing rows read back for last-timestamp discovery and boundary dedup
    pub tail_window_rows: usize,

    /// Reconcile without writing to the destination
    pub dry_run: bool,
}

impl SyncSettings {
    /// Whether a group name is reserved for internal/non-data use
    pub fn is_ignored_group(&self, group: &str) -> bool {
        self.ignored_group_prefix
            .as_deref()
            .is_some_and(|prefix| !prefix.is_empty() && group.starts_with(prefix))
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            offset: Offset::utc(),
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            group_field: DEFAULT_GROUP_FIELD.to_string(),
            ignored_group_prefix: Some(DEFAULT_IGNORED_GROUP_PREFIX.to_string()),
            window: WindowConfig::default(),
            tail_window_rows: 100,
            dry_run: false,
        }
    }
}

/// Fetch window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Re-fetch margin subtracted from the last processed time (seconds)
    pub overlap_seconds: u64,
    /// Initial / maximum lookback from now (seconds)
    pub lookback_seconds: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            overlap_seconds: 300,
            lookback_seconds: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_prefix_matching() {
        let settings = SyncSettings::default();
        assert!(settings.is_ignored_group("_meta"));
        assert!(!settings.is_ignored_group("svc"));

        let no_prefix = SyncSettings {
            ignored_group_prefix: Some(String::new()),
            ..SyncSettings::default()
        };
        assert!(!no_prefix.is_ignored_group("_meta"));

        let none = SyncSettings {
            ignored_group_prefix: None,
            ..SyncSettings::default()
        };
        assert!(!none.is_ignored_group("_meta"));
    }
}
