//! Sync engine error types

use contracts::ContractError;
use thiserror::Error;

/// Errors that end a sync run, or a single group within it
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source fetch failed; nothing was written
    #[error("fetch failed: {0}")]
    Fetch(#[source] ContractError),

    /// Destination could not be inspected before processing
    #[error("destination unavailable: {0}")]
    Destination(#[source] ContractError),

    /// Processing of one group failed; other groups are unaffected
    #[error("group '{group}' failed: {source}")]
    GroupProcessing {
        group: String,
        #[source]
        source: ContractError,
    },
}

impl SyncError {
    pub fn group(group: impl Into<String>, source: ContractError) -> Self {
        Self::GroupProcessing {
            group: group.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_error_display() {
        let err = SyncError::group("svc", ContractError::destination_write("svc", "disk full"));
        assert_eq!(
            err.to_string(),
            "group 'svc' failed: destination write error for group 'svc': disk full"
        );
    }
}
