//! Destination error types

use thiserror::Error;

/// Store-level errors, mapped to [`contracts::ContractError`] at the trait edge
#[derive(Debug, Error)]
pub enum DestinationError {
    /// Group name is not usable as a file stem
    #[error("invalid group name '{0}'")]
    InvalidGroup(String),

    /// Rows appended to a group that has no header yet
    #[error("group '{0}' has no header")]
    MissingHeader(String),

    /// Header line could not be decoded
    #[error("corrupt header in group '{group}': {source}")]
    CorruptHeader {
        group: String,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding a line failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DestinationError {
    /// Convert into a read-side contract error for `group`
    pub fn into_read(self, group: &str) -> contracts::ContractError {
        contracts::ContractError::destination_read(group, self.to_string())
    }

    /// Convert into a write-side contract error for `group`
    pub fn into_write(self, group: &str) -> contracts::ContractError {
        contracts::ContractError::destination_write(group, self.to_string())
    }
}
