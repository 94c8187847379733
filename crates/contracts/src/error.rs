//! Layered error definitions
//!
//! Categorized by source: config / source / record / timestamp / destination

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Log Source Errors =====
    /// Fetch from the remote log store failed (non-success status or transport)
    #[error("log source fetch error: {message}")]
    SourceFetch {
        message: String,
        status: Option<u16>,
    },

    /// A single fetched payload could not be turned into a record
    #[error("record parse error: {message}")]
    RecordParse { message: String },

    // ===== Timestamp Errors =====
    /// Timestamp could not be decoded or encoded
    #[error("timestamp error for '{value}': {message}")]
    Timestamp { value: String, message: String },

    // ===== Destination Errors =====
    /// Reading header or rows from a destination group failed
    #[error("destination read error for group '{group}': {message}")]
    DestinationRead { group: String, message: String },

    /// Writing header or rows to a destination group failed
    #[error("destination write error for group '{group}': {message}")]
    DestinationWrite { group: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source fetch error
    pub fn source_fetch(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::SourceFetch {
            message: message.into(),
            status,
        }
    }

    /// Create record parse error
    pub fn record_parse(message: impl Into<String>) -> Self {
        Self::RecordParse {
            message: message.into(),
        }
    }

    /// Create timestamp error
    pub fn timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timestamp {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create destination read error
    pub fn destination_read(group: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationRead {
            group: group.into(),
            message: message.into(),
        }
    }

    /// Create destination write error
    pub fn destination_write(group: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationWrite {
            group: group.into(),
            message: message.into(),
        }
    }

    /// Whether the error must abort the whole run rather than a single group
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::SourceFetch { .. }
        )
    }
}
