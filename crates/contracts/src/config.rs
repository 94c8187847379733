//! SyncerConfig - Config Loader output
//!
//! Describes one sync deployment: where logs come from, where rows go and how
//! the incremental window and reconciliation behave.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{
    WindowConfig, DEFAULT_GROUP_FIELD, DEFAULT_IGNORED_GROUP_PREFIX, DEFAULT_TIMESTAMP_FIELD,
};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncerConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Remote log store
    #[validate(nested)]
    pub source: SourceConfig,

    /// Tabular destination
    pub destination: DestinationConfig,

    /// Incremental sync behavior
    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncSection,
}

/// Remote log store settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Base URL of the log store (e.g. `http://loki:3100`)
    #[validate(url(message = "endpoint must be an absolute URL"))]
    pub endpoint: String,

    /// Base query text (e.g. `{job="app"} | json`)
    #[validate(length(min = 1, message = "query cannot be empty"))]
    pub query: String,

    /// Maximum number of entries per fetch
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, message = "limit must be > 0"))]
    pub limit: usize,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, message = "timeout_secs must be > 0"))]
    pub timeout_secs: u64,

    /// Optional credentials
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_limit() -> usize {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Source credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// HTTP Basic
    Basic { username: String, password: String },
    /// HTTP Bearer token
    Bearer { token: String },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthConfig::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Destination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Directory of `<group>.jsonl` files
    Jsonl {
        /// Base directory
        path: PathBuf,
    },
    /// Process-local store, contents are lost on exit
    Memory,
}

impl DestinationConfig {
    /// Short type label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            DestinationConfig::Jsonl { .. } => "jsonl",
            DestinationConfig::Memory => "memory",
        }
    }
}

/// Raw sync settings as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncSection {
    /// Fixed offset `±HH:MM`; an invalid value falls back to `+00:00`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Re-fetch margin (seconds)
    #[serde(default = "default_overlap_seconds")]
    pub overlap_seconds: u64,

    /// Initial / maximum lookback (seconds)
    #[serde(default = "default_lookback_seconds")]
    #[validate(range(min = 1, message = "lookback_seconds must be > 0"))]
    pub lookback_seconds: u64,

    /// Trailing rows read back for boundary dedup
    #[serde(default = "default_tail_window_rows")]
    #[validate(range(min = 1, message = "tail_window_rows must be > 0"))]
    pub tail_window_rows: usize,

    /// Reserved timestamp column name
    #[serde(default = "default_timestamp_field")]
    #[validate(length(min = 1, message = "timestamp_field cannot be empty"))]
    pub timestamp_field: String,

    /// Grouping key field name
    #[serde(default = "default_group_field")]
    #[validate(length(min = 1, message = "group_field cannot be empty"))]
    pub group_field: String,

    /// Prefix marking internal groups that are never synced
    #[serde(default = "default_ignored_group_prefix")]
    pub ignored_group_prefix: Option<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            overlap_seconds: default_overlap_seconds(),
            lookback_seconds: default_lookback_seconds(),
            tail_window_rows: default_tail_window_rows(),
            timestamp_field: default_timestamp_field(),
            group_field: default_group_field(),
            ignored_group_prefix: default_ignored_group_prefix(),
        }
    }
}

impl SyncSection {
    /// Window part of the section
    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            overlap_seconds: self.overlap_seconds,
            lookback_seconds: self.lookback_seconds,
        }
    }
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

fn default_overlap_seconds() -> u64 {
    WindowConfig::default().overlap_seconds
}

fn default_lookback_seconds() -> u64 {
    WindowConfig::default().lookback_seconds
}

fn default_tail_window_rows() -> usize {
    100
}

fn default_timestamp_field() -> String {
    DEFAULT_TIMESTAMP_FIELD.to_string()
}

fn default_group_field() -> String {
    DEFAULT_GROUP_FIELD.to_string()
}

fn default_ignored_group_prefix() -> Option<String> {
    Some(DEFAULT_IGNORED_GROUP_PREFIX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SyncerConfig {
        SyncerConfig {
            version: ConfigVersion::V1,
            source: SourceConfig {
                endpoint: "http://localhost:3100".into(),
                query: "{job=\"app\"}".into(),
                limit: 5000,
                timeout_secs: 30,
                auth: None,
            },
            destination: DestinationConfig::Memory,
            sync: SyncSection::default(),
        }
    }

    #[test]
    fn derive_validation_accepts_sample() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn derive_validation_rejects_bad_source() {
        let mut config = sample_config();
        config.source.endpoint = "not a url".into();
        config.source.limit = 0;
        let errors = config.validate().unwrap_err();
        let rendered = errors.to_string();
        assert!(rendered.contains("endpoint"), "{rendered}");
        assert!(rendered.contains("limit"), "{rendered}");
    }

    #[test]
    fn auth_debug_redacts_secrets() {
        let basic = AuthConfig::Basic {
            username: "grafana".into(),
            password: "hunter2".into(),
        };
        let bearer = AuthConfig::Bearer {
            token: "abc.def".into(),
        };
        assert!(!format!("{basic:?}").contains("hunter2"));
        assert!(format!("{basic:?}").contains("grafana"));
        assert!(!format!("{bearer:?}").contains("abc.def"));
    }

    #[test]
    fn section_window_mirrors_fields() {
        let section = SyncSection {
            overlap_seconds: 0,
            lookback_seconds: 120,
            ..SyncSection::default()
        };
        assert_eq!(
            section.window(),
            WindowConfig {
                overlap_seconds: 0,
                lookback_seconds: 120
            }
        );
    }
}
