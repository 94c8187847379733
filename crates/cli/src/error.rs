//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed validation
    #[error("Configuration validation failed")]
    InvalidConfig,

    /// Some groups could not be synced
    #[error("{failed} of {total} groups failed to sync: {groups}")]
    GroupFailures {
        failed: usize,
        total: usize,
        groups: String,
    },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn group_failures(report: &contracts::RunReport) -> Self {
        let groups: Vec<&str> = report.failures.iter().map(|f| f.group.as_str()).collect();
        Self::GroupFailures {
            failed: report.failures.len(),
            total: report.failures.len() + report.groups.len(),
            groups: groups.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GroupFailure, RunReport};

    #[test]
    fn test_group_failures_message() {
        let report = RunReport {
            failures: vec![
                GroupFailure {
                    group: "api".into(),
                    error: "quota".into(),
                },
                GroupFailure {
                    group: "web".into(),
                    error: "quota".into(),
                },
            ],
            ..RunReport::default()
        };
        assert_eq!(
            CliError::group_failures(&report).to_string(),
            "2 of 2 groups failed to sync: api, web"
        );
    }
}
