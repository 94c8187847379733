//! Configuration validation
//!
//! Rules:
//! - Field-level constraints declared on the config structs (`validator` derive)
//! - endpoint uses http or https
//! - credentials are non-empty
//! - jsonl destination has a path
//! - timestamp and grouping fields differ

use contracts::{AuthConfig, ContractError, DestinationConfig, SyncerConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a parsed configuration
///
/// Returns the first violation found, or Ok(()).
pub fn validate(config: &SyncerConfig) -> Result<(), ContractError> {
    validate_declared(config)?;
    validate_endpoint_scheme(config)?;
    validate_auth(config)?;
    validate_destination(config)?;
    validate_sync_fields(config)?;
    Ok(())
}

/// Run the derive-declared constraints
fn validate_declared(config: &SyncerConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Dotted path and message of the first violation, in field-name order
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn validate_endpoint_scheme(config: &SyncerConfig) -> Result<(), ContractError> {
    let endpoint = config.source.endpoint.to_lowercase();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "source.endpoint",
            format!("unsupported scheme in '{}'", config.source.endpoint),
        ));
    }
    Ok(())
}

fn validate_auth(config: &SyncerConfig) -> Result<(), ContractError> {
    match &config.source.auth {
        Some(AuthConfig::Basic { username, .. }) if username.is_empty() => Err(
            ContractError::config_validation("source.auth.username", "username cannot be empty"),
        ),
        Some(AuthConfig::Bearer { token }) if token.is_empty() => Err(
            ContractError::config_validation("source.auth.token", "token cannot be empty"),
        ),
        _ => Ok(()),
    }
}

fn validate_destination(config: &SyncerConfig) -> Result<(), ContractError> {
    if let DestinationConfig::Jsonl { path } = &config.destination {
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "destination.path",
                "jsonl destination requires a path",
            ));
        }
    }
    Ok(())
}

fn validate_sync_fields(config: &SyncerConfig) -> Result<(), ContractError> {
    let sync = &config.sync;
    if sync.timestamp_field == sync.group_field {
        return Err(ContractError::config_validation(
            "sync.group_field",
            format!(
                "group_field must differ from timestamp_field ('{}')",
                sync.timestamp_field
            ),
        ));
    }
    Ok(())
}
