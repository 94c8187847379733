//! LogSource trait - remote log store abstraction
//!
//! Decouples the sync engine from the transport, auth and query protocol of
//! the concrete log store.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Record};

/// Result ordering requested from the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDirection {
    /// Oldest first
    #[default]
    Forward,
    /// Newest first
    Backward,
}

impl LogDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogDirection::Forward => "forward",
            LogDirection::Backward => "backward",
        }
    }
}

/// One fetch request.
///
/// Only the start is bounded; the fetch is open-ended going forward so records
/// landing between window planning and fetch execution are not missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Base query text
    pub query: String,
    /// Inclusive start (UTC epoch nanoseconds)
    pub start_nanos: i64,
    /// Result cap
    pub limit: usize,
    /// Ordering
    pub direction: LogDirection,
}

/// Remote log source.
///
/// Implementations return every parseable record at or after the query start.
/// Payloads that fail to parse are dropped by the implementation; transport or
/// non-success responses are reported as [`ContractError::SourceFetch`].
#[trait_variant::make(LogSource: Send)]
pub trait LocalLogSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Fetch records for the query
    ///
    /// # Errors
    /// Returns fetch error (fatal for the run)
    async fn fetch(&self, query: &LogQuery) -> Result<Vec<Record>, ContractError>;
}
