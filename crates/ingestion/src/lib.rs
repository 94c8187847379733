//! # Ingestion
//!
//! Log sources behind [`contracts::LogSource`].
//!
//! Responsibilities:
//! - Query a Loki-compatible HTTP API for records at or after a start time
//! - Parse each log line as a JSON object into a [`contracts::Record`]
//! - Drop unparsable lines with a warning instead of failing the fetch
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::LokiSource;
//!
//! let source = LokiSource::new("loki", &config.source, &settings.timestamp_field)?;
//! let records = source.fetch(&query).await?;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockLogSource;
//!
//! let source = MockLogSource::new(records);
//! let report = engine.run_once(&source, &mut store, now).await?;
//! ```

mod error;
mod loki;
mod mock;

// Re-exports
pub use contracts::{LogQuery, LogSource, Record};
pub use error::{IngestionError, Result};
pub use loki::{parse_query_range, LokiSource, QUERY_RANGE_PATH};
pub use mock::MockLogSource;
