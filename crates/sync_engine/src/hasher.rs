//! Content hashing for duplicate detection.
//!
//! A record and the row it was written as must hash identically, so both
//! sides go through the same canonical text per column:
//! - timestamp column: decimal UTC nanoseconds
//! - missing / null: empty string
//! - structured: JSON with keys sorted at every level
//! - everything else: its plain text
//!
//! Cells are joined with U+001F and hashed with SHA-256.

use std::fmt;

use contracts::{FieldValue, Offset, Record};
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};

use crate::timestamp::{self, TimestampError};

/// Separator between canonical cells
pub const FIELD_DELIMITER: char = '\u{1f}';

/// Canonical text for a structured value that failed to serialize
pub const UNSERIALIZABLE_SENTINEL: &str = "<unserializable>";

/// Hex-encoded SHA-256 digest of a canonical row
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.0[..12.min(self.0.len())])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored row that cannot take part in comparison
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    #[error("stored timestamp cell is unreadable: {0}")]
    Timestamp(#[from] TimestampError),
}

/// Canonicalizes records and stored rows for one destination group.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    timestamp_column: String,
    offset: Offset,
}

impl ContentHasher {
    pub fn new(timestamp_column: impl Into<String>, offset: Offset) -> Self {
        Self {
            timestamp_column: timestamp_column.into(),
            offset,
        }
    }

    /// Digest of an in-memory record over `columns`
    pub fn hash_record(&self, record: &Record, columns: &[String]) -> ContentDigest {
        digest_cells(columns.iter().map(|column| {
            if *column == self.timestamp_column {
                record.timestamp.to_string()
            } else {
                record.get(column).map(canonical_text).unwrap_or_default()
            }
        }))
    }

    /// Digest of a row read back from the destination.
    ///
    /// Cells are positional against `columns`; cells past the end of a row
    /// written before the header widened count as empty.
    pub fn hash_stored_row(
        &self,
        cells: &[String],
        columns: &[String],
    ) -> Result<ContentDigest, HashError> {
        let mut canonical = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            if *column == self.timestamp_column {
                canonical.push(timestamp::decode(cell, &self.offset)?.to_string());
            } else {
                canonical.push(cell.to_string());
            }
        }
        Ok(digest_cells(canonical))
    }

    /// Cells to persist for a record, aligned to `columns`
    pub fn format_row(&self, record: &Record, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| {
                if *column == self.timestamp_column {
                    timestamp::encode_or_placeholder(record.timestamp, &self.offset)
                } else {
                    record.get(column).map(canonical_text).unwrap_or_default()
                }
            })
            .collect()
    }
}

/// Canonical text of a single field value
pub fn canonical_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Missing => String::new(),
        FieldValue::String(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Structured(v) => serde_json::to_string(&sorted_keys(v)).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "structured field could not be serialized");
            UNSERIALIZABLE_SENTINEL.to_string()
        }),
    }
}

fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), sorted_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

fn digest_cells<I, S>(cells: I) -> ContentDigest
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (idx, cell) in cells.into_iter().enumerate() {
        if idx > 0 {
            let mut buf = [0u8; 4];
            hasher.update(FIELD_DELIMITER.encode_utf8(&mut buf).as_bytes());
        }
        hasher.update(cell.as_ref().as_bytes());
    }
    ContentDigest(format!("{:x}", hasher.finalize()))
}
