//! Fixed UTC offset (`±HH:MM`) used to read and write stored timestamps.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]\d{2}:\d{2}$").expect("offset pattern is a valid regex"));

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Offset string rejected by [`Offset::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid UTC offset '{input}': {reason}")]
pub struct OffsetParseError {
    pub input: String,
    pub reason: &'static str,
}

/// A validated fixed UTC offset.
///
/// Keeps the literal text so encoded timestamps carry exactly what was
/// configured, and the signed offset in nanoseconds for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Offset {
    text: String,
    nanos: i64,
}

impl Offset {
    /// `+00:00`
    pub fn utc() -> Self {
        Self {
            text: "+00:00".to_string(),
            nanos: 0,
        }
    }

    /// Parse a `±HH:MM` offset.
    pub fn parse(input: &str) -> Result<Self, OffsetParseError> {
        let error = |reason| OffsetParseError {
            input: input.to_string(),
            reason,
        };

        if !OFFSET_PATTERN.is_match(input) {
            return Err(error("expected ±HH:MM"));
        }

        let sign = if input.starts_with('-') { -1 } else { 1 };
        let hours: i64 = input[1..3].parse().map_err(|_| error("bad hours"))?;
        let minutes: i64 = input[4..6].parse().map_err(|_| error("bad minutes"))?;
        if hours > 23 {
            return Err(error("hours out of range"));
        }
        if minutes > 59 {
            return Err(error("minutes out of range"));
        }

        Ok(Self {
            text: input.to_string(),
            nanos: sign * (hours * 3600 + minutes * 60) * NANOS_PER_SECOND,
        })
    }

    /// Literal offset text, e.g. `+09:00`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Signed offset in nanoseconds.
    #[inline]
    pub fn nanos(&self) -> i64 {
        self.nanos
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for Offset {
    type Err = OffsetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Offset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Offset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
