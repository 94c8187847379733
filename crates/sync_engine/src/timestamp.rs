//! Nanosecond timestamp codec.
//!
//! Converts between UTC epoch nanoseconds and `YYYY-MM-DDTHH:mm:ss.fffffffff±HH:MM`.
//! chrono only carries the calendar part; the nine fractional digits are
//! handled as plain integers so no precision is lost.

use chrono::{DateTime, NaiveDateTime};
use contracts::{ContractError, Offset};
use thiserror::Error;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Length of `YYYY-MM-DDTHH:mm:ss.fffffffff`
pub const DATETIME_PREFIX_LEN: usize = 29;

/// Length of `YYYY-MM-DDTHH:mm:ss`
const CALENDAR_LEN: usize = 19;

const CALENDAR_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Cell text written when a timestamp cannot be formatted
pub const TIMESTAMP_ERROR_PLACEHOLDER: &str = "#TIMESTAMP_ERROR";

/// Timestamp codec failure. Callers skip the value, never abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("malformed timestamp '{value}': {reason}")]
    Malformed { value: String, reason: String },

    #[error("invalid offset in '{value}': {reason}")]
    Offset { value: String, reason: String },

    #[error("timestamp {nanos} is out of the representable range")]
    OutOfRange { nanos: i64 },
}

impl From<TimestampError> for ContractError {
    fn from(err: TimestampError) -> Self {
        let value = match &err {
            TimestampError::Malformed { value, .. } | TimestampError::Offset { value, .. } => {
                value.clone()
            }
            TimestampError::OutOfRange { nanos } => nanos.to_string(),
        };
        ContractError::timestamp(value, err.to_string())
    }
}

/// Decode an ISO-8601 string into UTC epoch nanoseconds.
///
/// The offset embedded in the string wins; `fallback` is used only when the
/// string stops after the nine fractional digits. The calendar digits are read
/// literally as UTC, then the offset is subtracted.
pub fn decode(iso: &str, fallback: &Offset) -> Result<i64, TimestampError> {
    let malformed = |reason: &str| TimestampError::Malformed {
        value: iso.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, suffix) = match (iso.get(..DATETIME_PREFIX_LEN), iso.get(DATETIME_PREFIX_LEN..)) {
        (Some(prefix), Some(suffix)) => (prefix, suffix),
        _ => return Err(malformed("expected YYYY-MM-DDTHH:mm:ss.fffffffff")),
    };

    if !prefix.is_ascii() {
        return Err(malformed("non-ascii characters"));
    }

    let (calendar, fraction) = prefix.split_at(CALENDAR_LEN);
    let digits = fraction
        .strip_prefix('.')
        .filter(|d| d.len() == 9 && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| malformed("expected exactly 9 fractional digits"))?;
    let fraction_nanos: i64 = digits
        .parse()
        .map_err(|_| malformed("fractional digits"))?;

    let naive = NaiveDateTime::parse_from_str(calendar, CALENDAR_FORMAT)
        .map_err(|e| malformed(&e.to_string()))?;
    let calendar_millis = naive.and_utc().timestamp_millis();

    let offset_nanos = match suffix {
        "" => fallback.nanos(),
        "Z" => 0,
        text => Offset::parse(text)
            .map_err(|e| TimestampError::Offset {
                value: iso.to_string(),
                reason: e.reason.to_string(),
            })?
            .nanos(),
    };

    calendar_millis
        .checked_mul(NANOS_PER_MILLI)
        .and_then(|pseudo| pseudo.checked_add(fraction_nanos))
        .and_then(|pseudo| pseudo.checked_sub(offset_nanos))
        .ok_or_else(|| malformed("out of range"))
}

/// Encode UTC epoch nanoseconds as an ISO-8601 string in `offset`.
pub fn encode(utc_nanos: i64, offset: &Offset) -> Result<String, TimestampError> {
    let local = utc_nanos
        .checked_add(offset.nanos())
        .ok_or(TimestampError::OutOfRange { nanos: utc_nanos })?;

    let seconds = local.div_euclid(NANOS_PER_SECOND);
    let remainder = local.rem_euclid(NANOS_PER_SECOND);

    let calendar = DateTime::from_timestamp(seconds, 0)
        .ok_or(TimestampError::OutOfRange { nanos: utc_nanos })?
        .format(CALENDAR_FORMAT)
        .to_string();

    Ok(format!("{calendar}.{remainder:09}{offset}"))
}

/// Encode, writing [`TIMESTAMP_ERROR_PLACEHOLDER`] on failure.
pub fn encode_or_placeholder(utc_nanos: i64, offset: &Offset) -> String {
    encode(utc_nanos, offset).unwrap_or_else(|err| {
        tracing::error!(nanos = utc_nanos, error = %err, "failed to format timestamp");
        TIMESTAMP_ERROR_PLACEHOLDER.to_string()
    })
}

/// Whole Unix seconds (floor) of a nanosecond timestamp
#[inline]
pub fn nanos_to_seconds(nanos: i64) -> i64 {
    nanos.div_euclid(NANOS_PER_SECOND)
}
