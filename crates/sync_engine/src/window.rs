//! Fetch window planning.

use contracts::{TimeRange, WindowConfig};

/// Compute the next fetch window.
///
/// Starts at `now - lookback` when nothing has been processed yet or the last
/// processed time is at or beyond the lookback horizon, otherwise at
/// `last_processed - overlap`. Only the start is used by the fetch; `end` is
/// recorded for reporting.
pub fn plan(last_processed: Option<i64>, now: i64, config: &WindowConfig) -> TimeRange {
    let lookback = i64::try_from(config.lookback_seconds).unwrap_or(i64::MAX);
    let overlap = i64::try_from(config.overlap_seconds).unwrap_or(i64::MAX);
    let horizon = now.saturating_sub(lookback);

    let start_seconds = match last_processed {
        Some(last) if last > horizon => last.saturating_sub(overlap),
        _ => horizon,
    };

    TimeRange {
        start_seconds,
        end_seconds: now,
    }
}
