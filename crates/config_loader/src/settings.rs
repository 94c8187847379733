//! Conversion from the raw `[sync]` section to engine settings

use contracts::{Offset, SyncSection, SyncSettings};
use tracing::warn;

/// Build validated engine settings from the raw section.
///
/// An unparsable timezone is not fatal: it is reported and `+00:00` is used.
pub fn sync_settings(section: &SyncSection) -> SyncSettings {
    let offset = match Offset::parse(&section.timezone) {
        Ok(offset) => offset,
        Err(e) => {
            warn!(
                timezone = %section.timezone,
                error = %e,
                "invalid timezone offset, falling back to +00:00"
            );
            Offset::utc()
        }
    };

    SyncSettings {
        offset,
        timestamp_field: section.timestamp_field.clone(),
        group_field: section.group_field.clone(),
        ignored_group_prefix: section.ignored_group_prefix.clone(),
        window: section.window(),
        tail_window_rows: section.tail_window_rows,
        dry_run: false,
    }
}
