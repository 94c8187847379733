//! Overlap reconciliation for one destination group.
//!
//! Decides which incoming records are already stored and returns the rest as
//! formatted rows. Reads through [`DestinationStore`] but never writes.
//!
//! With `T_new_min` the oldest incoming timestamp and `T_old_max` the newest
//! readable timestamp in the stored tail:
//! - `T_new_min > T_old_max` (or the group is empty): everything is new
//! - `T_new_min == T_old_max`: compare against the trailing window, widened
//!   backward to cover the whole same-timestamp burst
//! - otherwise: scan forward for the first stored row at or after `T_new_min`
//!   and compare against everything from there on

use std::collections::HashSet;

use contracts::{ContractError, DestinationStore, ReconcileCase, Record, SyncSettings};
use tracing::{debug, instrument, warn};

use crate::hasher::{ContentDigest, ContentHasher};
use crate::schema;
use crate::timestamp;

/// What to append to a group
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Formatted rows, in incoming order
    pub rows: Vec<Vec<String>>,
    /// Final header
    pub columns: Vec<String>,
    /// Columns the header gained
    pub columns_added: Vec<String>,
    /// Case selected
    pub case: ReconcileCase,
    /// Incoming records matched against stored rows and dropped
    pub duplicates: usize,
    /// Stored rows hashed for comparison
    pub rows_compared: usize,
    /// Stored rows skipped because their timestamp could not be read
    pub unreadable_rows: usize,
}

impl ReconcileOutcome {
    /// Whether the header must be written before appending
    pub fn header_changed(&self) -> bool {
        !self.columns_added.is_empty()
    }
}

/// Reconcile `records` against the stored content of `group`.
#[instrument(
    level = "debug",
    name = "reconcile_group",
    skip(store, records, settings),
    fields(group = %group, incoming = records.len())
)]
pub async fn reconcile<S: DestinationStore>(
    store: &S,
    group: &str,
    records: &[Record],
    settings: &SyncSettings,
) -> Result<ReconcileOutcome, ContractError> {
    let hasher = ContentHasher::new(settings.timestamp_field.as_str(), settings.offset.clone());

    let header = store.header(group).await?;
    let merged = schema::merge(
        header.as_deref(),
        records.iter().flat_map(Record::field_names),
        &settings.timestamp_field,
    );

    let row_count = match header {
        Some(_) => store.row_count(group).await?,
        None => 0,
    };

    let Some(new_min) = records.iter().map(|r| r.timestamp).min() else {
        return Ok(ReconcileOutcome {
            rows: Vec::new(),
            columns: merged.columns,
            columns_added: merged.added,
            case: ReconcileCase::DisjointAhead,
            duplicates: 0,
            rows_compared: 0,
            unreadable_rows: 0,
        });
    };

    if row_count == 0 {
        debug!("group has no stored rows");
        return Ok(append_all(&hasher, records, merged));
    }

    let ts_index = header
        .as_deref()
        .and_then(|cols| cols.iter().position(|c| *c == settings.timestamp_field));

    let tail_start = row_count.saturating_sub(settings.tail_window_rows.max(1));
    let tail = store.read_rows(group, tail_start, row_count).await?;
    let reader = TailReader {
        store,
        group,
        settings,
        ts_index,
        tail_start,
        tail: &tail,
    };

    let old_max = reader.tail_max();
    let (case, compare_from, stored) = match old_max {
        Some(old_max) if new_min > old_max => {
            debug!(new_min, old_max, "incoming batch is ahead of stored tail");
            return Ok(append_all(&hasher, records, merged));
        }
        Some(old_max) if new_min == old_max => {
            let (from, rows) = reader.boundary_burst(old_max).await?;
            (ReconcileCase::BoundaryEqual, from, rows)
        }
        Some(_) => {
            let (from, rows) = reader.scan_from(new_min, row_count).await?;
            (ReconcileCase::Overlap, from, rows)
        }
        None => {
            warn!("no readable timestamp in stored tail; comparing against the whole group");
            let rows = store.read_rows(group, 0, row_count).await?;
            (ReconcileCase::Overlap, 0, rows)
        }
    };

    let mut unreadable_rows = 0;
    let known: HashSet<ContentDigest> = stored
        .iter()
        .filter_map(|row| match hasher.hash_stored_row(row, &merged.columns) {
            Ok(digest) => Some(digest),
            Err(err) => {
                unreadable_rows += 1;
                debug!(error = %err, "stored row excluded from comparison");
                None
            }
        })
        .collect();

    if unreadable_rows > 0 {
        warn!(unreadable_rows, "stored rows with unreadable timestamps were not compared");
    }

    let mut duplicates = 0;
    let rows = records
        .iter()
        .filter(|record| {
            let seen = known.contains(&hasher.hash_record(record, &merged.columns));
            duplicates += usize::from(seen);
            !seen
        })
        .map(|record| hasher.format_row(record, &merged.columns))
        .collect::<Vec<_>>();

    debug!(
        case = case.as_str(),
        compare_from,
        rows_compared = stored.len(),
        duplicates,
        appended = rows.len(),
        "group reconciled"
    );

    Ok(ReconcileOutcome {
        rows,
        columns: merged.columns,
        columns_added: merged.added,
        case,
        duplicates,
        rows_compared: stored.len() - unreadable_rows,
        unreadable_rows,
    })
}

fn append_all(
    hasher: &ContentHasher,
    records: &[Record],
    merged: schema::SchemaMerge,
) -> ReconcileOutcome {
    ReconcileOutcome {
        rows: records
            .iter()
            .map(|record| hasher.format_row(record, &merged.columns))
            .collect(),
        columns: merged.columns,
        columns_added: merged.added,
        case: ReconcileCase::DisjointAhead,
        duplicates: 0,
        rows_compared: 0,
        unreadable_rows: 0,
    }
}

/// Rows read per request while scanning outside the cached tail
const SCAN_CHUNK_ROWS: usize = 1000;

/// Timestamp lookups over a group, served from the cached tail when possible
struct TailReader<'a, S> {
    store: &'a S,
    group: &'a str,
    settings: &'a SyncSettings,
    ts_index: Option<usize>,
    tail_start: usize,
    tail: &'a [Vec<String>],
}

impl<S: DestinationStore> TailReader<'_, S> {
    fn decode_cell(&self, row: &[String]) -> Option<i64> {
        let cell = row.get(self.ts_index?)?;
        timestamp::decode(cell, &self.settings.offset).ok()
    }

    /// Newest readable timestamp in the tail
    fn tail_max(&self) -> Option<i64> {
        self.tail.iter().filter_map(|row| self.decode_cell(row)).max()
    }

    /// Rows sharing the tail's newest timestamp, plus the tail itself.
    ///
    /// Extends the read backward in chunks until the first row of the slice
    /// is readable and older than `old_max`, so a same-timestamp burst longer
    /// than the tail window is still compared in full.
    async fn boundary_burst(
        &self,
        old_max: i64,
    ) -> Result<(usize, Vec<Vec<String>>), ContractError> {
        let mut from = self.tail_start;
        let mut rows = self.tail.to_vec();

        while from > 0 {
            let first_is_older = rows
                .first()
                .and_then(|row| self.decode_cell(row))
                .is_some_and(|ts| ts < old_max);
            if first_is_older {
                break;
            }

            let start = from.saturating_sub(SCAN_CHUNK_ROWS);
            let mut chunk = self.store.read_rows(self.group, start, from).await?;
            chunk.append(&mut rows);
            rows = chunk;
            from = start;
            debug!(from, "boundary burst extends past the tail window");
        }

        Ok((from, rows))
    }

    /// Forward scan for the first row at or after `target`.
    ///
    /// Stored rows are not assumed to be ordered: late records are appended
    /// after newer ones, so the scan starts at row 0. An unreadable timestamp
    /// also starts the comparison range. Returns the start index and every row
    /// from there to the end of the group.
    async fn scan_from(
        &self,
        target: i64,
        row_count: usize,
    ) -> Result<(usize, Vec<Vec<String>>), ContractError> {
        let mut found: Option<usize> = None;
        let mut rows = Vec::new();

        let mut start = 0;
        while start < self.tail_start {
            let end = (start + SCAN_CHUNK_ROWS).min(self.tail_start);
            let chunk = self.store.read_rows(self.group, start, end).await?;
            self.collect_from(target, start, chunk, &mut found, &mut rows);
            start = end;
        }
        self.collect_from(target, self.tail_start, self.tail.to_vec(), &mut found, &mut rows);

        match found {
            Some(from) => Ok((from, rows)),
            None => {
                debug!(target, "no stored row at or after target; comparing against the whole group");
                let rows = self.store.read_rows(self.group, 0, row_count).await?;
                Ok((0, rows))
            }
        }
    }

    fn collect_from(
        &self,
        target: i64,
        first_index: usize,
        chunk: Vec<Vec<String>>,
        found: &mut Option<usize>,
        rows: &mut Vec<Vec<String>>,
    ) {
        for (offset, row) in chunk.into_iter().enumerate() {
            if found.is_none() {
                match self.decode_cell(&row) {
                    Some(ts) if ts < target => continue,
                    _ => *found = Some(first_index + offset),
                }
            }
            rows.push(row);
        }
    }
}
