//! Widening column sets.
//!
//! A group's header only ever grows: existing columns keep their position so
//! rows written earlier stay aligned, new names are appended.

use std::collections::{BTreeSet, HashSet};

/// Result of a schema merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMerge {
    /// Final ordered column list
    pub columns: Vec<String>,
    /// Columns not present before, in the order they were appended
    pub added: Vec<String>,
}

impl SchemaMerge {
    /// Whether the header must be (re)written
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Merge incoming field names into an existing header.
///
/// With no existing header the result is the timestamp column followed by all
/// names sorted alphabetically, so the layout does not depend on arrival
/// order. With an existing header, unseen names are appended in sorted order.
pub fn merge<'a, I>(existing: Option<&[String]>, incoming: I, timestamp_column: &str) -> SchemaMerge
where
    I: IntoIterator<Item = &'a str>,
{
    let incoming: BTreeSet<&str> = incoming
        .into_iter()
        .filter(|name| *name != timestamp_column)
        .collect();

    match existing.filter(|columns| !columns.is_empty()) {
        None => {
            let columns: Vec<String> = std::iter::once(timestamp_column)
                .chain(incoming)
                .map(str::to_string)
                .collect();
            SchemaMerge {
                added: columns.clone(),
                columns,
            }
        }
        Some(existing) => {
            let known: HashSet<&str> = existing.iter().map(String::as_str).collect();
            let mut added = Vec::new();
            if !known.contains(timestamp_column) {
                added.push(timestamp_column.to_string());
            }
            added.extend(
                incoming
                    .into_iter()
                    .filter(|name| !known.contains(name))
                    .map(str::to_string),
            );

            let mut columns = existing.to_vec();
            columns.extend(added.iter().cloned());
            SchemaMerge { columns, added }
        }
    }
}
