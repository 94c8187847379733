//! DestinationStore trait - append-only tabular destination
//!
//! A destination is a set of named groups. Each group has a header row
//! (column names, first cell is the timestamp column) followed by data rows of
//! text cells aligned positionally to the header at the time they were written.

use crate::ContractError;

/// Destination storage trait
///
/// Row indices are 0-based over data rows only; the header is not a row.
#[trait_variant::make(DestinationStore: Send)]
pub trait LocalDestinationStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Names of all existing groups
    async fn list_groups(&self) -> Result<Vec<String>, ContractError>;

    /// Column header of a group, `None` when the group does not exist yet
    async fn header(&self, group: &str) -> Result<Option<Vec<String>>, ContractError>;

    /// Number of data rows in a group (0 for a missing group)
    async fn row_count(&self, group: &str) -> Result<usize, ContractError>;

    /// Read data rows `start..end` (end exclusive, clamped to the row count)
    async fn read_rows(
        &self,
        group: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<Vec<String>>, ContractError>;

    /// Create the group if needed and replace its header
    ///
    /// Existing data rows are left untouched.
    async fn write_header(&mut self, group: &str, columns: &[String])
        -> Result<(), ContractError>;

    /// Append data rows to the end of a group
    async fn append_rows(&mut self, group: &str, rows: &[Vec<String>])
        -> Result<(), ContractError>;
}
