//! MemoryStore - groups held in process memory

use std::collections::BTreeMap;

use contracts::{ContractError, DestinationStore};
use tracing::{instrument, trace};

#[derive(Debug, Clone, Default)]
struct MemoryGroup {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Destination kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    groups: BTreeMap<String, MemoryGroup>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Create an empty store with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: BTreeMap::new(),
        }
    }

    /// Stored header of a group
    pub fn columns(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(|g| g.header.as_slice())
    }

    /// Stored data rows of a group
    pub fn rows(&self, group: &str) -> Option<&[Vec<String>]> {
        self.groups.get(group).map(|g| g.rows.as_slice())
    }
}

impl DestinationStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_groups(&self) -> Result<Vec<String>, ContractError> {
        Ok(self.groups.keys().cloned().collect())
    }

    async fn header(&self, group: &str) -> Result<Option<Vec<String>>, ContractError> {
        Ok(self.groups.get(group).map(|g| g.header.clone()))
    }

    async fn row_count(&self, group: &str) -> Result<usize, ContractError> {
        Ok(self.groups.get(group).map_or(0, |g| g.rows.len()))
    }

    async fn read_rows(
        &self,
        group: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<Vec<String>>, ContractError> {
        let Some(g) = self.groups.get(group) else {
            return Ok(Vec::new());
        };
        let end = end.min(g.rows.len());
        let start = start.min(end);
        Ok(g.rows[start..end].to_vec())
    }

    #[instrument(name = "memory_store_write_header", skip(self, columns), fields(store = %self.name))]
    async fn write_header(&mut self, group: &str, columns: &[String]) -> Result<(), ContractError> {
        self.groups.entry(group.to_string()).or_default().header = columns.to_vec();
        Ok(())
    }

    #[instrument(
        name = "memory_store_append",
        skip(self, rows),
        fields(store = %self.name, rows = rows.len())
    )]
    async fn append_rows(&mut self, group: &str, rows: &[Vec<String>]) -> Result<(), ContractError> {
        let Some(g) = self.groups.get_mut(group) else {
            return Err(ContractError::destination_write(group, "group has no header"));
        };
        g.rows.extend_from_slice(rows);
        trace!(total = g.rows.len(), "rows appended");
        Ok(())
    }
}
