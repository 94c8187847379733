//! Destination selected by configuration.

use anyhow::{Context, Result};
use contracts::{ContractError, DestinationConfig, DestinationStore};
use destination::{JsonlStore, MemoryStore};

/// Store chosen at runtime from `[destination]`
pub enum AnyStore {
    Jsonl(JsonlStore),
    Memory(MemoryStore),
}

impl AnyStore {
    /// Open the configured destination
    pub fn open(config: &DestinationConfig) -> Result<Self> {
        match config {
            DestinationConfig::Jsonl { path } => {
                let store = JsonlStore::new("jsonl", path).with_context(|| {
                    format!("Failed to open jsonl destination at {}", path.display())
                })?;
                Ok(Self::Jsonl(store))
            }
            DestinationConfig::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }
}

impl DestinationStore for AnyStore {
    fn name(&self) -> &str {
        match self {
            Self::Jsonl(s) => s.name(),
            Self::Memory(s) => s.name(),
        }
    }

    async fn list_groups(&self) -> Result<Vec<String>, ContractError> {
        match self {
            Self::Jsonl(s) => s.list_groups().await,
            Self::Memory(s) => s.list_groups().await,
        }
    }

    async fn header(&self, group: &str) -> Result<Option<Vec<String>>, ContractError> {
        match self {
            Self::Jsonl(s) => s.header(group).await,
            Self::Memory(s) => s.header(group).await,
        }
    }

    async fn row_count(&self, group: &str) -> Result<usize, ContractError> {
        match self {
            Self::Jsonl(s) => s.row_count(group).await,
            Self::Memory(s) => s.row_count(group).await,
        }
    }

    async fn read_rows(
        &self,
        group: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<Vec<String>>, ContractError> {
        match self {
            Self::Jsonl(s) => s.read_rows(group, start, end).await,
            Self::Memory(s) => s.read_rows(group, start, end).await,
        }
    }

    async fn write_header(&mut self, group: &str, columns: &[String]) -> Result<(), ContractError> {
        match self {
            Self::Jsonl(s) => s.write_header(group, columns).await,
            Self::Memory(s) => s.write_header(group, columns).await,
        }
    }

    async fn append_rows(&mut self, group: &str, rows: &[Vec<String>]) -> Result<(), ContractError> {
        match self {
            Self::Jsonl(s) => s.append_rows(group, rows).await,
            Self::Memory(s) => s.append_rows(group, rows).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_jsonl_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out");
        let mut store = AnyStore::open(&DestinationConfig::Jsonl { path: path.clone() }).unwrap();

        assert!(path.is_dir());
        store
            .write_header("svc", &["timestamp".to_string()])
            .await
            .unwrap();
        assert_eq!(store.list_groups().await.unwrap(), vec!["svc"]);
        assert_eq!(store.name(), "jsonl");
    }

    #[tokio::test]
    async fn test_open_memory() {
        let store = AnyStore::open(&DestinationConfig::Memory).unwrap();
        assert!(matches!(store, AnyStore::Memory(_)));
        assert!(store.list_groups().await.unwrap().is_empty());
    }
}
