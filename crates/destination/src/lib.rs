//! # Destination
//!
//! Append-only tabular stores behind [`contracts::DestinationStore`].
//!
//! - [`MemoryStore`]: in-process groups, for tests and dry runs
//! - [`JsonlStore`]: one `<group>.jsonl` file per group in a directory
//!
//! Stores hold text cells only. Formatting timestamps and aligning cells to the
//! header is the sync engine's job.

pub mod error;
pub mod stores;

pub use contracts::{DestinationStore, LocalDestinationStore};
pub use error::DestinationError;
pub use stores::{JsonlStore, MemoryStore};
