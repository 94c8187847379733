//! Store implementations
//!
//! Contains MemoryStore and JsonlStore.

mod jsonl;
mod memory;

pub use self::jsonl::JsonlStore;
pub use self::memory::MemoryStore;
