//! Pipeline orchestration module.

mod orchestrator;
mod stats;
mod store;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
pub use store::AnyStore;
