//! # Sync Engine
//!
//! Incremental, idempotent copy of log records into an append-only tabular
//! destination.
//!
//! Responsibilities:
//! - Rediscover the resume point from the destination and plan the fetch window
//! - Route records to groups by their grouping key
//! - Widen group headers without reordering existing columns
//! - Drop records already stored, using content hashes over the overlap
//!
//! ## Example
//!
//! ```ignore
//! use sync_engine::{SyncEngine, SyncSettings};
//!
//! let engine = SyncEngine::new(SyncSettings::default())
//!     .with_query(r#"{job="app"} | json"#, 5000);
//!
//! let report = engine.run_once(&source, &mut store, now_seconds).await?;
//! println!("appended {} rows", report.total_appended());
//! ```

mod engine;
mod error;
pub mod hasher;
pub mod reconcile;
pub mod router;
pub mod schema;
pub mod timestamp;
pub mod window;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use hasher::{ContentDigest, ContentHasher, HashError};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use router::{route, RoutedRecords};
pub use schema::SchemaMerge;
pub use timestamp::TimestampError;

// Re-export contracts types
pub use contracts::{ReconcileCase, RunReport, SyncSettings, WindowConfig};
