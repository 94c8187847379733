//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Event time is a UTC epoch-nanosecond `i64`, never a `f64` or a chrono type
//! - Stored timestamps are fixed-offset ISO-8601 strings with 9 fractional digits
//! - Fetch windows are expressed in whole Unix seconds

mod config;
mod error;
mod group_name;
mod log_source;
mod offset;
mod record;
mod report;
mod store;
mod sync_settings;

pub use config::*;
pub use error::*;
pub use group_name::GroupName;
pub use log_source::{LocalLogSource, LogDirection, LogQuery, LogSource};
pub use offset::{Offset, OffsetParseError};
pub use record::*;
pub use report::*;
pub use store::{DestinationStore, LocalDestinationStore};
pub use sync_settings::*;
