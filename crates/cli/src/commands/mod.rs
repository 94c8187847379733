//! Command implementations.

mod run;
mod status;
mod validate;

pub use run::run_sync;
pub use status::run_status;
pub use validate::run_validate;
