//! Task registry with actor pattern
//!
//! TaskRegistry owns the task map and processes messages via channels,
//! providing consistent snapshots and atomic transitions to every connection
//! and worker.

mod manager;
mod messages;

pub use manager::{IdSource, TaskRegistry};
pub use messages::{RegistryCommand, RegistryError, RegistryResponse, RegistryStats, TaskOutcome};
