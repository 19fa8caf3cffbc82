//! Domain types for the task service
//!
//! - [`Task`] - one unit of submitted work and its state machine
//! - [`TaskId`] - random, opaque task identifier

mod id;
mod task;

pub use id::{TASK_ID_LEN, TaskId, generate_id};
pub use task::{Task, TaskKind, TaskState};
