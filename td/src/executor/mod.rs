//! Background task execution
//!
//! Runs task bodies off the connection-serving path with a configurable number
//! of worker slots (one by default).

mod config;
mod core;
pub mod transform;

pub use config::ExecutorConfig;
pub use self::core::{Executor, ExecutorError, TaskBody};
pub use transform::TransformError;
