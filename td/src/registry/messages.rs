//! Task registry messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Task, TaskId, TaskKind, TaskState};

/// Errors from registry operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: TaskState, to: TaskState },

    #[error("Channel error")]
    ChannelError,
}

/// Response from registry operations
pub type RegistryResponse<T> = Result<T, RegistryError>;

/// Outcome of running a task body: the new payload or a failure description
pub type TaskOutcome = Result<String, String>;

/// Per-state task counts
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStats {
    pub total: u64,
    pub enqueued: u64,
    pub processing: u64,
    pub done: u64,
    pub failed: u64,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tasks (enqueued: {}, processing: {}, done: {}, failed: {})",
            self.total, self.enqueued, self.processing, self.done, self.failed
        )
    }
}

/// Commands sent to the TaskRegistry actor
#[derive(Debug)]
pub enum RegistryCommand {
    Create {
        kind: TaskKind,
        payload: String,
        reply: oneshot::Sender<RegistryResponse<TaskId>>,
    },
    Get {
        id: TaskId,
        reply: oneshot::Sender<RegistryResponse<Task>>,
    },
    Begin {
        id: TaskId,
        reply: oneshot::Sender<RegistryResponse<Task>>,
    },
    Finish {
        id: TaskId,
        outcome: TaskOutcome,
        reply: oneshot::Sender<RegistryResponse<Task>>,
    },
    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },

    // Shutdown
    Shutdown,
}
