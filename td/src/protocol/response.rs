//! Response lines
//!
//! Every response that concerns a task starts with `<id>:` so clients can
//! split on the first colon. A finished task's line always contains `done`.

use crate::domain::{Task, TaskId, TaskState};

use super::request::ParseError;

/// Reply to an unknown task ID
pub const NOT_FOUND: &str = "No such task";

/// A server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Submit accepted
    Scheduled { id: TaskId },

    /// Task still waiting or running
    Pending { id: TaskId, state: TaskState },

    /// Task finished with a result
    Done { id: TaskId, result: String },

    /// Task body failed
    Failed { id: TaskId, error: String },

    /// Status query for an ID that was never issued
    NotFound,

    /// Request line could not be parsed
    Malformed(ParseError),

    /// The server could not carry out a valid request
    ServerError(String),
}

impl Response {
    /// Status response for a task snapshot
    pub fn for_task(task: &Task) -> Self {
        match task.state {
            TaskState::Enqueued | TaskState::Processing => Self::Pending {
                id: task.id.clone(),
                state: task.state,
            },
            TaskState::Done => Self::Done {
                id: task.id.clone(),
                result: task.payload.clone(),
            },
            TaskState::Failed => Self::Failed {
                id: task.id.clone(),
                error: task.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }

    /// Encode as a wire line, newline included
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled { id } => write!(f, "{}: task scheduled", id),
            Self::Pending { id, state } => write!(f, "{}: {}", id, state),
            Self::Done { id, result } => write!(f, "{}: {}, result: {}", id, TaskState::Done, result),
            Self::Failed { id, error } => write!(f, "{}: {}, error: {}", id, TaskState::Failed, error),
            Self::NotFound => write!(f, "{}", NOT_FOUND),
            Self::Malformed(e) => write!(f, "Impossible to handle: {}", e),
            Self::ServerError(message) => write!(f, "Server error: {}", message),
        }
    }
}

impl From<ParseError> for Response {
    fn from(e: ParseError) -> Self {
        Self::Malformed(e)
    }
}
