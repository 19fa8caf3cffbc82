//! Task domain type
//!
//! A task is one submitted unit of work: a kind selecting the transformation,
//! a payload that is replaced by the result, and a linear state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TaskId;

/// Which transformation a task applies to its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// `1`: reverse the characters
    Reverse,
    /// `2`: swap each adjacent pair of characters
    InterleaveSwap,
    /// `3`: repeat the character at 1-based position `p` exactly `p` times
    RunLengthExpand,
}

impl TaskKind {
    /// All kinds, in wire-code order
    pub const ALL: [TaskKind; 3] = [Self::Reverse, Self::InterleaveSwap, Self::RunLengthExpand];

    /// The wire code that selects this kind in a submit request
    pub fn code(&self) -> &'static str {
        match self {
            Self::Reverse => "1",
            Self::InterleaveSwap => "2",
            Self::RunLengthExpand => "3",
        }
    }

    /// Look up a kind by its wire code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Reverse),
            "2" => Some(Self::InterleaveSwap),
            "3" => Some(Self::RunLengthExpand),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reverse => write!(f, "reverse"),
            Self::InterleaveSwap => write!(f, "interleave-swap"),
            Self::RunLengthExpand => write!(f, "run-length-expand"),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = Self::from_code(s) {
            return Ok(kind);
        }
        match s.to_lowercase().as_str() {
            "reverse" => Ok(Self::Reverse),
            "interleave-swap" | "interleave" => Ok(Self::InterleaveSwap),
            "run-length-expand" | "expand" => Ok(Self::RunLengthExpand),
            _ => Err(format!("Unknown task kind: {}. Use: 1, 2, or 3", s)),
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted, waiting for a worker
    #[default]
    Enqueued,
    /// A worker picked it up
    Processing,
    /// Result computed; payload holds it
    Done,
    /// Task body failed; error holds the reason
    Failed,
}

impl TaskState {
    /// Terminal states never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enqueued => write!(f, "enqueued"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One unit of submitted work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier handed to the client
    pub id: TaskId,

    /// Transformation to apply
    pub kind: TaskKind,

    /// Submitted data; replaced by the result once done
    pub payload: String,

    /// Current state
    pub state: TaskState,

    /// Failure description (only when failed)
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new enqueued task
    pub fn new(id: TaskId, kind: TaskKind, payload: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            payload: payload.into(),
            state: TaskState::Enqueued,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update state and timestamp
    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Store the computed result and mark done
    pub fn complete(&mut self, result: String) {
        self.payload = result;
        self.set_state(TaskState::Done);
    }

    /// Record a failure and mark failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.set_state(TaskState::Failed);
    }

    /// The result, if the task is done
    pub fn result(&self) -> Option<&str> {
        (self.state == TaskState::Done).then_some(self.payload.as_str())
    }
}
