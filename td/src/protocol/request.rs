//! Request lines
//!
//! `<kind>: <payload>` submits a task, `status: <id>` queries one. Only the
//! first colon separates; both sides are trimmed.

use thiserror::Error;

use crate::domain::{TaskId, TaskKind};

/// Left-hand token of a status query
pub const STATUS_TOKEN: &str = "status";

/// Why a request line could not be understood
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("missing ':' separator in \"{0}\"")]
    MissingSeparator(String),

    #[error("type {kind}, data {data}")]
    UnknownType { kind: String, data: String },

    #[error("request is not valid UTF-8")]
    InvalidUtf8,

    #[error("request exceeds {0} bytes")]
    TooLong(usize),
}

/// A parsed client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Schedule a new task
    Submit { kind: TaskKind, payload: String },

    /// Ask for the state of an existing task
    Status { id: TaskId },
}

/// A raw line without its `\n` or `\r\n` terminator
pub fn strip_terminator(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

impl Request {
    /// Decode a raw line (with or without its trailing newline)
    ///
    /// `max_bytes` bounds the line content; the terminator does not count.
    pub fn decode(raw: &[u8], max_bytes: usize) -> Result<Self, ParseError> {
        let body = strip_terminator(raw);
        if body.len() > max_bytes {
            return Err(ParseError::TooLong(max_bytes));
        }
        let line = std::str::from_utf8(body).map_err(|_| ParseError::InvalidUtf8)?;
        Self::parse(line)
    }

    /// Parse one request line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let (left, right) = line
            .split_once(':')
            .ok_or_else(|| ParseError::MissingSeparator(line.to_string()))?;
        let left = left.trim();
        let right = right.trim();

        if left == STATUS_TOKEN {
            return Ok(Self::Status { id: TaskId::from(right) });
        }

        match TaskKind::from_code(left) {
            Some(kind) => Ok(Self::Submit {
                kind,
                payload: right.to_string(),
            }),
            None => Err(ParseError::UnknownType {
                kind: left.to_string(),
                data: right.to_string(),
            }),
        }
    }

    /// Encode as a wire line, newline included
    pub fn to_line(&self) -> String {
        match self {
            Self::Submit { kind, payload } => format!("{}: {}\n", kind.code(), payload),
            Self::Status { id } => format!("{}: {}\n", STATUS_TOKEN, id),
        }
    }
}
