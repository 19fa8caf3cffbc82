//! taskc - client for the taskd line protocol
//!
//! [`TaskClient`] submits tasks and queries their status over one TCP
//! connection. The `taskc` binary wraps it for the command line.

pub mod cli;
pub mod client;

pub use client::{TaskClient, is_finished, task_id};
