//! taskd - line-protocol task processing server
//!
//! Clients connect over TCP and send one request per line: either a task
//! submission (`<kind>: <data>`) answered immediately with an 8-character
//! identifier, or a status query (`status: <id>`). Tasks run in the background
//! after a per-kind delay and their results are kept for later queries.
//!
//! # Modules
//!
//! - [`domain`] - Task, kind, state and identifier types
//! - [`registry`] - Actor that owns every task record
//! - [`executor`] - FIFO queue, worker slots and the three transforms
//! - [`protocol`] - Request parsing and response formatting
//! - [`server`] - TCP listener and per-connection loop
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod executor;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT, LoggingConfig, ServerConfig};
pub use domain::{Task, TaskId, TaskKind, TaskState};
pub use executor::{Executor, ExecutorConfig};
pub use protocol::{Request, Response};
pub use registry::TaskRegistry;
pub use server::Server;
