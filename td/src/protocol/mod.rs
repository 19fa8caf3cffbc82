//! Line protocol codec
//!
//! Plain text, one UTF-8 record per `\n`-terminated line in each direction.
//! Parsing and formatting only; no I/O happens here.

mod request;
mod response;

pub use request::{ParseError, Request, STATUS_TOKEN, strip_terminator};
pub use response::{NOT_FOUND, Response};
