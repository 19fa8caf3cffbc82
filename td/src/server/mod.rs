//! TCP front end
//!
//! [`Server`] owns the listener; each accepted client is served by
//! [`serve_connection`] in its own task, with requests routed by a
//! [`Dispatcher`].

mod connection;
mod listener;

pub use connection::{Dispatcher, serve_connection};
pub use listener::Server;
