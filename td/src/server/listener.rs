//! TCP listener for the task service
//!
//! Accepts connections and spawns one task per client until the shutdown
//! future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{Config, ServerConfig};
use crate::executor::Executor;
use crate::registry::TaskRegistry;

use super::connection::{Dispatcher, serve_connection};

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound task server, ready to run
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    registry: TaskRegistry,
    dispatcher: Dispatcher,
    max_line_bytes: usize,
}

impl Server {
    /// Spawn the registry and executor described by `config` and bind the listener
    pub async fn start(config: &Config) -> Result<Self> {
        debug!(?config, "Server::start: called");
        let registry = TaskRegistry::spawn();
        let executor = Executor::spawn(config.executor.clone(), registry.clone());
        Self::bind(&config.server, registry, executor).await
    }

    /// Bind the listener around an existing registry and executor
    pub async fn bind(config: &ServerConfig, registry: TaskRegistry, executor: Executor) -> Result<Self> {
        let addr = config.addr();
        debug!(%addr, "Server::bind: called");
        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind {}", addr))?;

        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(registry.clone(), executor),
            registry,
            max_line_bytes: config.max_line_bytes,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Failed to read local address")
    }

    /// Handle to the registry this server writes to
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Accept clients until `shutdown` resolves, then drop open connections
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "Receiving connection");
                        let dispatcher = self.dispatcher.clone();
                        let max_line_bytes = self.max_line_bytes;
                        connections.spawn(async move {
                            match serve_connection(stream, peer, dispatcher, max_line_bytes).await {
                                Ok(()) => info!(%peer, "Handled connection"),
                                Err(e) => warn!(%peer, error = %e, "Connection ended with error"),
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        warn!(error = %e, "Connection task panicked");
                    }
                }
            }
        }

        let open = connections.len();
        if open > 0 {
            info!(open, "Closing open connections");
        }
        connections.shutdown().await;
        Ok(())
    }
}
