//! Executor implementation
//!
//! A single dispatcher drains an unbounded FIFO of task IDs and starts each
//! one only once a worker slot is free, so with one slot tasks run strictly
//! one after another in submission order. Delays are async sleeps in the
//! worker task; the transformation itself runs on the blocking pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::domain::{TaskId, TaskKind};
use crate::registry::{TaskOutcome, TaskRegistry};

use super::config::ExecutorConfig;
use super::transform::{self, TransformError};

/// A task body: computes the new payload for a kind and input
pub type TaskBody = Arc<dyn Fn(TaskKind, &str) -> Result<String, TransformError> + Send + Sync>;

/// Errors from executor operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("executor is not running")]
    Unavailable,
}

/// Handle to submit tasks for background processing
#[derive(Clone, Debug)]
pub struct Executor {
    tx: mpsc::UnboundedSender<TaskId>,
    backlog: Arc<AtomicUsize>,
}

impl Executor {
    /// Spawn the dispatcher with the built-in transformations
    pub fn spawn(config: ExecutorConfig, registry: TaskRegistry) -> Self {
        let limit = config.max_result_chars;
        let body: TaskBody = Arc::new(move |kind: TaskKind, input: &str| transform::apply(kind, input, limit));
        Self::spawn_with_body(config, registry, body)
    }

    /// Spawn the dispatcher with a custom task body
    pub fn spawn_with_body(config: ExecutorConfig, registry: TaskRegistry, body: TaskBody) -> Self {
        debug!(?config, "Executor::spawn_with_body: called");
        let (tx, rx) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));

        info!(workers = config.workers(), "Executor started");
        tokio::spawn(dispatch_loop(config, registry, body, rx, backlog.clone()));

        Self { tx, backlog }
    }

    /// Queue a task for processing; never waits
    pub fn submit(&self, id: &TaskId) -> Result<(), ExecutorError> {
        debug!(%id, "Executor::submit: called");
        // Count before sending so the dispatcher never decrements past zero
        let backlog = self.backlog.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(id.clone()).is_err() {
            self.backlog.fetch_sub(1, Ordering::SeqCst);
            return Err(ExecutorError::Unavailable);
        }
        debug!(%id, backlog, "Executor::submit: queued");
        Ok(())
    }

    /// Number of submitted tasks not yet handed to a worker
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::SeqCst)
    }

    /// Handle whose dispatcher is already gone; every submit is refused
    #[cfg(test)]
    pub(crate) fn stopped() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self {
            tx,
            backlog: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Takes queued IDs in order and starts each one when a worker slot frees up
async fn dispatch_loop(
    config: ExecutorConfig,
    registry: TaskRegistry,
    body: TaskBody,
    mut rx: mpsc::UnboundedReceiver<TaskId>,
    backlog: Arc<AtomicUsize>,
) {
    debug!("dispatch_loop: called");
    let config = Arc::new(config);
    let slots = Arc::new(Semaphore::new(config.workers()));

    while let Some(id) = rx.recv().await {
        let Ok(permit) = slots.clone().acquire_owned().await else {
            warn!("Worker slots closed, executor stopping");
            break;
        };
        backlog.fetch_sub(1, Ordering::SeqCst);
        debug!(%id, "dispatch_loop: slot acquired");

        let config = config.clone();
        let registry = registry.clone();
        let body = body.clone();
        tokio::spawn(async move {
            run_task(&config, &registry, body, &id).await;
            drop(permit);
        });
    }

    debug!("Executor dispatcher stopped");
}

/// Run one task to a terminal state
async fn run_task(config: &ExecutorConfig, registry: &TaskRegistry, body: TaskBody, id: &TaskId) {
    let task = match registry.begin(id).await {
        Ok(task) => task,
        Err(e) => {
            warn!(%id, error = %e, "Cannot start task, skipping");
            return;
        }
    };
    info!(%id, kind = %task.kind, "Processing task");

    tokio::time::sleep(config.delay_for(task.kind)).await;

    let kind = task.kind;
    let payload = task.payload;
    let outcome: TaskOutcome = match tokio::task::spawn_blocking(move || body(kind, &payload)).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) if e.is_panic() => Err(format!("task body panicked: {}", panic_message(e.into_panic()))),
        Err(e) => Err(format!("task body was aborted: {}", e)),
    };

    match registry.finish(id, outcome).await {
        Ok(task) => info!(%id, state = %task.state, "Task finished"),
        Err(e) => warn!(%id, error = %e, "Cannot record task outcome"),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
