//! TaskRegistry - actor that owns the task map
//!
//! Processes commands via channels so every read and every state/payload
//! mutation is applied as one step, in arrival order.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{Task, TaskId, TaskKind, TaskState};

use super::messages::{RegistryCommand, RegistryError, RegistryResponse, RegistryStats, TaskOutcome};

/// Source of fresh candidate IDs
pub type IdSource = Box<dyn FnMut() -> TaskId + Send>;

/// Capacity of the command channel
const COMMAND_BUFFER: usize = 256;

/// Handle to send commands to the TaskRegistry
#[derive(Clone, Debug)]
pub struct TaskRegistry {
    tx: mpsc::Sender<RegistryCommand>,
}

impl TaskRegistry {
    /// Spawn a new TaskRegistry actor with random IDs
    pub fn spawn() -> Self {
        Self::spawn_with_ids(Box::new(TaskId::generate))
    }

    /// Spawn a TaskRegistry drawing candidate IDs from `ids`
    pub fn spawn_with_ids(ids: IdSource) -> Self {
        debug!("TaskRegistry::spawn_with_ids: called");
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

        tokio::spawn(actor_loop(HashMap::new(), ids, rx));

        info!("TaskRegistry spawned");
        Self { tx }
    }

    /// Insert a new enqueued task and return its fresh ID
    pub async fn create(&self, kind: TaskKind, payload: impl Into<String>) -> RegistryResponse<TaskId> {
        let payload = payload.into();
        debug!(%kind, payload_len = payload.len(), "create: called");
        self.request(|reply| RegistryCommand::Create { kind, payload, reply }).await
    }

    /// Snapshot of a task
    pub async fn get(&self, id: &TaskId) -> RegistryResponse<Task> {
        debug!(%id, "get: called");
        let id = id.clone();
        self.request(|reply| RegistryCommand::Get { id, reply }).await
    }

    /// Move a task from enqueued to processing, returning the snapshot to work from
    pub async fn begin(&self, id: &TaskId) -> RegistryResponse<Task> {
        debug!(%id, "begin: called");
        let id = id.clone();
        self.request(|reply| RegistryCommand::Begin { id, reply }).await
    }

    /// Record the outcome of a task body: done with a new payload, or failed
    pub async fn finish(&self, id: &TaskId, outcome: TaskOutcome) -> RegistryResponse<Task> {
        debug!(%id, ok = outcome.is_ok(), "finish: called");
        let id = id.clone();
        self.request(|reply| RegistryCommand::Finish { id, outcome, reply }).await
    }

    /// Count tasks per state
    pub async fn stats(&self) -> RegistryResponse<RegistryStats> {
        debug!("stats: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RegistryCommand::Stats { reply: reply_tx })
            .await
            .map_err(|_| RegistryError::ChannelError)?;
        reply_rx.await.map_err(|_| RegistryError::ChannelError)
    }

    /// Shutdown the TaskRegistry
    pub async fn shutdown(&self) -> RegistryResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(RegistryCommand::Shutdown)
            .await
            .map_err(|_| RegistryError::ChannelError)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<RegistryResponse<T>>) -> RegistryCommand,
    ) -> RegistryResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RegistryError::ChannelError)?;
        reply_rx.await.map_err(|_| RegistryError::ChannelError)?
    }
}

/// The actor loop that owns the task map and processes commands
async fn actor_loop(mut tasks: HashMap<TaskId, Task>, mut ids: IdSource, mut rx: mpsc::Receiver<RegistryCommand>) {
    debug!("TaskRegistry actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            RegistryCommand::Create { kind, payload, reply } => {
                let mut id = ids();
                while tasks.contains_key(&id) {
                    debug!(%id, "actor_loop: ID collision, drawing another");
                    id = ids();
                }
                debug!(%id, %kind, "actor_loop: Create command");
                tasks.insert(id.clone(), Task::new(id.clone(), kind, payload));
                let _ = reply.send(Ok(id));
            }

            RegistryCommand::Get { id, reply } => {
                debug!(%id, "actor_loop: Get command");
                let result = tasks
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| RegistryError::NotFound(id.to_string()));
                let _ = reply.send(result);
            }

            RegistryCommand::Begin { id, reply } => {
                debug!(%id, "actor_loop: Begin command");
                let result = match tasks.get_mut(&id) {
                    None => Err(RegistryError::NotFound(id.to_string())),
                    Some(task) if task.state != TaskState::Enqueued => Err(RegistryError::InvalidTransition {
                        id: id.to_string(),
                        from: task.state,
                        to: TaskState::Processing,
                    }),
                    Some(task) => {
                        task.set_state(TaskState::Processing);
                        Ok(task.clone())
                    }
                };
                let _ = reply.send(result);
            }

            RegistryCommand::Finish { id, outcome, reply } => {
                debug!(%id, "actor_loop: Finish command");
                let result = match tasks.get_mut(&id) {
                    None => Err(RegistryError::NotFound(id.to_string())),
                    Some(task) if task.state.is_terminal() => Err(RegistryError::InvalidTransition {
                        id: id.to_string(),
                        from: task.state,
                        to: if outcome.is_ok() { TaskState::Done } else { TaskState::Failed },
                    }),
                    Some(task) => {
                        match outcome {
                            Ok(result) => task.complete(result),
                            Err(error) => {
                                warn!(%id, %error, "Task failed");
                                task.fail(error);
                            }
                        }
                        Ok(task.clone())
                    }
                };
                let _ = reply.send(result);
            }

            RegistryCommand::Stats { reply } => {
                debug!("actor_loop: Stats command");
                let mut stats = RegistryStats::default();
                for task in tasks.values() {
                    stats.total += 1;
                    match task.state {
                        TaskState::Enqueued => stats.enqueued += 1,
                        TaskState::Processing => stats.processing += 1,
                        TaskState::Done => stats.done += 1,
                        TaskState::Failed => stats.failed += 1,
                    }
                }
                let _ = reply.send(stats);
            }

            RegistryCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("TaskRegistry shutting down");
                break;
            }
        }
    }

    debug!("TaskRegistry actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_registry_create_and_get() {
        let registry = TaskRegistry::spawn();

        let id = registry.create(TaskKind::Reverse, "abcd").await.unwrap();
        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.kind, TaskKind::Reverse);
        assert_eq!(task.payload, "abcd");
        assert_eq!(task.state, TaskState::Enqueued);

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_get_nonexistent() {
        let registry = TaskRegistry::spawn();
        registry.create(TaskKind::Reverse, "x").await.unwrap();

        let result = registry.get(&TaskId::from("nope")).await;
        assert_eq!(result.unwrap_err(), RegistryError::NotFound("nope".to_string()));

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_retries_on_id_collision() {
        let mut candidates = vec!["bbbb1111", "aaaa0000", "aaaa0000"];
        let registry = TaskRegistry::spawn_with_ids(Box::new(move || {
            TaskId::from(candidates.pop().unwrap_or("ffffffff"))
        }));

        let first = registry.create(TaskKind::Reverse, "a").await.unwrap();
        let second = registry.create(TaskKind::Reverse, "b").await.unwrap();
        assert_eq!(first.as_str(), "aaaa0000");
        assert_eq!(second.as_str(), "bbbb1111");

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_concurrent_creates_are_unique() {
        let registry = TaskRegistry::spawn();

        let mut handles = Vec::new();
        for i in 0..200 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.create(TaskKind::InterleaveSwap, format!("payload-{}", i)).await.unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(registry.stats().await.unwrap().enqueued, 200);

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_full_lifecycle() {
        let registry = TaskRegistry::spawn();
        let id = registry.create(TaskKind::Reverse, "abcd").await.unwrap();

        let snapshot = registry.begin(&id).await.unwrap();
        assert_eq!(snapshot.state, TaskState::Processing);
        assert_eq!(snapshot.payload, "abcd");
        assert_eq!(registry.get(&id).await.unwrap().state, TaskState::Processing);

        let done = registry.finish(&id, Ok("dcba".to_string())).await.unwrap();
        assert_eq!(done.state, TaskState::Done);

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.result(), Some("dcba"));

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_finish_with_error_marks_failed() {
        let registry = TaskRegistry::spawn();
        let id = registry.create(TaskKind::RunLengthExpand, "xyz").await.unwrap();
        registry.begin(&id).await.unwrap();

        registry.finish(&id, Err("too big".to_string())).await.unwrap();

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.error.as_deref(), Some("too big"));
        assert_eq!(task.payload, "xyz");

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_begin_twice_fails() {
        let registry = TaskRegistry::spawn();
        let id = registry.create(TaskKind::Reverse, "ab").await.unwrap();
        registry.begin(&id).await.unwrap();

        let result = registry.begin(&id).await;
        assert!(matches!(
            result,
            Err(RegistryError::InvalidTransition {
                from: TaskState::Processing,
                to: TaskState::Processing,
                ..
            })
        ));

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_done_task_is_never_mutated_again() {
        let registry = TaskRegistry::spawn();
        let id = registry.create(TaskKind::Reverse, "ab").await.unwrap();
        registry.begin(&id).await.unwrap();
        registry.finish(&id, Ok("ba".to_string())).await.unwrap();

        assert!(registry.finish(&id, Ok("zz".to_string())).await.is_err());
        assert!(registry.finish(&id, Err("late".to_string())).await.is_err());
        assert!(registry.begin(&id).await.is_err());

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.state, TaskState::Done);
        assert_eq!(task.result(), Some("ba"));

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_stats() {
        let registry = TaskRegistry::spawn();
        let a = registry.create(TaskKind::Reverse, "a").await.unwrap();
        let b = registry.create(TaskKind::Reverse, "b").await.unwrap();
        registry.create(TaskKind::Reverse, "c").await.unwrap();

        registry.begin(&a).await.unwrap();
        registry.finish(&a, Ok("a".to_string())).await.unwrap();
        registry.begin(&b).await.unwrap();

        let stats = registry.stats().await.unwrap();
        assert_eq!(
            stats,
            RegistryStats {
                total: 3,
                enqueued: 1,
                processing: 1,
                done: 1,
                failed: 0,
            }
        );
        assert_eq!(
            stats.to_string(),
            "3 tasks (enqueued: 1, processing: 1, done: 1, failed: 0)"
        );

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_after_shutdown_reports_channel_error() {
        let registry = TaskRegistry::spawn();
        registry.shutdown().await.unwrap();

        // Let the actor observe the shutdown and drop its receiver
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let result = registry.create(TaskKind::Reverse, "late").await;
        assert_eq!(result.unwrap_err(), RegistryError::ChannelError);
    }
}
