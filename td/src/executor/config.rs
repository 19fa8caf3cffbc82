//! Executor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::TaskKind;

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Max tasks processed at the same time
    pub concurrency: usize,

    /// Simulated latency before a reverse task produces its result
    #[serde(rename = "reverse-delay-ms")]
    pub reverse_delay_ms: u64,

    /// Simulated latency before an interleave-swap task produces its result
    #[serde(rename = "interleave-delay-ms")]
    pub interleave_delay_ms: u64,

    /// Simulated latency before a run-length-expand task produces its result
    #[serde(rename = "expand-delay-ms")]
    pub expand_delay_ms: u64,

    /// Upper bound on the length of a computed result, in characters
    #[serde(rename = "max-result-chars")]
    pub max_result_chars: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            reverse_delay_ms: 2_000,
            interleave_delay_ms: 5_000,
            expand_delay_ms: 7_000,
            max_result_chars: 1_000_000,
        }
    }
}

impl ExecutorConfig {
    /// Config with the same delay for every kind (handy for tests)
    pub fn with_uniform_delay(delay: Duration) -> Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            reverse_delay_ms: ms,
            interleave_delay_ms: ms,
            expand_delay_ms: ms,
            ..Default::default()
        }
    }

    /// Get the processing delay for a task kind
    pub fn delay_for(&self, kind: TaskKind) -> Duration {
        let ms = match kind {
            TaskKind::Reverse => self.reverse_delay_ms,
            TaskKind::InterleaveSwap => self.interleave_delay_ms,
            TaskKind::RunLengthExpand => self.expand_delay_ms,
        };
        Duration::from_millis(ms)
    }

    /// Concurrency level, never below one
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }
}
