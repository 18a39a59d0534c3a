//! Common types for the stimkit environment abstraction.

use crate::error::EnvError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One observable effect recorded by a peripheral model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusActivity {
    /// A UART frame left the transmitter
    UartFrame {
        baud: u32,
        payload: Vec<u8>,
        parity: bool,
    },

    /// A full-duplex SPI transfer completed
    SpiTransfer { mode: u32, tx: Vec<u8>, rx: Vec<u8> },

    /// A DMA burst was issued
    DmaBurst { src: u64, dst: u64, len: u32 },

    /// The timer was (re)started
    TimerStart { period_us: u32 },

    /// The timer was stopped
    TimerStop,
}

impl BusActivity {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            BusActivity::UartFrame { .. } => "uart_frame",
            BusActivity::SpiTransfer { .. } => "spi_transfer",
            BusActivity::DmaBurst { .. } => "dma_burst",
            BusActivity::TimerStart { .. } => "timer_start",
            BusActivity::TimerStop => "timer_stop",
        }
    }
}

/// Handle to a background task spawned on a [`SimKernel`](crate::SimKernel).
///
/// Dropping the handle detaches the task; use [`join`](Self::join) or
/// [`abort`](Self::abort) to settle it explicitly.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    inner: JoinHandle<()>,
}

impl TaskHandle {
    /// Wraps a tokio join handle.
    pub fn new(name: impl Into<String>, inner: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// Returns the task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the task has run to completion (or was aborted).
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Requests cancellation.
    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Waits for the task, aborting it if it outlives `timeout`.
    pub async fn join(self, timeout: Duration) -> Result<(), EnvError> {
        let Self { name, mut inner } = self;
        match tokio::time::timeout(timeout, &mut inner).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(EnvError::task_failed(&name, e)),
            Err(_) => {
                inner.abort();
                Err(EnvError::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}

/// Shared list of in-flight background tasks.
///
/// Cloning is cheap; all clones see the same list.
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    tasks: Arc<Mutex<Vec<TaskHandle>>>,
}

impl TaskTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a task.
    pub fn track(&self, task: TaskHandle) {
        debug!(task = %task.name(), "Tracking background task");
        self.tasks.lock().push(task);
    }

    /// Number of tracked tasks not yet settled.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Aborts every tracked task and forgets it.
    pub fn abort_all(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in &tasks {
            task.abort();
        }
        tasks.len()
    }

    /// Joins every tracked task within a shared deadline.
    ///
    /// Tasks still running when the deadline passes are aborted and
    /// reported as [`EnvError::Timeout`]. Results come back in tracking order.
    pub async fn join_all(&self, timeout: Duration) -> Vec<(String, Result<(), EnvError>)> {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let deadline = tokio::time::Instant::now() + timeout;
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks {
            let name = task.name().to_string();
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let result = task.join(remaining).await;
            if let Err(e) = &result {
                warn!(task = %name, error = %e, "Background task did not settle cleanly");
            }
            results.push((name, result));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_labels() {
        assert_eq!(BusActivity::TimerStop.label(), "timer_stop");
        assert_eq!(
            BusActivity::DmaBurst { src: 0, dst: 0, len: 0 }.label(),
            "dma_burst"
        );
    }

    #[tokio::test]
    async fn test_join_completed_task() {
        let handle = TaskHandle::new("quick", tokio::spawn(async {}));
        assert_eq!(handle.name(), "quick");
        handle.join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_join_times_out_and_aborts() {
        let handle = TaskHandle::new(
            "slow",
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }),
        );
        let err = handle.join(Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, EnvError::Timeout(10)));
    }

    #[tokio::test]
    async fn test_join_reports_panicked_task() {
        let handle = TaskHandle::new("boom", tokio::spawn(async {
            panic!("monitor crashed");
        }));
        let err = handle.join(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, EnvError::TaskFailed(name, _) if name == "boom"));
    }

    #[tokio::test]
    async fn test_tracker_join_all_in_order() {
        let tracker = TaskTracker::new();
        let clone = tracker.clone();
        tracker.track(TaskHandle::new("a", tokio::spawn(async {})));
        clone.track(TaskHandle::new("b", tokio::spawn(async {})));
        assert_eq!(tracker.len(), 2);

        let results = tracker.join_all(Duration::from_secs(1)).await;
        let names: Vec<_> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(clone.is_empty());
    }

    #[tokio::test]
    async fn test_tracker_abort_all() {
        let tracker = TaskTracker::new();
        tracker.track(TaskHandle::new(
            "forever",
            tokio::spawn(std::future::pending::<()>()),
        ));
        assert_eq!(tracker.abort_all(), 1);
        assert!(tracker.is_empty());
    }
}
