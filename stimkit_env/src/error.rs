//! Error types for the stimkit environment abstraction.

use thiserror::Error;

/// Errors that can occur at the collaborator boundary.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A peripheral model rejected a call (bad mode, bus fault, etc.)
    #[error("Peripheral error: {0}")]
    PeripheralError(String),

    /// No async runtime is available to host background tasks
    #[error("No runtime: {0}")]
    NoRuntime(String),

    /// A background task panicked or was cancelled
    #[error("Task '{0}' failed: {1}")]
    TaskFailed(String, String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a peripheral error.
    pub fn peripheral(msg: impl Into<String>) -> Self {
        Self::PeripheralError(msg.into())
    }

    /// Creates a task failure error.
    pub fn task_failed(task: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::TaskFailed(task.to_string(), reason.to_string())
    }
}
