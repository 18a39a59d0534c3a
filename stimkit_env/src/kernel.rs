//! Discrete-event kernel trait used by monitors.

use crate::types::TaskHandle;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed, sendable unit of background work.
pub type KernelFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The central interface to the simulation kernel.
///
/// The kernel owns time advancement and process scheduling. The stimulus
/// core never suspends on it: it reads the clock and hands over background
/// observation work, nothing else.
///
/// # Implementations
///
/// - **Tokio**: `TokioKernel` - wall clock since creation, tasks on the
///   current tokio runtime
/// - **Tests**: any type that can run a future to completion
pub trait SimKernel: Send + Sync + 'static {
    /// Returns the kernel time since the kernel was created.
    fn now(&self) -> Duration;

    /// Spawns a named background task and returns a handle to it.
    ///
    /// The caller does not await the task; whoever owns the returned
    /// handle decides whether to join or abort it.
    fn spawn(&self, name: &str, future: KernelFuture) -> TaskHandle;
}
