//! Production implementation of SimKernel using Tokio.

use crate::error::EnvError;
use crate::kernel::{KernelFuture, SimKernel};
use crate::types::TaskHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// Kernel backed by the tokio runtime that created it.
///
/// Time is wall-clock time since construction. Background tasks run on the
/// captured runtime handle, so `spawn` works from synchronous phase code.
pub struct TokioKernel {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Runtime that hosts monitor tasks
    handle: Handle,
}

impl TokioKernel {
    /// Creates a kernel on an explicit runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self {
            start: Instant::now(),
            handle,
        }
    }

    /// Creates a kernel on the runtime the caller is running in.
    ///
    /// # Returns
    /// * `Err(EnvError::NoRuntime)` - Called outside of a tokio runtime
    pub fn current() -> Result<Self, EnvError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| EnvError::NoRuntime(e.to_string()))
    }

    /// Creates an Arc-wrapped kernel for sharing across components.
    pub fn shared() -> Result<Arc<Self>, EnvError> {
        Self::current().map(Arc::new)
    }
}

impl SimKernel for TokioKernel {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn spawn(&self, name: &str, future: KernelFuture) -> TaskHandle {
        TaskHandle::new(name, self.handle.spawn(future))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_tokio_kernel_time() {
        let kernel = TokioKernel::current().unwrap();
        let t1 = kernel.now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let t2 = kernel.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_tokio_kernel_spawn_runs_task() {
        let kernel = TokioKernel::shared().unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let task = kernel.spawn(
            "tick",
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );
        assert_eq!(task.name(), "tick");
        task.join(Duration::from_secs(1)).await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tokio_kernel_requires_runtime() {
        let err = TokioKernel::current().err().unwrap();
        assert!(matches!(err, EnvError::NoRuntime(_)));
    }
}
