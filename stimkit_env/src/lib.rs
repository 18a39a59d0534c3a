//! stimkit Environment Abstraction Layer
//!
//! This crate is the contract between the stimulus core and the things it
//! drives but does not own:
//! - **Peripherals**: behavioral models of each IP family (UART, SPI, DMA, timer)
//! - **Kernel**: the discrete-event runtime that owns time and background tasks
//!
//! The core only issues synchronous, instantaneous calls into a peripheral.
//! The only place work leaves the caller's stack is a monitor's observation
//! task, which is spawned on a [`SimKernel`] and comes back as a tracked
//! [`TaskHandle`].
//!
//! # Example
//!
//! ```ignore
//! use stimkit_env::{DmaPeripheral, SimKernel, TokioKernel};
//!
//! fn issue(dma: &dyn DmaPeripheral) -> Result<(), stimkit_env::EnvError> {
//!     dma.burst(0x1000, 0x2000, 64)
//! }
//!
//! let kernel = TokioKernel::current()?;
//! let task = kernel.spawn("uart0_monitor", Box::pin(async move { /* observe */ }));
//! ```

mod error;
mod kernel;
mod peripheral;
mod tokio_impl;
mod types;

pub use error::EnvError;
pub use kernel::{KernelFuture, SimKernel};
pub use peripheral::{
    ActivityProbe, DmaPeripheral, PeripheralBus, SpiPeripheral, TimerPeripheral, UartPeripheral,
};
pub use tokio_impl::TokioKernel;
pub use types::{BusActivity, TaskHandle, TaskTracker};
