//! stimkit Test Bench Harness
//!
//! This crate is the thin outer layer around `stimkit_core`:
//! - **SocModel**: behavioral UART, SPI, DMA and timer instances
//! - **TestBench**: wires the SoC, environment and sequencer together
//! - **Orchestrator**: runs the lifecycle phases, settles monitor tasks
//! - **DSL generator**: YAML test descriptions -> per-agent suites
//! - **RunExport**: JSON record of a finished run
//!
//! # Usage
//!
//! ```ignore
//! use stimkit_sim::{BenchConfig, TestBench};
//!
//! let mut bench = TestBench::new(BenchConfig::default())?;
//! let outcome = bench.run().await?;
//! assert!(outcome.passed());
//! ```

mod bench;
pub mod dsl;
mod exporter;
mod orchestrator;
pub mod soc;

pub use bench::{BenchConfig, BenchOutcome, TestBench};
pub use dsl::{generate_from_file, DslError, GeneratedSuite};
pub use exporter::RunExport;
pub use orchestrator::{Orchestrator, OrchestratorReport, PhaseFailure};
pub use soc::SocModel;
