//! stimkit core - manifest-driven verification stimulus orchestration
//!
//! The pieces, bottom-up:
//! 1. **Factory**: type key -> agent constructor registry
//! 2. **SequenceItem**: one decoded stimulus, a closed set of IP families
//! 3. **Deserializer**: IP identifier + raw JSON vector -> `SequenceItem`
//! 4. **Agent**: driver, optional monitor, optional scoreboard
//! 5. **Environment**: reads the manifest and registers agents
//! 6. **Sequencer**: loads each agent's suite and drives it, in manifest order
//!
//! Everything is driven through the [`Component`] lifecycle phases.
//! Failures are contained to the manifest entry, agent or vector they
//! belong to and recorded in a [`DiagnosticLog`].

pub mod agent;
pub mod agents;
pub mod deserialize;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod factory;
pub mod item;
pub mod lifecycle;
pub mod manifest;
pub mod scoreboard;
pub mod sequencer;
pub mod suite;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use agent::{Agent, Driver, ItemDriver, Monitor, Scoreboard};
pub use agents::{default_registry, register_defaults};
pub use deserialize::deserialize;
pub use diagnostics::{Diagnostic, DiagnosticLog, Severity};
pub use environment::Environment;
pub use error::StimError;
pub use factory::Factory;
pub use item::{DmaBurst, IpFamily, SequenceItem, SpiXfer, TimerCmd, UartTx};
pub use lifecycle::{Component, Phase};
pub use manifest::{AgentDescriptor, Manifest, RejectedEntry};
pub use scoreboard::{InOrderScoreboard, ScoreLedger, Verdict};
pub use sequencer::{AgentOutcome, RunReport, Sequencer, SequencerState, SharedSequencer};
pub use suite::{suite_path, Suite};
