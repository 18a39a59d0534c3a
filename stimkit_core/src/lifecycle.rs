//! Ordered-phase component contract.

use crate::error::StimError;
use serde::{Deserialize, Serialize};

/// Lifecycle phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Build,
    Connect,
    StartOfRun,
    Run,
    Extract,
    Check,
    Report,
}

impl Phase {
    /// Every phase, in the order they run.
    pub const ORDER: [Phase; 7] = [
        Phase::Build,
        Phase::Connect,
        Phase::StartOfRun,
        Phase::Run,
        Phase::Extract,
        Phase::Check,
        Phase::Report,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Build => "build",
            Phase::Connect => "connect",
            Phase::StartOfRun => "start_of_run",
            Phase::Run => "run",
            Phase::Extract => "extract",
            Phase::Check => "check",
            Phase::Report => "report",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A long-lived object driven through the lifecycle phases.
///
/// Every hook is a no-op by default; implementors override only what they
/// need. An external orchestrator calls each hook at most once per run, in
/// [`Phase::ORDER`].
pub trait Component: Send {
    /// Instance name used in logs and diagnostics.
    fn name(&self) -> &str;

    fn build(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn start_of_run(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn run(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn extract(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn check(&mut self) -> Result<(), StimError> {
        Ok(())
    }

    fn report(&mut self) -> Result<(), StimError> {
        Ok(())
    }
}

/// Dispatches `phase` to the matching hook of `component`.
pub fn invoke<C: Component + ?Sized>(component: &mut C, phase: Phase) -> Result<(), StimError> {
    match phase {
        Phase::Build => component.build(),
        Phase::Connect => component.connect(),
        Phase::StartOfRun => component.start_of_run(),
        Phase::Run => component.run(),
        Phase::Extract => component.extract(),
        Phase::Check => component.check(),
        Phase::Report => component.report(),
    }
}
