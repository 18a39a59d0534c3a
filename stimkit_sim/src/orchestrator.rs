//! Phase orchestrator - drives components through the lifecycle.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stimkit_core::lifecycle::invoke;
use stimkit_core::{Component, Phase, StimError};
use stimkit_env::TaskTracker;
use tracing::{debug, error, info, warn};

/// A component hook that returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub component: String,
    pub kind: String,
    pub message: String,
    /// The error halted the component's phase (as opposed to a contained error)
    pub fatal: bool,
}

/// Results of orchestrating one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorReport {
    /// Phases executed, in order
    pub phases: Vec<Phase>,

    pub failures: Vec<PhaseFailure>,

    /// Monitor tasks that failed or had to be aborted while settling
    pub unsettled: Vec<String>,
}

impl OrchestratorReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs phases phase-major: every component's `build`, then every
/// component's `connect`, and so on. Each phase runs at most once.
pub struct Orchestrator {
    tracker: Option<TaskTracker>,
    settle_timeout: Duration,
    report: OrchestratorReport,
}

impl Orchestrator {
    pub fn new(settle_timeout: Duration) -> Self {
        Self {
            tracker: None,
            settle_timeout,
            report: OrchestratorReport::default(),
        }
    }

    /// Tasks in `tracker` are settled between `run` and `extract`.
    pub fn with_tracker(mut self, tracker: TaskTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn report(&self) -> &OrchestratorReport {
        &self.report
    }

    pub fn has_run(&self, phase: Phase) -> bool {
        self.report.phases.contains(&phase)
    }

    /// Runs `phase` on every component, in slice order.
    ///
    /// A component error is recorded as a [`PhaseFailure`] and the remaining
    /// components still run.
    ///
    /// # Errors
    /// [`StimError::PhaseAlreadyRun`] if `phase` was executed before.
    pub async fn run_phase(
        &mut self,
        phase: Phase,
        components: &mut [&mut dyn Component],
    ) -> Result<(), StimError> {
        if self.has_run(phase) {
            return Err(StimError::PhaseAlreadyRun(phase));
        }
        self.report.phases.push(phase);
        debug!(phase = %phase, components = components.len(), "Starting phase");

        for component in components.iter_mut() {
            if let Err(e) = invoke(&mut **component, phase) {
                error!(
                    phase = %phase,
                    component = component.name(),
                    kind = e.kind(),
                    "Phase failed: {}",
                    e
                );
                self.report.failures.push(PhaseFailure {
                    phase,
                    component: component.name().to_string(),
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                    fatal: e.is_fatal(),
                });
            }
        }

        if phase == Phase::Run {
            self.settle().await;
        }
        Ok(())
    }

    /// Runs every phase in [`Phase::ORDER`].
    pub async fn run_all(
        &mut self,
        components: &mut [&mut dyn Component],
    ) -> Result<&OrchestratorReport, StimError> {
        for phase in Phase::ORDER {
            self.run_phase(phase, components).await?;
        }
        info!(
            phases = self.report.phases.len(),
            failures = self.report.failures.len(),
            "All phases complete"
        );
        Ok(&self.report)
    }

    /// Waits for tracked monitor tasks, aborting any that overrun.
    async fn settle(&mut self) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if tracker.is_empty() {
            return;
        }

        debug!(tasks = tracker.len(), timeout = ?self.settle_timeout, "Settling monitor tasks");
        for (name, result) in tracker.join_all(self.settle_timeout).await {
            if let Err(e) = result {
                warn!(task = %name, "Monitor task did not settle: {}", e);
                self.report.unsettled.push(name);
            }
        }
    }
}
