//! TestBench - the top-level container wiring SoC, environment and sequencer.

use crate::orchestrator::{Orchestrator, OrchestratorReport};
use crate::soc::SocModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stimkit_core::{
    Component, Diagnostic, Environment, RunReport, Sequencer, SharedSequencer, StimError,
};
use stimkit_env::{EnvError, SimKernel, TokioKernel};
use tracing::info;

/// Configuration for a bench run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Manifest listing the IP instances
    pub manifest_path: PathBuf,

    /// Root directory of the per-agent suites
    pub tests_root: PathBuf,

    /// How long monitors get to finish after the run phase
    pub settle_timeout_ms: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("soc/manifest.json"),
            tests_root: PathBuf::from("tests/generated"),
            settle_timeout_ms: 5000,
        }
    }
}

impl BenchConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Everything a finished bench run produced.
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub orchestration: OrchestratorReport,
    pub run: RunReport,
    /// Manifest names that got an agent
    pub registered: Vec<String>,
    /// Environment records first, then sequencer records
    pub diagnostics: Vec<Diagnostic>,
}

impl BenchOutcome {
    /// No phase failed and every scoreboard verdict passed.
    pub fn passed(&self) -> bool {
        self.orchestration.passed() && self.run.verdicts_passed()
    }
}

/// The bench: one SoC model, one environment, one sequencer.
pub struct TestBench {
    config: BenchConfig,
    soc: SocModel,
    env: Environment,
    sequencer: SharedSequencer,
    orchestrator: Orchestrator,
}

impl TestBench {
    /// Creates a bench on the current tokio runtime.
    pub fn new(config: BenchConfig) -> Result<Self, EnvError> {
        let kernel = TokioKernel::shared()?;
        Ok(Self::with_kernel(config, kernel))
    }

    /// Creates a bench whose monitors run on `kernel`.
    pub fn with_kernel(config: BenchConfig, kernel: Arc<dyn SimKernel>) -> Self {
        let soc = SocModel::new();
        let sequencer = Sequencer::new("sequencer", config.tests_root.clone(), kernel).into_shared();

        let mut env = Environment::new("env", config.manifest_path.clone(), soc.bus());
        env.attach_sequencer(sequencer.clone());

        let orchestrator =
            Orchestrator::new(config.settle_timeout()).with_tracker(env.tasks().clone());

        Self {
            config,
            soc,
            env,
            sequencer,
            orchestrator,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn soc(&self) -> &SocModel {
        &self.soc
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn sequencer(&self) -> &SharedSequencer {
        &self.sequencer
    }

    /// Runs every phase and collects the outcome.
    ///
    /// # Errors
    /// [`StimError::PhaseAlreadyRun`] when called twice on the same bench.
    pub async fn run(&mut self) -> Result<BenchOutcome, StimError> {
        info!(
            manifest = %self.config.manifest_path.display(),
            tests_root = %self.config.tests_root.display(),
            "Starting bench"
        );

        let orchestration = {
            let mut components: [&mut dyn Component; 2] = [&mut self.env, &mut self.sequencer];
            self.orchestrator.run_all(&mut components).await?.clone()
        };

        let aborted = self.env.shutdown();
        if aborted > 0 {
            info!(aborted, "Aborted leftover monitor tasks");
        }

        let seq = self.sequencer.lock();
        let mut diagnostics = self.env.diagnostics().records().to_vec();
        diagnostics.extend(seq.diagnostics().records().iter().cloned());

        Ok(BenchOutcome {
            orchestration,
            run: seq.run_report().clone(),
            registered: self.env.registered().to_vec(),
            diagnostics,
        })
    }
}
