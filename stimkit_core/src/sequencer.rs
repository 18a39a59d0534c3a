//! Ordered agent registry and the run loop.
//!
//! For every registered agent, in registration order:
//!
//! 1. load `<tests_root>/<key>/suite.json` (missing file: warn, skip agent)
//! 2. deserialize and drive each vector in file order (bad vector: log, next)
//! 3. start the monitor, if any, and track its task
//! 4. finalize the scoreboard, if any
//!
//! Nothing in the loop aborts the run, so it always ends in
//! [`SequencerState::Done`].

use crate::agent::Agent;
use crate::deserialize::deserialize;
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::error::StimError;
use crate::item::IpFamily;
use crate::lifecycle::{invoke, Component, Phase};
use crate::scoreboard::{ScoreboardSummary, Verdict};
use crate::suite::Suite;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stimkit_env::{SimKernel, TaskTracker};
use tracing::{debug, info, warn};

/// Where the run loop currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Loading { agent: String },
    Driving { agent: String, vector: usize },
    PassiveVerify { agent: String },
    Done,
}

/// One successfully driven vector, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub agent: String,
    pub vector: usize,
    pub family: IpFamily,
}

/// What happened to one agent during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent: String,
    pub suite: Option<PathBuf>,
    pub vectors_total: usize,
    pub vectors_driven: usize,
    pub vectors_dropped: usize,
    /// No suite could be loaded
    pub skipped: bool,
    pub monitor_started: bool,
    pub finalized: bool,
    pub summary: Option<ScoreboardSummary>,
    /// Filled in by the check phase
    pub verdict: Option<Verdict>,
}

impl AgentOutcome {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            ..Self::default()
        }
    }
}

/// Result of one run phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub agents: Vec<AgentOutcome>,
    pub dispatch: Vec<DispatchRecord>,
    /// Every registered agent was processed
    pub completed: bool,
}

impl RunReport {
    pub fn outcome(&self, agent: &str) -> Option<&AgentOutcome> {
        self.agents.iter().find(|o| o.agent == agent)
    }

    pub fn vectors_driven(&self) -> usize {
        self.agents.iter().map(|o| o.vectors_driven).sum()
    }

    pub fn vectors_dropped(&self) -> usize {
        self.agents.iter().map(|o| o.vectors_dropped).sum()
    }

    /// True unless some scoreboard verdict failed.
    pub fn verdicts_passed(&self) -> bool {
        self.agents
            .iter()
            .filter_map(|o| o.verdict.as_ref())
            .all(Verdict::passed)
    }
}

/// Owns the agent registry and drives every agent through its suite.
pub struct Sequencer {
    name: String,
    tests_root: PathBuf,
    kernel: Arc<dyn SimKernel>,
    agents: Vec<(String, Box<dyn Agent>)>,
    tasks: TaskTracker,
    state: SequencerState,
    report: RunReport,
    diagnostics: DiagnosticLog,
}

impl Sequencer {
    pub fn new(name: impl Into<String>, tests_root: impl Into<PathBuf>, kernel: Arc<dyn SimKernel>) -> Self {
        Self {
            name: name.into(),
            tests_root: tests_root.into(),
            kernel,
            agents: Vec::new(),
            tasks: TaskTracker::new(),
            state: SequencerState::Idle,
            report: RunReport::default(),
            diagnostics: DiagnosticLog::new(),
        }
    }

    /// Registers `agent` under `key`.
    ///
    /// A new key is appended, so registration order is processing order. An
    /// existing key is replaced in place and keeps its position. Returns true
    /// on replacement.
    pub fn register_agent(&mut self, key: &str, agent: Box<dyn Agent>) -> bool {
        if let Some(slot) = self.agents.iter_mut().find(|(k, _)| k == key) {
            warn!(sequencer = %self.name, agent = key, "Replacing registered agent");
            slot.1 = agent;
            return true;
        }
        debug!(sequencer = %self.name, agent = key, kind = %agent.family(), "Registered agent");
        self.agents.push((key.to_string(), agent));
        false
    }

    /// Uses `tasks` to track monitor tasks from now on.
    pub fn attach_tracker(&mut self, tasks: TaskTracker) {
        self.tasks = tasks;
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Registered keys, in processing order.
    pub fn agent_keys(&self) -> Vec<&str> {
        self.agents.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn agent_mut(&mut self, key: &str) -> Option<&mut (dyn Agent + 'static)> {
        self.agents
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, a)| a.as_mut())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn tests_root(&self) -> &Path {
        &self.tests_root
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn run_report(&self) -> &RunReport {
        &self.report
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    /// Processes every registered agent and returns the report.
    pub fn run_suites(&mut self) -> &RunReport {
        let Self {
            name,
            tests_root,
            kernel,
            agents,
            tasks,
            state,
            report,
            diagnostics,
        } = self;

        *report = RunReport::default();
        info!(sequencer = %name, agents = agents.len(), "Starting run phase");

        for (key, agent) in agents.iter_mut() {
            let started = kernel.now();
            let mut outcome = AgentOutcome::new(key);

            *state = SequencerState::Loading { agent: key.clone() };
            let (path, suite) = match Suite::load(tests_root, key) {
                Ok(loaded) => loaded,
                Err(e) => {
                    diagnostics.record(key.as_str(), &e);
                    outcome.skipped = true;
                    report.agents.push(outcome);
                    *state = SequencerState::Idle;
                    continue;
                }
            };
            outcome.suite = Some(path);
            outcome.vectors_total = suite.vectors.len();

            for (index, raw) in suite.vectors.iter().enumerate() {
                *state = SequencerState::Driving {
                    agent: key.clone(),
                    vector: index,
                };
                let driven = deserialize(key, raw).and_then(|item| {
                    let family = item.family();
                    agent.driver().drive_item(item).map(|()| family)
                });
                match driven {
                    Ok(family) => {
                        outcome.vectors_driven += 1;
                        report.dispatch.push(DispatchRecord {
                            agent: key.clone(),
                            vector: index,
                            family,
                        });
                    }
                    Err(e) => {
                        diagnostics.record(format!("{}[{}]", key, index), &e);
                        outcome.vectors_dropped += 1;
                    }
                }
            }

            *state = SequencerState::PassiveVerify { agent: key.clone() };
            if let Some(monitor) = agent.monitor() {
                tasks.track(monitor.start(&**kernel));
                outcome.monitor_started = true;
            }
            if let Some(scoreboard) = agent.scoreboard() {
                outcome.summary = Some(scoreboard.finalize());
                outcome.finalized = true;
            }

            info!(
                agent = %key,
                driven = outcome.vectors_driven,
                dropped = outcome.vectors_dropped,
                elapsed = ?kernel.now().saturating_sub(started),
                "Agent processed"
            );
            report.agents.push(outcome);
            *state = SequencerState::Idle;
        }

        *state = SequencerState::Done;
        report.completed = true;
        &self.report
    }

    /// Asks every scoreboard for its verdict and stores it in the report.
    pub fn check_scoreboards(&mut self) {
        for (key, agent) in self.agents.iter_mut() {
            let Some(scoreboard) = agent.scoreboard() else {
                continue;
            };
            let verdict = scoreboard.check();
            if verdict.passed() {
                debug!(agent = %key, matched = verdict.matched, "Scoreboard passed");
            } else {
                self.diagnostics.flag(
                    Severity::Error,
                    key.as_str(),
                    "scoreboard_mismatch",
                    format!(
                        "{} mismatches ({} expected, {} observed)",
                        verdict.mismatches.len(),
                        verdict.expected,
                        verdict.observed
                    ),
                );
            }
            if let Some(outcome) = self.report.agents.iter_mut().find(|o| o.agent == *key) {
                outcome.verdict = Some(verdict);
            }
        }
    }

    /// Runs one phase hook on every agent. Agent errors stay with the agent.
    fn forward(&mut self, phase: Phase) {
        for (key, agent) in self.agents.iter_mut() {
            if let Err(e) = invoke(agent.as_mut(), phase) {
                self.diagnostics.record(key.as_str(), &e);
            }
        }
    }

    /// Wraps the sequencer for sharing with an environment.
    pub fn into_shared(self) -> SharedSequencer {
        SharedSequencer::new(self)
    }
}

impl Component for Sequencer {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<(), StimError> {
        self.forward(Phase::Connect);
        Ok(())
    }

    fn start_of_run(&mut self) -> Result<(), StimError> {
        self.forward(Phase::StartOfRun);
        Ok(())
    }

    fn run(&mut self) -> Result<(), StimError> {
        self.run_suites();
        Ok(())
    }

    fn extract(&mut self) -> Result<(), StimError> {
        self.forward(Phase::Extract);
        Ok(())
    }

    fn check(&mut self) -> Result<(), StimError> {
        self.forward(Phase::Check);
        self.check_scoreboards();
        Ok(())
    }

    fn report(&mut self) -> Result<(), StimError> {
        self.forward(Phase::Report);
        let report = &self.report;
        info!(
            sequencer = %self.name,
            agents = report.agents.len(),
            skipped = report.agents.iter().filter(|o| o.skipped).count(),
            driven = report.vectors_driven(),
            dropped = report.vectors_dropped(),
            passed = report.verdicts_passed(),
            "Run summary"
        );
        Ok(())
    }
}

/// A [`Sequencer`] shared between the environment that fills it and the
/// orchestrator that runs it.
#[derive(Clone)]
pub struct SharedSequencer {
    name: String,
    inner: Arc<Mutex<Sequencer>>,
}

impl SharedSequencer {
    pub fn new(sequencer: Sequencer) -> Self {
        Self {
            name: sequencer.name.clone(),
            inner: Arc::new(Mutex::new(sequencer)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Sequencer> {
        self.inner.lock()
    }
}

impl std::fmt::Debug for SharedSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSequencer")
            .field("name", &self.name)
            .finish()
    }
}

impl Component for SharedSequencer {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&mut self) -> Result<(), StimError> {
        self.inner.lock().build()
    }

    fn connect(&mut self) -> Result<(), StimError> {
        self.inner.lock().connect()
    }

    fn start_of_run(&mut self) -> Result<(), StimError> {
        self.inner.lock().start_of_run()
    }

    fn run(&mut self) -> Result<(), StimError> {
        self.inner.lock().run()
    }

    fn extract(&mut self) -> Result<(), StimError> {
        self.inner.lock().extract()
    }

    fn check(&mut self) -> Result<(), StimError> {
        self.inner.lock().check()
    }

    fn report(&mut self) -> Result<(), StimError> {
        self.inner.lock().report()
    }
}
