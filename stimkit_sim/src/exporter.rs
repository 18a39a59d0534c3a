//! JSON export of a finished bench run.

use crate::bench::{BenchConfig, BenchOutcome};
use crate::orchestrator::PhaseFailure;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use stimkit_core::sequencer::DispatchRecord;
use stimkit_core::{AgentOutcome, Diagnostic, Phase};
use uuid::Uuid;

/// Complete record of one bench run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    /// Unique run id
    pub run_id: Uuid,

    pub manifest: PathBuf,

    pub tests_root: PathBuf,

    /// Manifest names that got an agent, in registration order
    pub registered: Vec<String>,

    pub phases: Vec<Phase>,

    /// Per-agent outcomes, including scoreboard verdicts
    pub agents: Vec<AgentOutcome>,

    /// Every driven vector, in dispatch order
    pub dispatch: Vec<DispatchRecord>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<PhaseFailure>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unsettled: Vec<String>,

    pub diagnostics: Vec<Diagnostic>,

    pub passed: bool,
}

impl RunExport {
    /// Builds the export for `outcome` under a fresh run id.
    pub fn new(config: &BenchConfig, outcome: &BenchOutcome) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            manifest: config.manifest_path.clone(),
            tests_root: config.tests_root.clone(),
            registered: outcome.registered.clone(),
            phases: outcome.orchestration.phases.clone(),
            agents: outcome.run.agents.clone(),
            dispatch: outcome.run.dispatch.clone(),
            failures: outcome.orchestration.failures.clone(),
            unsettled: outcome.orchestration.unsettled.clone(),
            diagnostics: outcome.diagnostics.clone(),
            passed: outcome.passed(),
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorReport;
    use stimkit_core::{RunReport, Severity};
    use tempfile::tempdir;

    fn outcome() -> BenchOutcome {
        BenchOutcome {
            orchestration: OrchestratorReport {
                phases: Phase::ORDER.to_vec(),
                ..Default::default()
            },
            run: RunReport {
                completed: true,
                ..Default::default()
            },
            registered: vec!["uart0".into()],
            diagnostics: vec![Diagnostic {
                severity: Severity::Warning,
                scope: "uart0".into(),
                kind: "missing_suite_file".into(),
                message: "No tests for IP uart0".into(),
            }],
        }
    }

    #[test]
    fn test_export_written_as_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let export = RunExport::new(&BenchConfig::default(), &outcome());
        export.write_to_file(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["run_id"], export.run_id.to_string());
        assert_eq!(value["passed"], true);
        assert_eq!(value["phases"][3], "run");
        assert_eq!(value["diagnostics"][0]["severity"], "warning");
        assert!(value.get("failures").is_none());
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunExport::new(&BenchConfig::default(), &outcome());
        let b = RunExport::new(&BenchConfig::default(), &outcome());
        assert_ne!(a.run_id, b.run_id);
    }
}
