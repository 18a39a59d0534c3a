//! Per-agent vector suites on disk.

use crate::error::StimError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File name of a suite inside its agent directory.
pub const SUITE_FILE: &str = "suite.json";

/// Location of the suite for the agent registered as `agent`:
/// `<tests_root>/<agent>/suite.json`.
pub fn suite_path(tests_root: &Path, agent: &str) -> PathBuf {
    tests_root.join(agent).join(SUITE_FILE)
}

/// An ordered collection of raw vectors for one agent.
///
/// Vectors stay untyped until the sequencer hands each one to the
/// deserializer, so one bad vector never spoils the rest of the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// IP instance the suite was generated for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Family type key the suite was generated for
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_key: Option<String>,

    #[serde(default)]
    pub vectors: Vec<Value>,
}

impl Suite {
    /// Loads the suite for `agent` under `tests_root`.
    ///
    /// Returns the resolved path alongside the suite.
    pub fn load(tests_root: &Path, agent: &str) -> Result<(PathBuf, Suite), StimError> {
        let path = suite_path(tests_root, agent);
        if !path.is_file() {
            return Err(StimError::MissingSuiteFile {
                agent: agent.to_string(),
                path,
            });
        }

        let text = std::fs::read_to_string(&path).map_err(|e| StimError::SuiteParse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let suite = serde_json::from_str(&text).map_err(|e| StimError::SuiteParse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok((path, suite))
    }

    /// Writes the suite as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
    }
}
