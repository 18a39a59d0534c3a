//! Severity-tagged diagnostic records.
//!
//! Every contained failure is both emitted as a `tracing` event and kept as
//! a [`Diagnostic`], so a run can be inspected after the fact without
//! scraping logs.

use crate::error::StimError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        write!(f, "{}", label)
    }
}

/// A single recorded condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Unit of work the record belongs to (e.g. `env`, `uart0`, `dma0[2]`)
    pub scope: String,

    /// Machine-readable kind, `info` for plain notes
    pub kind: String,

    pub message: String,
}

/// Append-only diagnostic log owned by a component.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    records: Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error at its policy severity and emits it to `tracing`.
    pub fn record(&mut self, scope: impl Into<String>, err: &StimError) {
        let scope = scope.into();
        let severity = err.severity();
        match severity {
            Severity::Info => info!(scope = %scope, kind = err.kind(), "{}", err),
            Severity::Warning => warn!(scope = %scope, kind = err.kind(), "{}", err),
            Severity::Error | Severity::Fatal => {
                error!(scope = %scope, kind = err.kind(), severity = %severity, "{}", err)
            }
        }
        self.records.push(Diagnostic {
            severity,
            scope,
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
    }

    /// Records an informational note.
    pub fn note(&mut self, scope: impl Into<String>, message: impl Into<String>) {
        self.flag(Severity::Info, scope, "info", message);
    }

    /// Records a condition that is not a [`StimError`], such as a
    /// scoreboard verdict.
    pub fn flag(
        &mut self,
        severity: Severity,
        scope: impl Into<String>,
        kind: &str,
        message: impl Into<String>,
    ) {
        let scope = scope.into();
        let message = message.into();
        match severity {
            Severity::Info => info!(scope = %scope, kind, "{}", message),
            Severity::Warning => warn!(scope = %scope, kind, "{}", message),
            Severity::Error | Severity::Fatal => {
                error!(scope = %scope, kind, severity = %severity, "{}", message)
            }
        }
        self.records.push(Diagnostic {
            severity,
            scope,
            kind: kind.to_string(),
            message,
        });
    }

    /// Appends records from another log without re-emitting them.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Diagnostic>) {
        self.records.extend(records);
    }

    /// All records, in the order they were made.
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Records of exactly the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.severity == severity)
    }

    /// Number of records at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.records.iter().filter(|d| d.severity >= severity).count()
    }

    pub fn warnings(&self) -> usize {
        self.with_severity(Severity::Warning).count()
    }

    pub fn errors(&self) -> usize {
        self.count_at_least(Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Moves all records out, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_policy_severity() {
        let mut log = DiagnosticLog::new();
        log.record("env", &StimError::DuplicateAgentName("uart0".into()));
        log.record("env", &StimError::MissingSequencerReference("env".into()));
        log.note("sequencer", "run complete");

        assert_eq!(log.records().len(), 3);
        assert_eq!(log.warnings(), 1);
        assert_eq!(log.errors(), 1);
        assert_eq!(log.records()[1].severity, Severity::Fatal);
        assert_eq!(log.records()[1].kind, "missing_sequencer_reference");
        assert_eq!(log.records()[2].kind, "info");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Fatal > Severity::Error);
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_flag_keeps_custom_kind() {
        let mut log = DiagnosticLog::new();
        log.flag(Severity::Error, "uart0", "scoreboard_mismatch", "1 mismatch");
        assert_eq!(log.errors(), 1);
        assert_eq!(log.records()[0].kind, "scoreboard_mismatch");
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = DiagnosticLog::new();
        log.note("x", "y");
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }
}
