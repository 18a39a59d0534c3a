//! Error types for stimulus orchestration.

use crate::diagnostics::Severity;
use crate::item::IpFamily;
use crate::lifecycle::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Every condition the orchestrator can hit, scoped to the unit of work it
/// belongs to (manifest entry, agent, vector, or phase).
#[derive(Debug, Error)]
pub enum StimError {
    /// The manifest file could not be opened or read
    #[error("Failed to open manifest {path}: {source}")]
    ManifestOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a valid `{"ips": [...]}` document
    #[error("Malformed manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    /// A manifest entry is not a `{"name": ..., "type": ...}` object
    #[error("Invalid manifest entry #{index}: {reason}")]
    InvalidManifestEntry { index: usize, reason: String },

    /// A manifest entry names a type with no registered constructor
    #[error("Unknown IP type in manifest: {type_key} (entry '{name}')")]
    UnknownAgentType { name: String, type_key: String },

    /// A manifest entry reuses a name already seen earlier in the manifest
    #[error("Duplicate agent name in manifest: {0}")]
    DuplicateAgentName(String),

    /// The environment reached connect without a sequencer to register into
    #[error("Sequencer reference is absent in environment '{0}'")]
    MissingSequencerReference(String),

    /// No suite file exists for an agent
    #[error("No tests for IP {agent} (expected {path})")]
    MissingSuiteFile { agent: String, path: PathBuf },

    /// The suite file exists but cannot be read or parsed
    #[error("Malformed suite {path}: {reason}")]
    SuiteParse { path: PathBuf, reason: String },

    /// A vector's IP identifier matches no known family prefix
    #[error("Unknown IP family for vector identifier '{0}'")]
    UnknownVectorPrefix(String),

    /// A vector omits a field its family requires
    #[error("{family} vector is missing required field '{field}'")]
    MissingRequiredField {
        family: IpFamily,
        field: &'static str,
    },

    /// A vector field has the wrong shape or an out-of-range value
    #[error("{family} vector has invalid field: {reason}")]
    InvalidField { family: IpFamily, reason: String },

    /// A driver was handed an item of another family
    #[error("Driver for {expected} cannot drive a {actual} item")]
    ItemFamilyMismatch { expected: IpFamily, actual: IpFamily },

    /// The peripheral model rejected a driver call
    #[error("Peripheral rejected {family} item: {source}")]
    Peripheral {
        family: IpFamily,
        #[source]
        source: stimkit_env::EnvError,
    },

    /// A lifecycle phase was invoked a second time
    #[error("Phase {0} has already run")]
    PhaseAlreadyRun(Phase),
}

impl StimError {
    /// Severity under the propagation policy.
    pub fn severity(&self) -> Severity {
        match self {
            StimError::ManifestOpen { .. } | StimError::ManifestParse { .. } => Severity::Error,
            StimError::MissingSequencerReference(_) | StimError::PhaseAlreadyRun(_) => {
                Severity::Fatal
            }
            StimError::InvalidManifestEntry { .. }
            | StimError::UnknownAgentType { .. }
            | StimError::DuplicateAgentName(_)
            | StimError::MissingSuiteFile { .. }
            | StimError::UnknownVectorPrefix(_) => Severity::Warning,
            StimError::SuiteParse { .. }
            | StimError::MissingRequiredField { .. }
            | StimError::InvalidField { .. }
            | StimError::ItemFamilyMismatch { .. }
            | StimError::Peripheral { .. } => Severity::Error,
        }
    }

    /// Returns true if the error halts the phase that raised it.
    ///
    /// Everything else is contained to one manifest entry, agent or vector.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StimError::ManifestOpen { .. }
                | StimError::ManifestParse { .. }
                | StimError::MissingSequencerReference(_)
                | StimError::PhaseAlreadyRun(_)
        )
    }

    /// Stable machine-readable kind, used in diagnostics and exports.
    pub fn kind(&self) -> &'static str {
        match self {
            StimError::ManifestOpen { .. } => "manifest_open",
            StimError::ManifestParse { .. } => "manifest_parse",
            StimError::InvalidManifestEntry { .. } => "invalid_manifest_entry",
            StimError::UnknownAgentType { .. } => "unknown_agent_type",
            StimError::DuplicateAgentName(_) => "duplicate_agent_name",
            StimError::MissingSequencerReference(_) => "missing_sequencer_reference",
            StimError::MissingSuiteFile { .. } => "missing_suite_file",
            StimError::SuiteParse { .. } => "suite_parse",
            StimError::UnknownVectorPrefix(_) => "unknown_vector_prefix",
            StimError::MissingRequiredField { .. } => "missing_required_field",
            StimError::InvalidField { .. } => "invalid_field",
            StimError::ItemFamilyMismatch { .. } => "item_family_mismatch",
            StimError::Peripheral { .. } => "peripheral",
            StimError::PhaseAlreadyRun(_) => "phase_already_run",
        }
    }

    /// Creates an invalid-field error.
    pub fn invalid(family: IpFamily, reason: impl std::fmt::Display) -> Self {
        Self::InvalidField {
            family,
            reason: reason.to_string(),
        }
    }
}
