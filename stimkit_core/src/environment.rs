//! Environment: turns the manifest into registered agents.

use crate::agent::Agent;
use crate::agents::register_defaults;
use crate::diagnostics::DiagnosticLog;
use crate::error::StimError;
use crate::factory::Factory;
use crate::lifecycle::Component;
use crate::manifest::Manifest;
use crate::sequencer::SharedSequencer;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use stimkit_env::{PeripheralBus, TaskTracker};
use tracing::{debug, info};

/// Instance name given to the agent built for manifest entry `ip`.
pub fn agent_instance_name(ip: &str) -> String {
    format!("{}_agent", ip)
}

/// Owns the agent factory and populates a sequencer from the manifest.
///
/// `build` installs the built-in agent types (unless a registry was
/// supplied with [`with_registry`](Self::with_registry)). `connect` reads
/// the manifest and registers one agent per entry, in entry order.
pub struct Environment {
    name: String,
    manifest_path: PathBuf,
    bus: PeripheralBus,
    factory: Factory<dyn Agent>,
    install_defaults: bool,
    sequencer: Option<SharedSequencer>,
    tasks: TaskTracker,
    registered: Vec<String>,
    diagnostics: DiagnosticLog,
}

impl Environment {
    pub fn new(name: impl Into<String>, manifest_path: impl Into<PathBuf>, bus: PeripheralBus) -> Self {
        Self {
            name: name.into(),
            manifest_path: manifest_path.into(),
            bus,
            factory: Factory::new(),
            install_defaults: true,
            sequencer: None,
            tasks: TaskTracker::new(),
            registered: Vec::new(),
            diagnostics: DiagnosticLog::new(),
        }
    }

    /// Replaces the factory. Built-in types are then not installed at build.
    pub fn with_registry(mut self, factory: Factory<dyn Agent>) -> Self {
        self.factory = factory;
        self.install_defaults = false;
        self
    }

    /// Sets the sequencer agents get registered into.
    pub fn attach_sequencer(&mut self, sequencer: SharedSequencer) {
        self.sequencer = Some(sequencer);
    }

    /// The agent factory, for registering custom types.
    ///
    /// Registrations made after `build` take precedence over built-ins.
    pub fn factory_mut(&mut self) -> &mut Factory<dyn Agent> {
        &mut self.factory
    }

    pub fn factory(&self) -> &Factory<dyn Agent> {
        &self.factory
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Tracker holding every monitor task started during the run.
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Manifest names registered during connect, in order.
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    /// Aborts any monitor task still running.
    pub fn shutdown(&self) -> usize {
        self.tasks.abort_all()
    }
}

impl Component for Environment {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&mut self) -> Result<(), StimError> {
        if self.install_defaults {
            register_defaults(&mut self.factory, &self.bus);
        }
        debug!(
            env = %self.name,
            types = ?self.factory.keys(),
            peripherals = self.bus.attached_count(),
            "Environment built"
        );
        Ok(())
    }

    fn connect(&mut self) -> Result<(), StimError> {
        let sequencer = self
            .sequencer
            .clone()
            .ok_or_else(|| StimError::MissingSequencerReference(self.name.clone()))?;
        let manifest = Manifest::load(&self.manifest_path)?;

        let mut seq = sequencer.lock();
        seq.attach_tracker(self.tasks.clone());

        for rejected in &manifest.rejected {
            self.diagnostics.record(self.name.as_str(), &rejected.to_error());
        }

        let mut seen = HashSet::new();
        for descriptor in &manifest.ips {
            if !seen.insert(descriptor.name.as_str()) {
                self.diagnostics.record(
                    self.name.as_str(),
                    &StimError::DuplicateAgentName(descriptor.name.clone()),
                );
                continue;
            }

            let instance = agent_instance_name(&descriptor.name);
            let Some(agent) = self.factory.create(&descriptor.type_key, &instance) else {
                self.diagnostics.record(
                    self.name.as_str(),
                    &StimError::UnknownAgentType {
                        name: descriptor.name.clone(),
                        type_key: descriptor.type_key.clone(),
                    },
                );
                continue;
            };

            seq.register_agent(&descriptor.name, agent);
            self.registered.push(descriptor.name.clone());
        }

        info!(
            env = %self.name,
            manifest = %self.manifest_path.display(),
            entries = manifest.len(),
            registered = self.registered.len(),
            "Environment connected"
        );
        Ok(())
    }
}
