//! In-order scoreboard and the activity-probe monitor that feeds it.
//!
//! A driver, monitor and scoreboard of one agent share a [`ScoreLedger`].
//! The driver appends what it drove as *expected*; the monitor appends
//! what the peripheral actually did as *observed*; the scoreboard compares
//! the two streams position by position.

use crate::agent::{Monitor, Scoreboard};
use crate::item::{IpFamily, SequenceItem};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stimkit_env::{ActivityProbe, SimKernel, TaskHandle};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct LedgerState {
    expected: Vec<SequenceItem>,
    observed: Vec<SequenceItem>,
    finalized: bool,
}

/// Shared expected/observed record of one agent.
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item the driver applied.
    pub fn expect(&self, item: SequenceItem) {
        self.inner.lock().expected.push(item);
    }

    /// Appends an item the peripheral was seen executing.
    pub fn observe(&self, item: SequenceItem) {
        self.inner.lock().observed.push(item);
    }

    pub fn expected_len(&self) -> usize {
        self.inner.lock().expected.len()
    }

    pub fn observed_len(&self) -> usize {
        self.inner.lock().observed.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.inner.lock().finalized
    }

    fn mark_finalized(&self) -> (usize, usize) {
        let mut state = self.inner.lock();
        state.finalized = true;
        (state.expected.len(), state.observed.len())
    }

    fn snapshot(&self) -> (Vec<SequenceItem>, Vec<SequenceItem>) {
        let state = self.inner.lock();
        (state.expected.clone(), state.observed.clone())
    }
}

/// Counts reported when a scoreboard is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardSummary {
    pub scoreboard: String,
    pub expected: usize,
    pub observed: usize,
}

/// One position where the expected and observed streams disagree.
///
/// `None` on either side means that stream ended early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub index: usize,
    pub expected: Option<SequenceItem>,
    pub observed: Option<SequenceItem>,
}

/// Outcome of a scoreboard comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub scoreboard: String,
    pub expected: usize,
    pub observed: usize,
    pub matched: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compares expected and observed items in order.
pub struct InOrderScoreboard {
    name: String,
    family: IpFamily,
    ledger: ScoreLedger,
}

impl InOrderScoreboard {
    pub fn new(name: impl Into<String>, family: IpFamily, ledger: ScoreLedger) -> Self {
        Self {
            name: name.into(),
            family,
            ledger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }
}

impl Scoreboard for InOrderScoreboard {
    fn push_observation(&mut self, item: SequenceItem) {
        self.ledger.observe(item);
    }

    fn finalize(&mut self) -> ScoreboardSummary {
        let (expected, observed) = self.ledger.mark_finalized();
        info!(
            scoreboard = %self.name,
            family = %self.family,
            expected,
            observed,
            "Scoreboard finalized"
        );
        ScoreboardSummary {
            scoreboard: self.name.clone(),
            expected,
            observed,
        }
    }

    fn check(&self) -> Verdict {
        let (expected, observed) = self.ledger.snapshot();
        let positions = expected.len().max(observed.len());
        let mut matched = 0;
        let mut mismatches = Vec::new();

        for index in 0..positions {
            let exp = expected.get(index);
            let obs = observed.get(index);
            match (exp, obs) {
                (Some(e), Some(o)) if e.matches(o) => matched += 1,
                _ => mismatches.push(Mismatch {
                    index,
                    expected: exp.cloned(),
                    observed: obs.cloned(),
                }),
            }
        }

        Verdict {
            scoreboard: self.name.clone(),
            expected: expected.len(),
            observed: observed.len(),
            matched,
            mismatches,
        }
    }
}

/// Monitor that drains a peripheral's activity log on the kernel.
///
/// The log is claimed when the monitor starts. The sequencer starts a
/// monitor right after its agent's vectors are driven and before the next
/// agent drives, so agents sharing one peripheral each observe only their
/// own activity.
pub struct ProbeMonitor<P: ?Sized> {
    name: String,
    family: IpFamily,
    device: Arc<P>,
    ledger: ScoreLedger,
}

impl<P: ActivityProbe + ?Sized> ProbeMonitor<P> {
    pub fn new(name: impl Into<String>, family: IpFamily, device: Arc<P>, ledger: ScoreLedger) -> Self {
        Self {
            name: name.into(),
            family,
            device,
            ledger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<P: ActivityProbe + ?Sized> Monitor for ProbeMonitor<P> {
    fn start(&mut self, kernel: &dyn SimKernel) -> TaskHandle {
        let claimed = self.device.drain_activity();
        let ledger = self.ledger.clone();
        let family = self.family;
        let name = self.name.clone();

        debug!(
            monitor = %self.name,
            at = ?kernel.now(),
            claimed = claimed.len(),
            "Starting monitor"
        );
        kernel.spawn(
            &self.name,
            Box::pin(async move {
                let mut seen = 0usize;
                for activity in claimed {
                    let item = SequenceItem::from_activity(&activity);
                    if item.family() == family {
                        ledger.observe(item);
                        seen += 1;
                    } else {
                        debug!(monitor = %name, activity = activity.label(), "Ignoring foreign activity");
                    }
                }
                debug!(monitor = %name, observed = seen, "Monitor drained bus activity");
            }),
        )
    }
}
