//! Agent capability model: driver, optional monitor, optional scoreboard.

use crate::error::StimError;
use crate::item::{IpFamily, SequenceItem};
use crate::lifecycle::Component;
use crate::scoreboard::{ScoreboardSummary, Verdict};
use stimkit_env::{SimKernel, TaskHandle};

/// Applies one stimulus item of a single family.
///
/// `drive` is synchronous and never suspends. Its effect is a diagnostic
/// record, a call into the bound peripheral model, or both.
pub trait Driver: Send {
    /// The item variant this driver accepts.
    type Item: TryFrom<SequenceItem, Error = SequenceItem> + Into<SequenceItem>;

    /// Family of `Item`.
    const FAMILY: IpFamily;

    fn drive(&mut self, item: Self::Item) -> Result<(), StimError>;
}

/// Object-safe view of a [`Driver`] that accepts any [`SequenceItem`].
///
/// Items of the wrong family are refused with
/// [`StimError::ItemFamilyMismatch`] instead of being reinterpreted.
pub trait ItemDriver: Send {
    fn family(&self) -> IpFamily;

    fn drive_item(&mut self, item: SequenceItem) -> Result<(), StimError>;
}

impl<D: Driver> ItemDriver for D {
    fn family(&self) -> IpFamily {
        D::FAMILY
    }

    fn drive_item(&mut self, item: SequenceItem) -> Result<(), StimError> {
        let actual = item.family();
        let typed = D::Item::try_from(item).map_err(|_| StimError::ItemFamilyMismatch {
            expected: D::FAMILY,
            actual,
        })?;
        self.drive(typed)
    }
}

/// Passive observer of peripheral activity.
pub trait Monitor: Send {
    /// Launches observation on the kernel and returns the task handle.
    ///
    /// The caller does not wait for the task.
    fn start(&mut self, kernel: &dyn SimKernel) -> TaskHandle;
}

/// Collects expected and observed items and produces a verdict.
pub trait Scoreboard: Send {
    /// Adds one observed item.
    fn push_observation(&mut self, item: SequenceItem);

    /// Closes the expected stream and reports what was collected so far.
    fn finalize(&mut self) -> ScoreboardSummary;

    /// Compares expected against observed.
    fn check(&self) -> Verdict;
}

/// A capability bundle for one IP instance.
///
/// `driver()` is always available. `monitor()` and `scoreboard()` return
/// `None` when the agent has no passive verification, so every caller has
/// to handle that case.
pub trait Agent: Component {
    fn family(&self) -> IpFamily;

    fn driver(&mut self) -> &mut dyn ItemDriver;

    fn monitor(&mut self) -> Option<&mut dyn Monitor> {
        None
    }

    fn scoreboard(&mut self) -> Option<&mut dyn Scoreboard> {
        None
    }
}
