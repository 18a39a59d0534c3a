//! Built-in agents, one per IP family, and the default registry.
//!
//! Every built-in agent has the same shape: an [`IpAgent`] over one
//! peripheral contract. When the [`PeripheralBus`] carries a model for the
//! family, the agent binds to it and gets a monitor and an in-order
//! scoreboard. Otherwise it drives with diagnostic records only and has no
//! passive verification.

pub mod axi_dma;
pub mod spi;
pub mod timer;
pub mod uart;

pub use axi_dma::{DmaAgent, DmaDriver};
pub use spi::{SpiAgent, SpiDriver};
pub use timer::{TimerAgent, TimerDriver};
pub use uart::{UartAgent, UartDriver};

use crate::agent::{Agent, Driver, ItemDriver, Monitor, Scoreboard};
use crate::error::StimError;
use crate::factory::Factory;
use crate::item::{IpFamily, SequenceItem};
use crate::lifecycle::Component;
use crate::scoreboard::{InOrderScoreboard, ProbeMonitor, ScoreLedger};
use std::sync::Arc;
use stimkit_env::{ActivityProbe, PeripheralBus};
use tracing::{debug, info};

/// Driver bound (or not) to a peripheral model of type `P`.
///
/// Each family implements [`Driver`] for its own instantiation, see
/// [`UartDriver`] and friends.
pub struct PeripheralDriver<P: ?Sized> {
    name: String,
    device: Option<Arc<P>>,
    ledger: Option<ScoreLedger>,
    driven: usize,
}

impl<P: ?Sized> PeripheralDriver<P> {
    pub fn new(name: impl Into<String>, device: Option<Arc<P>>, ledger: Option<ScoreLedger>) -> Self {
        Self {
            name: name.into(),
            device,
            ledger,
            driven: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items driven so far.
    pub fn driven(&self) -> usize {
        self.driven
    }

    pub fn is_bound(&self) -> bool {
        self.device.is_some()
    }

    fn device(&self) -> Option<&Arc<P>> {
        self.device.as_ref()
    }

    /// Emits the diagnostic record for a driven item and hands it to the
    /// scoreboard as expected.
    fn retire(&mut self, item: SequenceItem) {
        info!(driver = %self.name, "{}", item);
        self.driven += 1;
        if let Some(ledger) = &self.ledger {
            ledger.expect(item);
        }
    }
}

/// A built-in agent over peripheral contract `P`.
pub struct IpAgent<P: ?Sized> {
    name: String,
    driver: PeripheralDriver<P>,
    monitor: Option<ProbeMonitor<P>>,
    scoreboard: Option<InOrderScoreboard>,
}

impl<P> IpAgent<P>
where
    P: ActivityProbe + ?Sized,
    PeripheralDriver<P>: Driver,
{
    /// Assembles the agent. Monitor and scoreboard exist only when `device`
    /// is present.
    pub fn new(name: &str, device: Option<Arc<P>>) -> Self {
        let family = <PeripheralDriver<P> as Driver>::FAMILY;
        let driver_name = format!("{}.driver", name);

        match device {
            Some(device) => {
                let ledger = ScoreLedger::new();
                let driver =
                    PeripheralDriver::new(driver_name, Some(Arc::clone(&device)), Some(ledger.clone()));
                let monitor =
                    ProbeMonitor::new(format!("{}.monitor", name), family, device, ledger.clone());
                let scoreboard =
                    InOrderScoreboard::new(format!("{}.scoreboard", name), family, ledger);
                Self {
                    name: name.to_string(),
                    driver,
                    monitor: Some(monitor),
                    scoreboard: Some(scoreboard),
                }
            }
            None => Self {
                name: name.to_string(),
                driver: PeripheralDriver::new(driver_name, None, None),
                monitor: None,
                scoreboard: None,
            },
        }
    }

    /// The typed driver.
    pub fn typed_driver(&self) -> &PeripheralDriver<P> {
        &self.driver
    }
}

impl<P> Component for IpAgent<P>
where
    P: ActivityProbe + ?Sized,
    PeripheralDriver<P>: Driver,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<(), StimError> {
        debug!(
            agent = %self.name,
            bound = self.driver.is_bound(),
            "Agent connected"
        );
        Ok(())
    }

    fn report(&mut self) -> Result<(), StimError> {
        info!(agent = %self.name, driven = self.driver.driven(), "Agent report");
        Ok(())
    }
}

impl<P> Agent for IpAgent<P>
where
    P: ActivityProbe + ?Sized,
    PeripheralDriver<P>: Driver,
{
    fn family(&self) -> IpFamily {
        <PeripheralDriver<P> as Driver>::FAMILY
    }

    fn driver(&mut self) -> &mut dyn ItemDriver {
        &mut self.driver
    }

    fn monitor(&mut self) -> Option<&mut dyn Monitor> {
        self.monitor.as_mut().map(|m| m as &mut dyn Monitor)
    }

    fn scoreboard(&mut self) -> Option<&mut dyn Scoreboard> {
        self.scoreboard.as_mut().map(|s| s as &mut dyn Scoreboard)
    }
}

/// Registers the four built-in agent types under their family type keys
/// (`uart`, `spi`, `axi_dma`, `timer`), bound to the models on `bus`.
pub fn register_defaults(factory: &mut Factory<dyn Agent>, bus: &PeripheralBus) {
    let uart = bus.uart.clone();
    factory.register(IpFamily::Uart.type_key(), move |name| {
        Box::new(UartAgent::new(name, uart.clone()))
    });

    let spi = bus.spi.clone();
    factory.register(IpFamily::Spi.type_key(), move |name| {
        Box::new(SpiAgent::new(name, spi.clone()))
    });

    let dma = bus.dma.clone();
    factory.register(IpFamily::Dma.type_key(), move |name| {
        Box::new(DmaAgent::new(name, dma.clone()))
    });

    let timer = bus.timer.clone();
    factory.register(IpFamily::Timer.type_key(), move |name| {
        Box::new(TimerAgent::new(name, timer.clone()))
    });
}

/// A factory holding only the built-in agent types.
pub fn default_registry(bus: &PeripheralBus) -> Factory<dyn Agent> {
    let mut factory = Factory::new();
    register_defaults(&mut factory, bus);
    factory
}
