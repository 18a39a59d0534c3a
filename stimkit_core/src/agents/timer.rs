//! Timer agent.

use super::{IpAgent, PeripheralDriver};
use crate::agent::Driver;
use crate::error::StimError;
use crate::item::{IpFamily, TimerCmd};
use stimkit_env::TimerPeripheral;

pub type TimerDriver = PeripheralDriver<dyn TimerPeripheral>;
pub type TimerAgent = IpAgent<dyn TimerPeripheral>;

impl Driver for TimerDriver {
    type Item = TimerCmd;
    const FAMILY: IpFamily = IpFamily::Timer;

    fn drive(&mut self, item: TimerCmd) -> Result<(), StimError> {
        if let Some(device) = self.device() {
            let result = if item.start {
                device.start(item.period_us)
            } else {
                device.stop()
            };
            result.map_err(|source| StimError::Peripheral {
                family: Self::FAMILY,
                source,
            })?;
        }
        self.retire(item.into());
        Ok(())
    }
}
