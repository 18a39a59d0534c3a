//! SPI agent.

use super::{IpAgent, PeripheralDriver};
use crate::agent::Driver;
use crate::error::StimError;
use crate::item::{IpFamily, SpiXfer};
use stimkit_env::SpiPeripheral;
use tracing::debug;

pub type SpiDriver = PeripheralDriver<dyn SpiPeripheral>;
pub type SpiAgent = IpAgent<dyn SpiPeripheral>;

impl Driver for SpiDriver {
    type Item = SpiXfer;
    const FAMILY: IpFamily = IpFamily::Spi;

    fn drive(&mut self, item: SpiXfer) -> Result<(), StimError> {
        if let Some(device) = self.device() {
            let rx = device
                .transfer(item.mode, &item.tx)
                .map_err(|source| StimError::Peripheral {
                    family: Self::FAMILY,
                    source,
                })?;
            debug!(driver = %self.name(), rx = ?rx, "SPI transfer completed");
        }
        self.retire(item.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::item::{SequenceItem, UartTx};
    use crate::testing::FakeDevices;
    use stimkit_env::BusActivity;

    #[test]
    fn test_bound_driver_transfers() {
        let devices = FakeDevices::new();
        let mut agent = SpiAgent::new("spi0_agent", devices.bus().spi);
        agent
            .driver()
            .drive_item(SequenceItem::Spi(SpiXfer {
                mode: 2,
                tx: vec![0xA5],
            }))
            .unwrap();
        assert_eq!(
            devices.spi.calls(),
            vec![BusActivity::SpiTransfer {
                mode: 2,
                tx: vec![0xA5],
                rx: vec![0xA5]
            }]
        );
    }

    #[test]
    fn test_uart_item_refused() {
        let mut agent = SpiAgent::new("spi0_agent", None);
        let err = agent
            .driver()
            .drive_item(SequenceItem::Uart(UartTx {
                baud: 9600,
                payload: vec![],
                parity: false,
            }))
            .unwrap_err();
        assert!(matches!(err, StimError::ItemFamilyMismatch { .. }));
        assert_eq!(agent.typed_driver().driven(), 0);
    }
}
