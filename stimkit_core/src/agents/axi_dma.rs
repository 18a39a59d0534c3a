//! AXI DMA agent.

use super::{IpAgent, PeripheralDriver};
use crate::agent::Driver;
use crate::error::StimError;
use crate::item::{DmaBurst, IpFamily};
use stimkit_env::DmaPeripheral;

pub type DmaDriver = PeripheralDriver<dyn DmaPeripheral>;
pub type DmaAgent = IpAgent<dyn DmaPeripheral>;

impl Driver for DmaDriver {
    type Item = DmaBurst;
    const FAMILY: IpFamily = IpFamily::Dma;

    fn drive(&mut self, item: DmaBurst) -> Result<(), StimError> {
        if let Some(device) = self.device() {
            device
                .burst(item.src, item.dst, item.len)
                .map_err(|source| StimError::Peripheral {
                    family: Self::FAMILY,
                    source,
                })?;
        }
        self.retire(item.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::item::SequenceItem;
    use crate::testing::FakeDevices;
    use stimkit_env::BusActivity;

    #[test]
    fn test_burst_reaches_device_and_ledger() {
        let devices = FakeDevices::new();
        let mut agent = DmaAgent::new("dma0_agent", devices.bus().dma);
        agent
            .driver()
            .drive_item(SequenceItem::Dma(DmaBurst {
                src: 0x1000,
                dst: 0x2000,
                len: 64,
            }))
            .unwrap();

        assert_eq!(
            devices.dma.calls(),
            vec![BusActivity::DmaBurst {
                src: 0x1000,
                dst: 0x2000,
                len: 64
            }]
        );
        let summary = agent.scoreboard().unwrap().finalize();
        assert_eq!(summary.expected, 1);
        assert_eq!(summary.scoreboard, "dma0_agent.scoreboard");
    }
}
