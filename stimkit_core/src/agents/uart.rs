//! UART agent.

use super::{IpAgent, PeripheralDriver};
use crate::agent::Driver;
use crate::error::StimError;
use crate::item::{IpFamily, UartTx};
use stimkit_env::UartPeripheral;

pub type UartDriver = PeripheralDriver<dyn UartPeripheral>;
pub type UartAgent = IpAgent<dyn UartPeripheral>;

impl Driver for UartDriver {
    type Item = UartTx;
    const FAMILY: IpFamily = IpFamily::Uart;

    fn drive(&mut self, item: UartTx) -> Result<(), StimError> {
        if let Some(device) = self.device() {
            device
                .transmit(item.baud, &item.payload, item.parity)
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
    fn test_detached_driver_records_only() {
        let mut agent = UartAgent::new("uart0_agent", None);
        agent
            .driver()
            .drive_item(SequenceItem::Uart(UartTx {
                baud: 9600,
                payload: vec![72, 73],
                parity: false,
            }))
            .unwrap();
        assert_eq!(agent.typed_driver().driven(), 1);
        assert!(!agent.typed_driver().is_bound());
    }

    #[test]
    fn test_bound_driver_transmits() {
        let devices = FakeDevices::new();
        let mut agent = UartAgent::new("uart0_agent", devices.bus().uart);
        agent
            .driver()
            .drive_item(SequenceItem::Uart(UartTx {
                baud: 115_200,
                payload: b"ok".to_vec(),
                parity: true,
            }))
            .unwrap();

        assert_eq!(
            devices.uart.calls(),
            vec![BusActivity::UartFrame {
                baud: 115_200,
                payload: b"ok".to_vec(),
                parity: true
            }]
        );
    }

    #[test]
    fn test_rejected_frame_is_not_expected() {
        let devices = FakeDevices::rejecting();
        let mut agent = UartAgent::new("uart0_agent", devices.bus().uart);
        let err = agent
            .driver()
            .drive_item(SequenceItem::Uart(UartTx {
                baud: 1,
                payload: vec![],
                parity: false,
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            StimError::Peripheral {
                family: IpFamily::Uart,
                ..
            }
        ));
        assert_eq!(agent.typed_driver().driven(), 0);
    }
}
