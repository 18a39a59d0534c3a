//! Peripheral behavioral contracts for each IP family.

use crate::error::EnvError;
use crate::types::BusActivity;
use std::sync::Arc;

/// Read side of a peripheral model, used by monitors.
///
/// Every behavioral call a driver makes leaves one [`BusActivity`] record
/// behind. Monitors drain those records to reconstruct what the device
/// actually saw.
pub trait ActivityProbe: Send + Sync + 'static {
    /// Removes and returns all activity recorded since the last drain,
    /// oldest first.
    fn drain_activity(&self) -> Vec<BusActivity>;
}

/// UART transmitter model.
pub trait UartPeripheral: ActivityProbe {
    /// Shifts out one frame of bytes at the given baud rate.
    fn transmit(&self, baud: u32, payload: &[u8], parity: bool) -> Result<(), EnvError>;
}

/// SPI controller model.
pub trait SpiPeripheral: ActivityProbe {
    /// Performs a full-duplex transfer and returns the received bytes.
    ///
    /// # Returns
    /// * `Ok(rx)` - Bytes clocked in during the transfer (same length as `tx`)
    /// * `Err(EnvError::PeripheralError)` - Mode not supported by the device
    fn transfer(&self, mode: u32, tx: &[u8]) -> Result<Vec<u8>, EnvError>;
}

/// AXI DMA engine model.
pub trait DmaPeripheral: ActivityProbe {
    /// Issues one burst copy of `len` bytes from `src` to `dst`.
    fn burst(&self, src: u64, dst: u64, len: u32) -> Result<(), EnvError>;
}

/// Periodic timer model.
pub trait TimerPeripheral: ActivityProbe {
    /// Starts ticking with the given period.
    fn start(&self, period_us: u32) -> Result<(), EnvError>;

    /// Stops ticking. Stopping an idle timer is not an error.
    fn stop(&self) -> Result<(), EnvError>;
}

/// The set of peripheral models an agent may bind to.
///
/// A family left as `None` means the design under test has no model for it;
/// agents of that family still drive, but only emit diagnostic records.
#[derive(Clone, Default)]
pub struct PeripheralBus {
    pub uart: Option<Arc<dyn UartPeripheral>>,
    pub spi: Option<Arc<dyn SpiPeripheral>>,
    pub dma: Option<Arc<dyn DmaPeripheral>>,
    pub timer: Option<Arc<dyn TimerPeripheral>>,
}

impl PeripheralBus {
    /// Creates a bus with no peripherals attached.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Number of attached peripherals.
    pub fn attached_count(&self) -> usize {
        [
            self.uart.is_some(),
            self.spi.is_some(),
            self.dma.is_some(),
            self.timer.is_some(),
        ]
        .iter()
        .filter(|attached| **attached)
        .count()
    }
}

impl std::fmt::Debug for PeripheralBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeripheralBus")
            .field("uart", &self.uart.is_some())
            .field("spi", &self.spi.is_some())
            .field("dma", &self.dma.is_some())
            .field("timer", &self.timer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct NullDma {
        log: Mutex<Vec<BusActivity>>,
    }

    impl ActivityProbe for NullDma {
        fn drain_activity(&self) -> Vec<BusActivity> {
            std::mem::take(&mut *self.log.lock())
        }
    }

    impl DmaPeripheral for NullDma {
        fn burst(&self, src: u64, dst: u64, len: u32) -> Result<(), EnvError> {
            self.log.lock().push(BusActivity::DmaBurst { src, dst, len });
            Ok(())
        }
    }

    #[test]
    fn test_detached_bus_is_empty() {
        let bus = PeripheralBus::detached();
        assert_eq!(bus.attached_count(), 0);
        assert!(bus.dma.is_none());
    }

    #[test]
    fn test_activity_through_trait_object() {
        let dma = Arc::new(NullDma::default());
        let bus = PeripheralBus {
            dma: Some(dma.clone()),
            ..Default::default()
        };
        assert_eq!(bus.attached_count(), 1);

        let handle = bus.dma.as_ref().unwrap();
        handle.burst(0x10, 0x20, 4).unwrap();
        assert_eq!(
            handle.drain_activity(),
            vec![BusActivity::DmaBurst { src: 0x10, dst: 0x20, len: 4 }]
        );
        // Drained records are gone
        assert!(dma.drain_activity().is_empty());
    }
}
