//! Test doubles shared by the unit tests of this crate.

use crate::agent::{Agent, ItemDriver};
use crate::error::StimError;
use crate::item::{IpFamily, SequenceItem};
use crate::lifecycle::Component;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use stimkit_env::{
    ActivityProbe, BusActivity, DmaPeripheral, EnvError, PeripheralBus, SpiPeripheral,
    TimerPeripheral, UartPeripheral,
};

/// Peripheral model that accepts (or rejects) every call and records it.
#[derive(Default)]
pub struct FakeDevice {
    pending: Mutex<Vec<BusActivity>>,
    calls: Mutex<Vec<BusActivity>>,
    reject: bool,
}

impl FakeDevice {
    fn apply(&self, activity: BusActivity) -> Result<(), EnvError> {
        if self.reject {
            return Err(EnvError::peripheral(format!("rejected {}", activity.label())));
        }
        self.calls.lock().push(activity.clone());
        self.pending.lock().push(activity);
        Ok(())
    }

    /// Every accepted call, never drained.
    pub fn calls(&self) -> Vec<BusActivity> {
        self.calls.lock().clone()
    }
}

impl ActivityProbe for FakeDevice {
    fn drain_activity(&self) -> Vec<BusActivity> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl UartPeripheral for FakeDevice {
    fn transmit(&self, baud: u32, payload: &[u8], parity: bool) -> Result<(), EnvError> {
        self.apply(BusActivity::UartFrame {
            baud,
            payload: payload.to_vec(),
            parity,
        })
    }
}

impl SpiPeripheral for FakeDevice {
    fn transfer(&self, mode: u32, tx: &[u8]) -> Result<Vec<u8>, EnvError> {
        self.apply(BusActivity::SpiTransfer {
            mode,
            tx: tx.to_vec(),
            rx: tx.to_vec(),
        })?;
        Ok(tx.to_vec())
    }
}

impl DmaPeripheral for FakeDevice {
    fn burst(&self, src: u64, dst: u64, len: u32) -> Result<(), EnvError> {
        self.apply(BusActivity::DmaBurst { src, dst, len })
    }
}

impl TimerPeripheral for FakeDevice {
    fn start(&self, period_us: u32) -> Result<(), EnvError> {
        self.apply(BusActivity::TimerStart { period_us })
    }

    fn stop(&self) -> Result<(), EnvError> {
        self.apply(BusActivity::TimerStop)
    }
}

/// One fake device per family.
pub struct FakeDevices {
    pub uart: Arc<FakeDevice>,
    pub spi: Arc<FakeDevice>,
    pub dma: Arc<FakeDevice>,
    pub timer: Arc<FakeDevice>,
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::with_reject(false)
    }

    pub fn rejecting() -> Self {
        Self::with_reject(true)
    }

    fn with_reject(reject: bool) -> Self {
        let make = || {
            Arc::new(FakeDevice {
                reject,
                ..FakeDevice::default()
            })
        };
        Self {
            uart: make(),
            spi: make(),
            dma: make(),
            timer: make(),
        }
    }

    pub fn bus(&self) -> PeripheralBus {
        PeripheralBus {
            uart: Some(self.uart.clone()),
            spi: Some(self.spi.clone()),
            dma: Some(self.dma.clone()),
            timer: Some(self.timer.clone()),
        }
    }
}

/// Shared record of `(agent, item)` pairs in the order they were driven.
pub type DriveLog = Arc<Mutex<Vec<(String, SequenceItem)>>>;

struct RecordingDriver {
    agent: String,
    family: IpFamily,
    log: DriveLog,
}

impl ItemDriver for RecordingDriver {
    fn family(&self) -> IpFamily {
        self.family
    }

    fn drive_item(&mut self, item: SequenceItem) -> Result<(), StimError> {
        self.log.lock().push((self.agent.clone(), item));
        Ok(())
    }
}

/// Agent that drives any family into a shared [`DriveLog`].
pub struct RecordingAgent {
    name: String,
    driver: RecordingDriver,
}

impl RecordingAgent {
    pub fn new(name: &str, family: IpFamily, log: DriveLog) -> Self {
        Self {
            name: name.to_string(),
            driver: RecordingDriver {
                agent: name.to_string(),
                family,
                log,
            },
        }
    }
}

impl Component for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Agent for RecordingAgent {
    fn family(&self) -> IpFamily {
        self.driver.family
    }

    fn driver(&mut self) -> &mut dyn ItemDriver {
        &mut self.driver
    }
}

/// Writes `<root>/<agent>/suite.json` holding `vectors`.
pub fn write_suite(root: &Path, agent: &str, vectors: Value) {
    let dir = root.join(agent);
    std::fs::create_dir_all(&dir).unwrap();
    let doc = serde_json::json!({ "ip": agent, "vectors": vectors });
    std::fs::write(dir.join("suite.json"), doc.to_string()).unwrap();
}

/// Writes a manifest file from `(name, type)` pairs and returns its path.
pub fn write_manifest(root: &Path, entries: &[(&str, &str)]) -> std::path::PathBuf {
    let ips: Vec<Value> = entries
        .iter()
        .map(|(name, ty)| serde_json::json!({ "name": name, "type": ty }))
        .collect();
    let path = root.join("manifest.json");
    std::fs::write(&path, serde_json::json!({ "ips": ips }).to_string()).unwrap();
    path
}
