//! Behavioral SoC model: the device side of the bench.
//!
//! Four instances, `uart0`, `spi0`, `dma0` and `timer0`, each implementing
//! its peripheral contract and keeping an activity log for monitors.

use parking_lot::Mutex;
use std::sync::Arc;
use stimkit_env::{
    ActivityProbe, BusActivity, DmaPeripheral, EnvError, PeripheralBus, SpiPeripheral,
    TimerPeripheral, UartPeripheral,
};
use tracing::info;

/// Highest SPI mode (CPOL/CPHA combination) the controller supports.
pub const MAX_SPI_MODE: u32 = 3;

#[derive(Debug, Default)]
struct ActivityLog {
    pending: Mutex<Vec<BusActivity>>,
}

impl ActivityLog {
    fn push(&self, activity: BusActivity) {
        self.pending.lock().push(activity);
    }

    fn drain(&self) -> Vec<BusActivity> {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// UART transmitter that keeps every frame it sent.
#[derive(Debug)]
pub struct UartModel {
    name: String,
    frames: Mutex<Vec<Vec<u8>>>,
    activity: ActivityLog,
}

impl UartModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Mutex::new(Vec::new()),
            activity: ActivityLog::default(),
        }
    }

    /// Payloads transmitted so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }
}

impl ActivityProbe for UartModel {
    fn drain_activity(&self) -> Vec<BusActivity> {
        self.activity.drain()
    }
}

impl UartPeripheral for UartModel {
    fn transmit(&self, baud: u32, payload: &[u8], parity: bool) -> Result<(), EnvError> {
        if baud == 0 {
            return Err(EnvError::peripheral(format!("{}: baud rate must be non-zero", self.name)));
        }
        self.frames.lock().push(payload.to_vec());
        self.activity.push(BusActivity::UartFrame {
            baud,
            payload: payload.to_vec(),
            parity,
        });
        Ok(())
    }
}

/// SPI controller wired in loopback: every transfer receives what it sent.
#[derive(Debug)]
pub struct SpiModel {
    name: String,
    mode: Mutex<u32>,
    activity: ActivityLog,
}

impl SpiModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: Mutex::new(0),
            activity: ActivityLog::default(),
        }
    }

    /// Mode of the last accepted transfer.
    pub fn mode(&self) -> u32 {
        *self.mode.lock()
    }
}

impl ActivityProbe for SpiModel {
    fn drain_activity(&self) -> Vec<BusActivity> {
        self.activity.drain()
    }
}

impl SpiPeripheral for SpiModel {
    fn transfer(&self, mode: u32, tx: &[u8]) -> Result<Vec<u8>, EnvError> {
        if mode > MAX_SPI_MODE {
            return Err(EnvError::peripheral(format!(
                "{}: unsupported SPI mode {}",
                self.name, mode
            )));
        }
        *self.mode.lock() = mode;
        let rx = tx.to_vec();
        self.activity.push(BusActivity::SpiTransfer {
            mode,
            tx: tx.to_vec(),
            rx: rx.clone(),
        });
        Ok(rx)
    }
}

/// Last command issued to the DMA engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DmaCommand {
    pub src: u64,
    pub dst: u64,
    pub len: u32,
}

/// AXI DMA engine that remembers its last burst.
#[derive(Debug)]
pub struct DmaModel {
    name: String,
    last: Mutex<Option<DmaCommand>>,
    bursts: Mutex<u64>,
    activity: ActivityLog,
}

impl DmaModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last: Mutex::new(None),
            bursts: Mutex::new(0),
            activity: ActivityLog::default(),
        }
    }

    pub fn last_command(&self) -> Option<DmaCommand> {
        *self.last.lock()
    }

    pub fn bursts(&self) -> u64 {
        *self.bursts.lock()
    }
}

impl ActivityProbe for DmaModel {
    fn drain_activity(&self) -> Vec<BusActivity> {
        self.activity.drain()
    }
}

impl DmaPeripheral for DmaModel {
    fn burst(&self, src: u64, dst: u64, len: u32) -> Result<(), EnvError> {
        *self.last.lock() = Some(DmaCommand { src, dst, len });
        *self.bursts.lock() += 1;
        info!(device = %self.name, "DMA burst: src=0x{:x} dst=0x{:x} len={}", src, dst, len);
        self.activity.push(BusActivity::DmaBurst { src, dst, len });
        Ok(())
    }
}

/// Snapshot of the timer registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub running: bool,
    pub period_us: u32,
}

/// Periodic timer with a start/stop control.
#[derive(Debug)]
pub struct TimerModel {
    name: String,
    state: Mutex<TimerState>,
    activity: ActivityLog,
}

impl TimerModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(TimerState {
                running: false,
                period_us: 10,
            }),
            activity: ActivityLog::default(),
        }
    }

    pub fn state(&self) -> TimerState {
        *self.state.lock()
    }
}

impl ActivityProbe for TimerModel {
    fn drain_activity(&self) -> Vec<BusActivity> {
        self.activity.drain()
    }
}

impl TimerPeripheral for TimerModel {
    fn start(&self, period_us: u32) -> Result<(), EnvError> {
        if period_us == 0 {
            return Err(EnvError::peripheral(format!("{}: period must be non-zero", self.name)));
        }
        *self.state.lock() = TimerState {
            running: true,
            period_us,
        };
        info!(device = %self.name, period_us, "Timer started");
        self.activity.push(BusActivity::TimerStart { period_us });
        Ok(())
    }

    fn stop(&self) -> Result<(), EnvError> {
        self.state.lock().running = false;
        info!(device = %self.name, "Timer stopped");
        self.activity.push(BusActivity::TimerStop);
        Ok(())
    }
}

/// The design under test: one instance of every IP family.
#[derive(Debug, Clone)]
pub struct SocModel {
    pub uart0: Arc<UartModel>,
    pub spi0: Arc<SpiModel>,
    pub dma0: Arc<DmaModel>,
    pub timer0: Arc<TimerModel>,
}

impl SocModel {
    pub fn new() -> Self {
        Self {
            uart0: Arc::new(UartModel::new("uart0")),
            spi0: Arc::new(SpiModel::new("spi0")),
            dma0: Arc::new(DmaModel::new("dma0")),
            timer0: Arc::new(TimerModel::new("timer0")),
        }
    }

    /// Peripheral bus exposing every instance to the agents.
    pub fn bus(&self) -> PeripheralBus {
        PeripheralBus {
            uart: Some(self.uart0.clone()),
            spi: Some(self.spi0.clone()),
            dma: Some(self.dma0.clone()),
            timer: Some(self.timer0.clone()),
        }
    }
}

impl Default for SocModel {
    fn default() -> Self {
        Self::new()
    }
}
