//! Stimulus payloads, one variant per IP family.

use serde::{Deserialize, Serialize};
use stimkit_env::BusActivity;

/// Default UART baud rate when a vector omits `baud`.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default SPI mode when a vector omits `mode`.
pub const DEFAULT_SPI_MODE: u32 = 0;

/// Default timer period when a vector omits `period_us`.
pub const DEFAULT_PERIOD_US: u32 = 10;

/// The closed set of IP families the orchestrator can stimulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpFamily {
    Uart,
    Spi,
    Dma,
    Timer,
}

impl IpFamily {
    /// Every family, in a fixed order.
    pub const ALL: [IpFamily; 4] = [IpFamily::Uart, IpFamily::Spi, IpFamily::Dma, IpFamily::Timer];

    /// Identifier prefix that selects this family.
    ///
    /// No prefix is a prefix of another, so at most one family matches.
    pub fn prefix(&self) -> &'static str {
        match self {
            IpFamily::Uart => "uart",
            IpFamily::Spi => "spi",
            IpFamily::Dma => "dma",
            IpFamily::Timer => "timer",
        }
    }

    /// Key of this family's agent in the default registry.
    pub fn type_key(&self) -> &'static str {
        match self {
            IpFamily::Uart => "uart",
            IpFamily::Spi => "spi",
            IpFamily::Dma => "axi_dma",
            IpFamily::Timer => "timer",
        }
    }

    /// Resolves an IP identifier (e.g. `uart0`, `dma_ch1`) by prefix.
    pub fn from_identifier(ip: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| ip.starts_with(family.prefix()))
    }

    /// Resolves a default-registry type key (e.g. `axi_dma`).
    pub fn from_type_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.type_key() == key)
    }
}

impl std::fmt::Display for IpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// One UART transmit frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartTx {
    pub baud: u32,
    pub payload: Vec<u8>,
    pub parity: bool,
}

/// One SPI full-duplex transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiXfer {
    pub mode: u32,
    pub tx: Vec<u8>,
}

/// One DMA burst copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmaBurst {
    pub src: u64,
    pub dst: u64,
    pub len: u32,
}

/// One timer start/stop command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCmd {
    pub start: bool,
    pub period_us: u32,
}

/// A decoded stimulus vector.
///
/// Created per vector and handed straight to a driver. Only a scoreboard
/// keeps items around after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SequenceItem {
    Uart(UartTx),
    Spi(SpiXfer),
    Dma(DmaBurst),
    Timer(TimerCmd),
}

impl SequenceItem {
    /// Family this item belongs to.
    pub fn family(&self) -> IpFamily {
        match self {
            SequenceItem::Uart(_) => IpFamily::Uart,
            SequenceItem::Spi(_) => IpFamily::Spi,
            SequenceItem::Dma(_) => IpFamily::Dma,
            SequenceItem::Timer(_) => IpFamily::Timer,
        }
    }

    /// Reconstructs the item a peripheral actually executed.
    pub fn from_activity(activity: &BusActivity) -> Self {
        match activity {
            BusActivity::UartFrame {
                baud,
                payload,
                parity,
            } => SequenceItem::Uart(UartTx {
                baud: *baud,
                payload: payload.clone(),
                parity: *parity,
            }),
            BusActivity::SpiTransfer { mode, tx, .. } => SequenceItem::Spi(SpiXfer {
                mode: *mode,
                tx: tx.clone(),
            }),
            BusActivity::DmaBurst { src, dst, len } => SequenceItem::Dma(DmaBurst {
                src: *src,
                dst: *dst,
                len: *len,
            }),
            BusActivity::TimerStart { period_us } => SequenceItem::Timer(TimerCmd {
                start: true,
                period_us: *period_us,
            }),
            // A stop carries no period on the bus
            BusActivity::TimerStop => SequenceItem::Timer(TimerCmd {
                start: false,
                period_us: 0,
            }),
        }
    }

    /// Returns true if `observed` is what this expected item should produce.
    ///
    /// Equality, except that a timer stop matches any observed stop.
    pub fn matches(&self, observed: &SequenceItem) -> bool {
        match (self, observed) {
            (SequenceItem::Timer(exp), SequenceItem::Timer(obs)) if !exp.start => !obs.start,
            _ => self == observed,
        }
    }
}

impl std::fmt::Display for SequenceItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceItem::Uart(it) => write!(
                f,
                "UART TX: baud={} len={} data=\"{}\"",
                it.baud,
                it.payload.len(),
                String::from_utf8_lossy(&it.payload)
            ),
            SequenceItem::Spi(it) => write!(f, "SPI XFER: mode={} len={}", it.mode, it.tx.len()),
            SequenceItem::Dma(it) => write!(
                f,
                "DMA burst: src=0x{:x} dst=0x{:x} len={}",
                it.src, it.dst, it.len
            ),
            SequenceItem::Timer(it) => write!(
                f,
                "Timer cmd: {} period_us={}",
                if it.start { "start" } else { "stop" },
                it.period_us
            ),
        }
    }
}

macro_rules! item_conversions {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for SequenceItem {
                fn from(item: $ty) -> Self {
                    SequenceItem::$variant(item)
                }
            }

            impl TryFrom<SequenceItem> for $ty {
                type Error = SequenceItem;

                fn try_from(item: SequenceItem) -> Result<Self, Self::Error> {
                    match item {
                        SequenceItem::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

item_conversions!(Uart(UartTx), Spi(SpiXfer), Dma(DmaBurst), Timer(TimerCmd));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_resolution() {
        assert_eq!(IpFamily::from_identifier("uart0"), Some(IpFamily::Uart));
        assert_eq!(IpFamily::from_identifier("spi_flash"), Some(IpFamily::Spi));
        assert_eq!(IpFamily::from_identifier("dma0"), Some(IpFamily::Dma));
        assert_eq!(IpFamily::from_identifier("timer1"), Some(IpFamily::Timer));
        assert_eq!(IpFamily::from_identifier("gpio0"), None);
        // Type keys are not identifiers: axi_dma does not start with "dma"
        assert_eq!(IpFamily::from_identifier("axi_dma"), None);
    }

    #[test]
    fn test_prefixes_mutually_exclusive() {
        for a in IpFamily::ALL {
            for b in IpFamily::ALL {
                if a != b {
                    assert!(!a.prefix().starts_with(b.prefix()));
                }
            }
        }
    }

    #[test]
    fn test_type_keys() {
        assert_eq!(IpFamily::Dma.type_key(), "axi_dma");
        assert_eq!(IpFamily::from_type_key("axi_dma"), Some(IpFamily::Dma));
        assert_eq!(IpFamily::from_type_key("dma"), None);
    }

    #[test]
    fn test_try_from_wrong_variant_returns_item() {
        let item = SequenceItem::from(TimerCmd {
            start: true,
            period_us: 10,
        });
        let back = UartTx::try_from(item.clone()).unwrap_err();
        assert_eq!(back, item);
        assert!(TimerCmd::try_from(item).is_ok());
    }

    #[test]
    fn test_timer_stop_matches_any_stop() {
        let expected = SequenceItem::Timer(TimerCmd {
            start: false,
            period_us: 10,
        });
        let observed = SequenceItem::from_activity(&BusActivity::TimerStop);
        assert!(expected.matches(&observed));

        let started = SequenceItem::from_activity(&BusActivity::TimerStart { period_us: 10 });
        assert!(!expected.matches(&started));
    }

    #[test]
    fn test_spi_activity_drops_rx() {
        let observed = SequenceItem::from_activity(&BusActivity::SpiTransfer {
            mode: 1,
            tx: vec![1, 2],
            rx: vec![1, 2],
        });
        assert_eq!(
            observed,
            SequenceItem::Spi(SpiXfer {
                mode: 1,
                tx: vec![1, 2]
            })
        );
    }

    #[test]
    fn test_display_matches_driver_records() {
        let item = SequenceItem::Dma(DmaBurst {
            src: 0x1000,
            dst: 0x2000,
            len: 64,
        });
        assert_eq!(item.to_string(), "DMA burst: src=0x1000 dst=0x2000 len=64");

        let uart = SequenceItem::Uart(UartTx {
            baud: 9600,
            payload: vec![72, 73],
            parity: false,
        });
        assert_eq!(uart.to_string(), "UART TX: baud=9600 len=2 data=\"HI\"");
    }
}
