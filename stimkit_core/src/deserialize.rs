//! Vector decoding: IP identifier + raw JSON document -> [`SequenceItem`].
//!
//! Dispatch is a closed match over [`IpFamily`]. The identifier is resolved
//! by prefix first; an identifier outside the closed set is reported as
//! [`StimError::UnknownVectorPrefix`] and the caller drops that one vector.
//!
//! Optional fields fall back to the documented defaults:
//!
//! | Family | Field | Default |
//! |---|---|---|
//! | uart | `baud` | 115200 |
//! | uart | `parity` | false |
//! | uart | `payload` | empty |
//! | spi | `mode` | 0 |
//! | spi | `tx` | empty |
//! | dma | `len` | 0 (`src`, `dst` required) |
//! | timer | `op` | `"start"` |
//! | timer | `period_us` | 10 |
//!
//! Keys a family does not know (`op` on a uart vector, `ip`, ...) are ignored.

use crate::error::StimError;
use crate::item::{
    DmaBurst, IpFamily, SequenceItem, SpiXfer, TimerCmd, UartTx, DEFAULT_BAUD, DEFAULT_PERIOD_US,
    DEFAULT_SPI_MODE,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Decodes one raw vector for the IP called `ip`.
pub fn deserialize(ip: &str, raw: &Value) -> Result<SequenceItem, StimError> {
    let family = IpFamily::from_identifier(ip)
        .ok_or_else(|| StimError::UnknownVectorPrefix(ip.to_string()))?;
    deserialize_family(family, raw)
}

/// Decodes one raw vector for an already-resolved family.
pub fn deserialize_family(family: IpFamily, raw: &Value) -> Result<SequenceItem, StimError> {
    if !raw.is_object() {
        return Err(StimError::invalid(family, "vector is not a JSON object"));
    }

    match family {
        IpFamily::Uart => decode_uart(raw),
        IpFamily::Spi => decode_spi(raw),
        IpFamily::Dma => decode_dma(raw),
        IpFamily::Timer => decode_timer(raw),
    }
}

#[derive(Deserialize)]
struct RawUart {
    baud: Option<u32>,
    payload: Option<Vec<u8>>,
    parity: Option<RawParity>,
}

/// Parity is a flag in hand-written suites and a name in generated ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParity {
    Flag(bool),
    Named(String),
}

#[derive(Deserialize)]
struct RawSpi {
    mode: Option<u32>,
    tx: Option<Vec<u8>>,
}

#[derive(Deserialize)]
struct RawDma {
    src: Option<u64>,
    dst: Option<u64>,
    len: Option<u32>,
}

#[derive(Deserialize)]
struct RawTimer {
    op: Option<String>,
    period_us: Option<u32>,
}

fn parse<T: DeserializeOwned>(family: IpFamily, raw: &Value) -> Result<T, StimError> {
    T::deserialize(raw).map_err(|e| StimError::invalid(family, e))
}

fn decode_uart(raw: &Value) -> Result<SequenceItem, StimError> {
    let v: RawUart = parse(IpFamily::Uart, raw)?;
    let parity = match v.parity {
        None => false,
        Some(RawParity::Flag(flag)) => flag,
        Some(RawParity::Named(name)) => match name.as_str() {
            "none" => false,
            "even" | "odd" => true,
            other => {
                return Err(StimError::invalid(
                    IpFamily::Uart,
                    format!("unknown parity '{}'", other),
                ))
            }
        },
    };

    Ok(SequenceItem::Uart(UartTx {
        baud: v.baud.unwrap_or(DEFAULT_BAUD),
        payload: v.payload.unwrap_or_default(),
        parity,
    }))
}

fn decode_spi(raw: &Value) -> Result<SequenceItem, StimError> {
    let v: RawSpi = parse(IpFamily::Spi, raw)?;
    Ok(SequenceItem::Spi(SpiXfer {
        mode: v.mode.unwrap_or(DEFAULT_SPI_MODE),
        tx: v.tx.unwrap_or_default(),
    }))
}

fn decode_dma(raw: &Value) -> Result<SequenceItem, StimError> {
    let v: RawDma = parse(IpFamily::Dma, raw)?;
    let src = v.src.ok_or(StimError::MissingRequiredField {
        family: IpFamily::Dma,
        field: "src",
    })?;
    let dst = v.dst.ok_or(StimError::MissingRequiredField {
        family: IpFamily::Dma,
        field: "dst",
    })?;

    Ok(SequenceItem::Dma(DmaBurst {
        src,
        dst,
        len: v.len.unwrap_or(0),
    }))
}

fn decode_timer(raw: &Value) -> Result<SequenceItem, StimError> {
    let v: RawTimer = parse(IpFamily::Timer, raw)?;
    // Only an explicit stop stops the timer
    let start = v.op.as_deref() != Some("stop");

    Ok(SequenceItem::Timer(TimerCmd {
        start,
        period_us: v.period_us.unwrap_or(DEFAULT_PERIOD_US),
    }))
}
