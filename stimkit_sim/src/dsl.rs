//! Test DSL -> suite generator.
//!
//! The DSL is a YAML document with an `ips` mapping from instance name to a
//! family-specific spec. The family is inferred from the instance name's
//! prefix:
//!
//! ```yaml
//! ips:
//!   uart0:
//!     baud: 9600
//!     send: ["HI", "OK"]
//!   spi0:
//!     mode: 1
//!     transfers:
//!       - tx: [1, 2, 3]
//!   dma0:
//!     bursts:
//!       - { src: 4096, dst: 8192, len: 64 }
//!   timer0:
//!     period_us: 20
//! ```
//!
//! Each instance becomes `<out>/<name>/suite.json`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use stimkit_core::{suite_path, AgentDescriptor, IpFamily, Manifest, Suite};
use thiserror::Error;
use tracing::info;

/// Default UART parity name written into generated vectors.
pub const DEFAULT_PARITY: &str = "none";

#[derive(Debug, Error)]
pub enum DslError {
    #[error("Failed to read DSL {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed DSL: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cannot infer IP type for {0}")]
    UnknownPrefix(String),

    #[error("Invalid spec for {ip}: {reason}")]
    InvalidSpec { ip: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct DslDoc {
    #[serde(default)]
    ips: serde_yaml::Mapping,
}

#[derive(Debug, Default, Deserialize)]
struct UartSpec {
    #[serde(default)]
    send: Vec<String>,
    baud: Option<u32>,
    parity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpiSpec {
    mode: Option<u32>,
    #[serde(default)]
    transfers: Vec<SpiTransfer>,
}

#[derive(Debug, Deserialize)]
struct SpiTransfer {
    #[serde(default)]
    tx: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct DmaSpec {
    #[serde(default)]
    bursts: Vec<DmaBurstSpec>,
}

#[derive(Debug, Deserialize)]
struct DmaBurstSpec {
    src: u64,
    dst: u64,
    len: u32,
}

#[derive(Debug, Default, Deserialize)]
struct TimerSpec {
    start: Option<bool>,
    period_us: Option<u32>,
}

/// One generated suite, not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSuite {
    pub name: String,
    pub family: IpFamily,
    pub suite: Suite,
}

/// Generates one suite per instance of the DSL document, in document order.
pub fn generate(dsl: &str) -> Result<Vec<GeneratedSuite>, DslError> {
    let doc: DslDoc = serde_yaml::from_str(dsl)?;
    let mut suites = Vec::with_capacity(doc.ips.len());

    for (key, spec) in &doc.ips {
        let name = match key {
            serde_yaml::Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)?.trim().to_string(),
        };
        let family =
            IpFamily::from_identifier(&name).ok_or_else(|| DslError::UnknownPrefix(name.clone()))?;

        let vectors = match family {
            IpFamily::Uart => uart_vectors(&parse_spec(&name, spec)?),
            IpFamily::Spi => spi_vectors(&parse_spec(&name, spec)?),
            IpFamily::Dma => dma_vectors(&parse_spec(&name, spec)?),
            IpFamily::Timer => timer_vectors(&parse_spec(&name, spec)?),
        };

        suites.push(GeneratedSuite {
            suite: Suite {
                ip: Some(name.clone()),
                type_key: Some(family.type_key().to_string()),
                vectors,
            },
            name,
            family,
        });
    }
    Ok(suites)
}

/// An empty spec (`uart0:` with nothing under it) means all defaults.
fn parse_spec<T: DeserializeOwned + Default>(ip: &str, spec: &serde_yaml::Value) -> Result<T, DslError> {
    if spec.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(spec.clone()).map_err(|e| DslError::InvalidSpec {
        ip: ip.to_string(),
        reason: e.to_string(),
    })
}

fn uart_vectors(spec: &UartSpec) -> Vec<Value> {
    let baud = spec.baud.unwrap_or(stimkit_core::item::DEFAULT_BAUD);
    let parity = spec.parity.as_deref().unwrap_or(DEFAULT_PARITY);
    spec.send
        .iter()
        .map(|s| json!({"op": "tx", "baud": baud, "parity": parity, "payload": s.as_bytes()}))
        .collect()
}

fn spi_vectors(spec: &SpiSpec) -> Vec<Value> {
    let mode = spec.mode.unwrap_or(stimkit_core::item::DEFAULT_SPI_MODE);
    spec.transfers
        .iter()
        .map(|t| json!({"op": "xfer", "mode": mode, "tx": t.tx}))
        .collect()
}

fn dma_vectors(spec: &DmaSpec) -> Vec<Value> {
    spec.bursts
        .iter()
        .map(|b| json!({"op": "burst", "len": b.len, "src": b.src, "dst": b.dst}))
        .collect()
}

fn timer_vectors(spec: &TimerSpec) -> Vec<Value> {
    let op = if spec.start.unwrap_or(true) { "start" } else { "stop" };
    let period = spec.period_us.unwrap_or(stimkit_core::item::DEFAULT_PERIOD_US);
    vec![json!({"op": op, "period_us": period})]
}

/// Manifest listing every generated instance under its default type key.
pub fn manifest_for(suites: &[GeneratedSuite]) -> Manifest {
    Manifest {
        ips: suites
            .iter()
            .map(|g| AgentDescriptor::new(&g.name, g.family.type_key()))
            .collect(),
        ..Manifest::default()
    }
}

/// Writes each suite to `<out>/<name>/suite.json`; returns the paths.
pub fn write_suites(suites: &[GeneratedSuite], out: &Path) -> Result<Vec<PathBuf>, DslError> {
    suites
        .iter()
        .map(|g| {
            let path = suite_path(out, &g.name);
            g.suite.write(&path).map_err(|source| DslError::Write {
                path: path.clone(),
                source,
            })?;
            Ok(path)
        })
        .collect()
}

/// Reads `dsl`, writes the suites under `out` and, if asked, a manifest.
pub fn generate_from_file(
    dsl: &Path,
    out: &Path,
    manifest: Option<&Path>,
) -> Result<Vec<GeneratedSuite>, DslError> {
    let text = std::fs::read_to_string(dsl).map_err(|source| DslError::Read {
        path: dsl.to_path_buf(),
        source,
    })?;
    let suites = generate(&text)?;
    write_suites(&suites, out)?;

    if let Some(path) = manifest {
        manifest_for(&suites)
            .write(path)
            .map_err(|source| DslError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }

    let names: Vec<&str> = suites.iter().map(|g| g.name.as_str()).collect();
    info!(out = %out.display(), "Generated tests for: {}", names.join(", "));
    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stimkit_core::{deserialize, SequenceItem, TimerCmd, UartTx};
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
ips:
  uart0:
    baud: 9600
    send: ["HI", "OK"]
  spi0:
    transfers:
      - tx: [1, 2, 3]
      - {}
  dma0:
    bursts:
      - { src: 4096, dst: 8192, len: 64 }
  timer0:
"#;

    #[test]
    fn test_generate_keeps_document_order() {
        let suites = generate(SAMPLE).unwrap();
        let names: Vec<&str> = suites.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["uart0", "spi0", "dma0", "timer0"]);
        assert_eq!(suites[2].suite.type_key.as_deref(), Some("axi_dma"));
    }

    #[test]
    fn test_generated_vectors_shape() {
        let suites = generate(SAMPLE).unwrap();
        assert_eq!(
            suites[0].suite.vectors[0],
            json!({"op": "tx", "baud": 9600, "parity": "none", "payload": [72, 73]})
        );
        assert_eq!(suites[1].suite.vectors[1], json!({"op": "xfer", "mode": 0, "tx": []}));
        assert_eq!(
            suites[2].suite.vectors,
            vec![json!({"op": "burst", "len": 64, "src": 4096, "dst": 8192})]
        );
        assert_eq!(suites[3].suite.vectors, vec![json!({"op": "start", "period_us": 10})]);
    }

    #[test]
    fn test_generated_vectors_decode() {
        let suites = generate(SAMPLE).unwrap();
        let uart = deserialize("uart0", &suites[0].suite.vectors[1]).unwrap();
        assert_eq!(
            uart,
            SequenceItem::Uart(UartTx {
                baud: 9600,
                payload: b"OK".to_vec(),
                parity: false
            })
        );
        let timer = deserialize("timer0", &suites[3].suite.vectors[0]).unwrap();
        assert_eq!(
            timer,
            SequenceItem::Timer(TimerCmd {
                start: true,
                period_us: 10
            })
        );
    }

    #[test]
    fn test_timer_stop() {
        let suites = generate("ips:\n  timer1:\n    start: false\n    period_us: 5\n").unwrap();
        assert_eq!(suites[0].suite.vectors, vec![json!({"op": "stop", "period_us": 5})]);
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let err = generate("ips:\n  gpio0:\n    pins: [1]\n").unwrap_err();
        assert!(matches!(err, DslError::UnknownPrefix(ref n) if n == "gpio0"));
    }

    #[test]
    fn test_dma_burst_requires_all_fields() {
        let err = generate("ips:\n  dma0:\n    bursts:\n      - { src: 1, len: 4 }\n").unwrap_err();
        assert!(matches!(err, DslError::InvalidSpec { ref ip, .. } if ip == "dma0"));
    }

    #[test]
    fn test_generate_from_file_writes_suites_and_manifest() {
        let dir = tempdir().unwrap();
        let dsl = dir.path().join("test.yaml");
        std::fs::write(&dsl, SAMPLE).unwrap();
        let out = dir.path().join("tests/generated");
        let manifest_path = dir.path().join("soc/manifest.json");

        let suites = generate_from_file(&dsl, &out, Some(manifest_path.as_path())).unwrap();
        assert_eq!(suites.len(), 4);

        let (_, loaded) = Suite::load(&out, "dma0").unwrap();
        assert_eq!(loaded, suites[2].suite);

        let manifest = Manifest::load(&manifest_path).unwrap();
        assert_eq!(manifest.ips[2], AgentDescriptor::new("dma0", "axi_dma"));
    }

    #[test]
    fn test_missing_dsl_file() {
        let dir = tempdir().unwrap();
        let err = generate_from_file(&dir.path().join("nope.yaml"), dir.path(), None).unwrap_err();
        assert!(matches!(err, DslError::Read { .. }));
    }
}
