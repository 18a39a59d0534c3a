//! Declarative manifest: the list of IP instances to construct.
//!
//! ```json
//! {"ips": [{"name": "uart0", "type": "uart"}, {"name": "dma0", "type": "axi_dma"}]}
//! ```
//!
//! Only a document that is not such an object fails as a whole. A single
//! entry that is not a `name`/`type` pair is set aside in
//! [`Manifest::rejected`] and the remaining entries are kept.

use crate::error::StimError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Instance name, unique within a manifest
    pub name: String,

    /// Factory type key
    #[serde(rename = "type")]
    pub type_key: String,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, type_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_key: type_key.into(),
        }
    }
}

/// A manifest entry that could not be read as an [`AgentDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the `ips` array
    pub index: usize,
    pub reason: String,
}

impl RejectedEntry {
    pub fn to_error(&self) -> StimError {
        StimError::InvalidManifestEntry {
            index: self.index,
            reason: self.reason.clone(),
        }
    }
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    ips: Vec<Value>,
}

/// Ordered agent descriptors. Entry order is processing order downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub ips: Vec<AgentDescriptor>,

    /// Entries skipped while parsing
    #[serde(skip)]
    pub rejected: Vec<RejectedEntry>,
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, StimError> {
        let text = std::fs::read_to_string(path).map_err(|source| StimError::ManifestOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses manifest text; `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, StimError> {
        let raw: RawManifest = serde_json::from_str(text).map_err(|e| StimError::ManifestParse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut manifest = Manifest::default();
        for (index, entry) in raw.ips.into_iter().enumerate() {
            match serde_json::from_value::<AgentDescriptor>(entry) {
                Ok(descriptor) => manifest.ips.push(descriptor),
                Err(e) => manifest.rejected.push(RejectedEntry {
                    index,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(manifest)
    }

    /// Writes the manifest as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_preserves_order() {
        let manifest = Manifest::parse(
            r#"{"ips":[{"name":"uart0","type":"uart"},{"name":"bogus","type":"nope"}]}"#,
            Path::new("inline"),
        )
        .unwrap();
        assert_eq!(
            manifest.ips,
            vec![
                AgentDescriptor::new("uart0", "uart"),
                AgentDescriptor::new("bogus", "nope")
            ]
        );
    }

    #[test]
    fn test_missing_ips_is_empty() {
        let manifest = Manifest::parse("{}", Path::new("inline")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StimError::ManifestOpen { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_malformed_is_parse_error() {
        for text in [r#"{"ips": 5}"#, "[1, 2]", "{\"ips\": ["] {
            let err = Manifest::parse(text, Path::new("m.json")).unwrap_err();
            assert!(matches!(err, StimError::ManifestParse { .. }), "{}", text);
        }
    }

    #[test]
    fn test_bad_entry_is_set_aside() {
        let manifest = Manifest::parse(
            r#"{"ips":[{"name":"uart0","type":"uart"},{"name":"x"},{"name":3,"type":"spi"},"dma0",{"name":"timer0","type":"timer"}]}"#,
            Path::new("m.json"),
        )
        .unwrap();

        assert_eq!(
            manifest.ips,
            vec![
                AgentDescriptor::new("uart0", "uart"),
                AgentDescriptor::new("timer0", "timer")
            ]
        );
        let indices: Vec<usize> = manifest.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);

        let err = manifest.rejected[0].to_error();
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), "invalid_manifest_entry");
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("soc").join("manifest.json");
        let manifest = Manifest {
            ips: vec![AgentDescriptor::new("dma0", "axi_dma")],
            ..Manifest::default()
        };
        manifest.write(&path).unwrap();
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }
}
