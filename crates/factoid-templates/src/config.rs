//! Build configuration.

use crate::error::Result;
use factoid_graph::{XrefKeyMode, DEFAULT_BASE_IRI};
use serde::{Deserialize, Serialize};

/// Which template vocabulary a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Protocol {
    /// Top-level array is legacy, top-level object is current.
    #[default]
    Auto,
    Current,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertConfig {
    /// Unknown template types, unmatched participant pairs and invalid entity
    /// types become errors instead of being skipped.
    pub strict: bool,
    pub xref_key: XrefKeyMode,
    pub base_iri: String,
    pub protocol: Protocol,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            strict: false,
            xref_key: XrefKeyMode::IdOnly,
            base_iri: DEFAULT_BASE_IRI.to_string(),
            protocol: Protocol::Auto,
        }
    }
}

impl ConvertConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_xref_key(mut self, mode: XrefKeyMode) -> Self {
        self.xref_key = mode;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ConvertConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert_eq!(config.base_iri, "http://biofactoid.org/");
    }

    #[test]
    fn camel_case_keys() {
        let config = ConvertConfig::from_json_str(
            r#"{"strict": true, "xrefKey": "idAndDb", "baseIri": "urn:x:", "protocol": "legacy"}"#,
        )
        .unwrap();
        assert!(config.strict);
        assert_eq!(config.xref_key, XrefKeyMode::IdAndDb);
        assert_eq!(config.base_iri, "urn:x:");
        assert_eq!(config.protocol, Protocol::Legacy);
    }

    #[test]
    fn id_only_key_spelling() {
        let config = ConvertConfig::from_json_str(r#"{"xrefKey": "id"}"#).unwrap();
        assert_eq!(config.xref_key, XrefKeyMode::IdOnly);
    }
}
