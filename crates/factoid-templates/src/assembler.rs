//! Document assembly: run every template of a document against one graph.

use crate::config::{ConvertConfig, Protocol};
use crate::descriptor::XrefDescriptor;
use crate::error::{ConvertError, Result};
use crate::handlers::{self, Outcome};
use crate::template::{Template, TemplateKind};
use factoid_graph::{write_biopax_xml, Graph, WriterOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A template that was not turned into graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTemplate {
    /// Position in the document's template list.
    pub index: usize,
    pub template_type: String,
    pub reason: String,
}

/// What happened to each template of the documents added so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub applied: usize,
    /// Type outside the vocabulary.
    pub unknown: Vec<SkippedTemplate>,
    /// An entity descriptor with an invalid type.
    pub invalid: Vec<SkippedTemplate>,
    /// Participant classes with no construction.
    pub dropped: Vec<SkippedTemplate>,
}

impl BuildReport {
    pub fn skipped(&self) -> usize {
        self.unknown.len() + self.invalid.len() + self.dropped.len()
    }
}

/// Owns the graph of one build and feeds documents into it.
#[derive(Debug)]
pub struct Converter {
    graph: Graph,
    config: ConvertConfig,
    report: BuildReport,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertConfig::default())
    }
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            graph: Graph::with_xref_key_mode(config.xref_key),
            config,
            report: BuildReport::default(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn into_parts(self) -> (Graph, BuildReport) {
        (self.graph, self.report)
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn add_json_str(&mut self, json: &str) -> Result<()> {
        let document: Value = serde_json::from_str(json)?;
        self.add_document(&document)
    }

    /// Process every template of `document` in order, then attach its
    /// publication if it has one.
    pub fn add_document(&mut self, document: &Value) -> Result<()> {
        let legacy = match (self.config.protocol, document) {
            (Protocol::Legacy, _) | (Protocol::Auto, Value::Array(_)) => true,
            (Protocol::Current, _) | (Protocol::Auto, _) => false,
        };

        let templates = if legacy {
            document.as_array()
        } else {
            document.get("interactions").and_then(Value::as_array)
        }
        .ok_or_else(|| {
            ConvertError::malformed(
                "document",
                if legacy {
                    "a legacy document must be an array of templates"
                } else {
                    "expected an object with an `interactions` array"
                },
            )
        })?;

        for (index, value) in templates.iter().enumerate() {
            self.add_template(index, value, legacy)?;
        }

        if !legacy {
            if let Some(publication) = document.get("publication").filter(|v| !v.is_null()) {
                let xref = XrefDescriptor::deserialize(publication)
                    .map_err(|e| ConvertError::malformed("publication", e.to_string()))?;
                self.graph.set_publication(&xref.id, xref.db.as_deref());
            }
        }
        Ok(())
    }

    fn add_template(&mut self, index: usize, value: &Value, legacy: bool) -> Result<()> {
        let type_str = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ConvertError::malformed(format!("#{index}"), "missing `type` string"))?;

        let skipped = |reason: String| SkippedTemplate {
            index,
            template_type: type_str.to_string(),
            reason,
        };

        let Some(kind) = TemplateKind::lookup(type_str, legacy) else {
            if self.config.strict {
                return Err(ConvertError::UnknownTemplateType(type_str.to_string()));
            }
            tracing::warn!(index, template = %type_str, "unknown template type; skipping");
            self.report
                .unknown
                .push(skipped("unknown template type".to_string()));
            return Ok(());
        };

        let template = Template::parse(kind, value)?;
        if let Err(err) = template.validate() {
            if !err.is_recoverable() || self.config.strict {
                return Err(err);
            }
            tracing::warn!(index, template = %kind, error = %err, "skipping template");
            self.report.invalid.push(skipped(err.to_string()));
            return Ok(());
        }

        tracing::debug!(index, template = %kind, "applying template");
        match handlers::apply(&mut self.graph, &template, self.config.strict)? {
            Outcome::Applied => self.report.applied += 1,
            Outcome::Dropped(reason) => self.report.dropped.push(skipped(reason)),
        }
        Ok(())
    }

    /// Serialize the graph as BioPAX RDF/XML under the configured base IRI.
    pub fn to_biopax_xml(&self) -> Result<String> {
        let options = WriterOptions {
            base_iri: self.config.base_iri.clone(),
            ..WriterOptions::default()
        };
        Ok(write_biopax_xml(&self.graph, &options)?)
    }
}

/// Build a fresh graph from one JSON document.
pub fn convert_document(json: &str, config: &ConvertConfig) -> Result<(Graph, BuildReport)> {
    let mut converter = Converter::new(config.clone());
    converter.add_json_str(json)?;
    Ok(converter.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_types_are_reported_not_built() {
        let mut converter = Converter::default();
        converter
            .add_document(&json!({"interactions": [{"type": "Location Change"}]}))
            .unwrap();
        assert_eq!(converter.report().unknown.len(), 1);
        assert_eq!(converter.graph().node_count(), 0);
    }

    #[test]
    fn strict_mode_rejects_unknown_types() {
        let mut converter = Converter::new(ConvertConfig::default().strict(true));
        let err = converter
            .add_document(&json!({"interactions": [{"type": "Location Change"}]}))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnknownTemplateType(t) if t == "Location Change"));
    }

    #[test]
    fn invalid_entity_type_skips_only_that_template() {
        let mut converter = Converter::default();
        converter
            .add_document(&json!({"interactions": [
                {"type": "Molecular Interaction", "participants": [
                    {"type": "protein", "name": "A"}, {"type": "organism", "name": "mouse"}
                ]},
                {"type": "Molecular Interaction", "participants": [
                    {"type": "protein", "name": "B"}
                ]}
            ]}))
            .unwrap();
        let report = converter.report();
        assert_eq!(report.applied, 1);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].index, 0);
        // Nothing from the skipped template reached the graph.
        let names: Vec<_> = converter
            .graph()
            .entities()
            .filter_map(|(_, e)| e.name.as_deref())
            .collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn document_without_interactions_is_malformed() {
        let mut converter = Converter::default();
        let err = converter.add_document(&json!({"publication": {"id": "1"}})).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedTemplate { .. }));
    }

    #[test]
    fn publication_is_attached_once_per_document() {
        let mut converter = Converter::default();
        converter
            .add_document(&json!({"interactions": [], "publication": {"id": 31234567, "db": "pubmed"}}))
            .unwrap();
        let graph = converter.graph();
        let publication = graph.xref(graph.publication().unwrap());
        assert_eq!(publication.id, "31234567");
        assert_eq!(publication.db.as_deref(), Some("pubmed"));
    }

    #[test]
    fn top_level_array_is_read_as_legacy() {
        let mut converter = Converter::default();
        converter
            .add_document(&json!([
                {"type": "Protein Controls Production",
                 "controllerProtein": {"type": "protein", "name": "E"},
                 "chemical": {"type": "chemical", "name": "P"}}
            ]))
            .unwrap();
        assert_eq!(converter.report().applied, 1);
        assert_eq!(
            converter
                .graph()
                .count_interactions(factoid_graph::InteractionClass::BiochemicalReaction),
            1
        );
    }
}
