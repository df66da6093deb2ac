//! BioPAX Level 3 RDF/XML writer.
//!
//! Every node is written as one top-level element with an absolute
//! `rdf:about` IRI of the form `<baseIri><Class>_<n>`, where `n` is the
//! node's arena index. Output order is arena order, so the same graph always
//! produces the same bytes.

use crate::{
    EntityId, Graph, GraphError, Interaction, InteractionId, PhysicalEntity, ReferenceId, XrefId,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const BIOPAX_NS: &str = "http://www.biopax.org/release/biopax-level3.owl#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const DEFAULT_BASE_IRI: &str = "http://biofactoid.org/";

#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Prefix of every exported node IRI.
    pub base_iri: String,
    /// Indent nested elements by two spaces.
    pub indent: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            base_iri: DEFAULT_BASE_IRI.to_string(),
            indent: true,
        }
    }
}

/// Render `graph` as BioPAX Level 3 RDF/XML.
pub fn write_biopax_xml(graph: &Graph, options: &WriterOptions) -> Result<String, GraphError> {
    let writer = if options.indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    let mut out = BiopaxWriter {
        graph,
        base: options.base_iri.as_str(),
        xml: writer,
    };
    out.document()?;
    Ok(String::from_utf8(out.xml.into_inner())?)
}

struct BiopaxWriter<'a> {
    graph: &'a Graph,
    base: &'a str,
    xml: Writer<Vec<u8>>,
}

impl BiopaxWriter<'_> {
    // ========================================================================
    // IRIs
    // ========================================================================

    fn iri(&self, class: &str, n: impl std::fmt::Display) -> String {
        format!("{}{}_{}", self.base, class, n)
    }

    fn xref_iri(&self, id: XrefId) -> String {
        self.iri(self.graph.xref(id).kind.biopax_name(), id.raw())
    }

    fn reference_iri(&self, id: ReferenceId) -> String {
        self.iri(self.graph.reference(id).class.biopax_name(), id.raw())
    }

    fn feature_iri(&self, raw: u32) -> String {
        self.iri("ModificationFeature", raw)
    }

    fn vocabulary_iri(&self, raw: u32) -> String {
        self.iri("SequenceModificationVocabulary", raw)
    }

    fn entity_iri(&self, id: EntityId) -> String {
        self.iri(self.graph.entity(id).class.biopax_name(), id.raw())
    }

    fn interaction_iri(&self, id: InteractionId) -> String {
        self.iri(self.graph.interaction(id).class.biopax_name(), id.raw())
    }

    // ========================================================================
    // Low-level element helpers
    // ========================================================================

    fn emit(&mut self, event: Event<'_>) -> Result<(), GraphError> {
        self.xml
            .write_event(event)
            .map(|_| ())
            .map_err(|e| GraphError::Xml(e.to_string()))
    }

    fn open(&mut self, class: &str, about: &str) -> Result<(), GraphError> {
        let name = format!("bp:{class}");
        let mut start = BytesStart::new(name.as_str());
        start.push_attribute(("rdf:about", about));
        self.emit(Event::Start(start))
    }

    fn close(&mut self, class: &str) -> Result<(), GraphError> {
        let name = format!("bp:{class}");
        self.emit(Event::End(BytesEnd::new(name.as_str())))
    }

    fn literal(&mut self, property: &str, value: &str) -> Result<(), GraphError> {
        let name = format!("bp:{property}");
        let mut start = BytesStart::new(name.as_str());
        start.push_attribute(("rdf:datatype", XSD_STRING));
        self.emit(Event::Start(start))?;
        self.emit(Event::Text(BytesText::new(value)))?;
        self.emit(Event::End(BytesEnd::new(name.as_str())))
    }

    fn resource(&mut self, property: &str, iri: &str) -> Result<(), GraphError> {
        let name = format!("bp:{property}");
        let mut empty = BytesStart::new(name.as_str());
        empty.push_attribute(("rdf:resource", iri));
        self.emit(Event::Empty(empty))
    }

    // ========================================================================
    // Document
    // ========================================================================

    fn document(&mut self) -> Result<(), GraphError> {
        self.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("rdf:RDF");
        root.push_attribute(("xmlns:rdf", RDF_NS));
        root.push_attribute(("xmlns:bp", BIOPAX_NS));
        root.push_attribute(("xmlns:owl", OWL_NS));
        root.push_attribute(("xml:base", self.base));
        self.emit(Event::Start(root))?;

        let mut ontology = BytesStart::new("owl:Ontology");
        ontology.push_attribute(("rdf:about", ""));
        self.emit(Event::Start(ontology))?;
        let mut imports = BytesStart::new("owl:imports");
        imports.push_attribute(("rdf:resource", BIOPAX_NS));
        self.emit(Event::Empty(imports))?;
        self.emit(Event::End(BytesEnd::new("owl:Ontology")))?;

        let graph = self.graph;
        for (id, _) in graph.xrefs() {
            self.xref(id)?;
        }
        for (id, _) in graph.references() {
            self.reference(id)?;
        }
        for (id, feature) in graph.features() {
            let raw = id.raw();
            let about = self.feature_iri(raw);
            self.open("ModificationFeature", &about)?;
            self.resource("modificationType", &self.vocabulary_iri(raw))?;
            self.close("ModificationFeature")?;

            let about = self.vocabulary_iri(raw);
            self.open("SequenceModificationVocabulary", &about)?;
            self.literal("term", &feature.term)?;
            self.close("SequenceModificationVocabulary")?;
        }
        for (id, entity) in graph.entities() {
            self.entity(id, entity)?;
        }
        for (id, interaction) in graph.interactions() {
            self.interaction(id, interaction)?;
        }

        self.emit(Event::End(BytesEnd::new("rdf:RDF")))
    }

    fn xref(&mut self, id: XrefId) -> Result<(), GraphError> {
        let graph = self.graph;
        let xref = graph.xref(id);
        let class = xref.kind.biopax_name();
        let about = self.xref_iri(id);
        self.open(class, &about)?;
        if let Some(db) = &xref.db {
            self.literal("db", db)?;
        }
        self.literal("id", &xref.id)?;
        self.close(class)
    }

    fn reference(&mut self, id: ReferenceId) -> Result<(), GraphError> {
        let graph = self.graph;
        let reference = graph.reference(id);
        let class = reference.class.biopax_name();
        let about = self.reference_iri(id);
        self.open(class, &about)?;
        if let Some(name) = &reference.name {
            self.literal("displayName", name)?;
        }
        if let Some(xref) = reference.xref {
            self.resource("xref", &self.xref_iri(xref))?;
        }
        for feature in &reference.features {
            self.resource("entityFeature", &self.feature_iri(feature.raw()))?;
        }
        self.close(class)
    }

    fn entity(&mut self, id: EntityId, entity: &PhysicalEntity) -> Result<(), GraphError> {
        let class = entity.class.biopax_name();
        let about = self.entity_iri(id);
        self.open(class, &about)?;
        if let Some(name) = &entity.name {
            self.literal("displayName", name)?;
        }
        if let Some(reference) = entity.reference {
            self.resource("entityReference", &self.reference_iri(reference))?;
        }
        for feature in &entity.features {
            self.resource("feature", &self.feature_iri(feature.raw()))?;
        }
        for feature in &entity.not_features {
            self.resource("notFeature", &self.feature_iri(feature.raw()))?;
        }
        for &component in &entity.components {
            self.resource("component", &self.entity_iri(component))?;
        }
        self.close(class)
    }

    fn interaction(&mut self, id: InteractionId, x: &Interaction) -> Result<(), GraphError> {
        let class = x.class.biopax_name();
        let about = self.interaction_iri(id);
        self.open(class, &about)?;

        for &e in &x.left {
            self.resource("left", &self.entity_iri(e))?;
        }
        for &e in &x.right {
            self.resource("right", &self.entity_iri(e))?;
        }
        if let Some(direction) = x.direction {
            self.literal("conversionDirection", direction.biopax_name())?;
        }
        for &e in &x.participants {
            self.resource("participant", &self.entity_iri(e))?;
        }
        for &e in &x.products {
            self.resource("product", &self.entity_iri(e))?;
        }
        if let Some(controller) = x.controller {
            self.resource("controller", &self.entity_iri(controller))?;
        }
        if let Some(controlled) = x.controlled {
            self.resource("controlled", &self.interaction_iri(controlled))?;
        }
        if let Some(control_type) = x.control_type {
            self.literal("controlType", control_type.biopax_name())?;
        }
        for k in 0..x.evidence.len() {
            let evidence_iri = self.iri("Evidence", format!("{}_{}", id.raw(), k));
            self.resource("evidence", &evidence_iri)?;
        }
        self.close(class)?;

        for (k, evidence) in x.evidence.iter().enumerate() {
            let tag = format!("{}_{}", id.raw(), k);
            let about = self.iri("Evidence", &tag);
            self.open("Evidence", &about)?;
            for j in 0..evidence.codes.len() {
                let code_iri = self.iri("EvidenceCodeVocabulary", format!("{tag}_{j}"));
                self.resource("evidenceCode", &code_iri)?;
            }
            for &xref in &evidence.xrefs {
                self.resource("xref", &self.xref_iri(xref))?;
            }
            self.close("Evidence")?;

            for (j, code) in evidence.codes.iter().enumerate() {
                let code_tag = format!("{tag}_{j}");
                let about = self.iri("EvidenceCodeVocabulary", &code_tag);
                let unification = self.iri("UnificationXref", &code_tag);
                self.open("EvidenceCodeVocabulary", &about)?;
                self.literal("term", code)?;
                self.resource("xref", &unification)?;
                self.close("EvidenceCodeVocabulary")?;

                self.open("UnificationXref", &unification)?;
                self.literal("db", "MI")?;
                self.literal("id", code)?;
                self.close("UnificationXref")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlType, EntityClass, InteractionClass, ReferenceClass};

    fn small_graph() -> Graph {
        let mut g = Graph::new();
        let xref = g.get_or_create_xref("P04637", Some("uniprot"));
        let r = g.get_or_create_reference(ReferenceClass::ProteinReference, Some("TP53"), Some(xref));
        let active = g.get_or_create_feature(r, "active");
        let left = g.insert_entity(EntityClass::Protein, Some("TP53"), Some(r), false);
        g.add_not_feature(left, active);
        let right = g.insert_entity(EntityClass::Protein, Some("TP53"), Some(r), false);
        g.add_feature(right, active);
        let conv = g.add_conversion(InteractionClass::Conversion, Some(left), Some(right));
        g.add_control(
            InteractionClass::Catalysis,
            Some(left),
            Some(conv),
            Some(ControlType::Activation),
        );
        g.set_publication("12345", Some("pubmed"));
        g
    }

    #[test]
    fn writes_absolute_iris_and_core_properties() {
        let xml = write_biopax_xml(&small_graph(), &WriterOptions::default()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("rdf:about=\"http://biofactoid.org/ProteinReference_0\""));
        assert!(xml.contains("<bp:notFeature rdf:resource=\"http://biofactoid.org/ModificationFeature_0\"/>"));
        assert!(xml.contains("<bp:controlled rdf:resource=\"http://biofactoid.org/Conversion_0\"/>"));
        assert!(xml.contains(">ACTIVATION</bp:controlType>"));
        assert!(xml.contains(">LEFT_TO_RIGHT</bp:conversionDirection>"));
        assert!(xml.contains("bp:PublicationXref"));
    }

    #[test]
    fn output_is_deterministic() {
        let g = small_graph();
        let a = write_biopax_xml(&g, &WriterOptions::default()).unwrap();
        let b = write_biopax_xml(&g, &WriterOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn literals_are_escaped() {
        let mut g = Graph::new();
        g.insert_entity(EntityClass::PhysicalEntity, Some("a<b & c"), None, false);
        let xml = write_biopax_xml(&g, &WriterOptions::default()).unwrap();
        assert!(xml.contains("a&lt;b &amp; c"));
    }
}
