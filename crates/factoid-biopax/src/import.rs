//! BioPAX Level 3 RDF/XML import.
//!
//! The document is parsed with `sophia` into statements, grouped by subject,
//! and then rebuilt node kind by node kind (xrefs, references, features,
//! entities, interactions) so that every object property can be resolved to
//! an id that already exists. Nothing is deduplicated: two input nodes with
//! the same content stay two graph nodes.

use crate::{BiopaxError, Result};
use factoid_graph::{
    ControlType, ConversionDirection, EntityClass, EntityId, Evidence, FeatureId, Graph,
    InteractionClass, InteractionId, ReferenceClass, ReferenceId, Side, Xref, XrefId, XrefKind,
    BIOPAX_NS,
};
use sophia::api::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

// ============================================================================
// RDF terms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Term {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Term {
    /// Subject-style key: IRIs as-is, blank nodes with their `_:` prefix.
    fn node_key(&self) -> Option<String> {
        match self {
            Term::Iri(iri) => Some(iri.clone()),
            Term::Blank(id) => Some(format!("_:{id}")),
            Term::Literal(_) => None,
        }
    }
}

fn unescape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse the N-Triples-like display form of a term.
fn parse_term(display: &str) -> Result<Term> {
    let s = display.trim();

    if let Some(iri) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(Term::Iri(iri.to_string()));
    }
    if let Some(id) = s.strip_prefix("_:") {
        return Ok(Term::Blank(id.to_string()));
    }
    if s.starts_with('"') {
        let mut escaped = false;
        let mut end = None;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !escaped {
                end = Some(i);
                break;
            }
            escaped = ch == '\\' && !escaped;
        }
        let Some(end) = end else {
            return Err(BiopaxError::Term(format!("unterminated literal: {s}")));
        };
        // Datatype and language tag carry nothing BioPAX values need.
        return Ok(Term::Literal(unescape_literal(&s[1..end])));
    }

    Err(BiopaxError::Term(s.to_string()))
}

// ============================================================================
// Statements grouped by subject
// ============================================================================

/// Everything said about one subject, in document order.
#[derive(Debug, Default)]
struct Description {
    /// BioPAX class local name from `rdf:type`.
    class: Option<String>,
    /// (BioPAX property local name, lexical form)
    literals: Vec<(String, String)>,
    /// (BioPAX property local name, object node key)
    links: Vec<(String, String)>,
}

impl Description {
    fn literal(&self, property: &str) -> Option<&str> {
        self.literals
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    fn links<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.links
            .iter()
            .filter(move |(p, _)| p == property)
            .map(|(_, o)| o.as_str())
    }
}

#[derive(Debug, Default)]
struct Descriptions {
    order: Vec<String>,
    by_key: HashMap<String, Description>,
}

impl Descriptions {
    fn entry(&mut self, key: String) -> &mut Description {
        if !self.by_key.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.by_key.entry(key).or_default()
    }

    fn get(&self, key: &str) -> Option<&Description> {
        self.by_key.get(key)
    }

    /// Subjects of one class, in first-seen order.
    fn of_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = (&'a str, &'a Description)> + 'a {
        self.iter().filter(move |(_, d)| d.class.as_deref() == Some(class))
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Description)> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.by_key.get(k).map(|d| (k.as_str(), d)))
    }
}

fn read_descriptions<R: BufRead>(reader: R) -> Result<Descriptions> {
    let mut out = Descriptions::default();
    let mut parser = sophia::xml::parser::parse_bufread(reader);
    parser
        .try_for_each_triple(|t| -> std::result::Result<(), BiopaxError> {
            let Some(subject) = parse_term(&t.s().to_string())?.node_key() else {
                return Ok(());
            };
            let Term::Iri(predicate) = parse_term(&t.p().to_string())? else {
                return Ok(());
            };
            let object = parse_term(&t.o().to_string())?;

            if predicate == RDF_TYPE_IRI {
                if let Term::Iri(class_iri) = &object {
                    if let Some(class) = class_iri.strip_prefix(BIOPAX_NS) {
                        out.entry(subject).class = Some(class.to_string());
                    }
                }
                return Ok(());
            }
            let Some(property) = predicate.strip_prefix(BIOPAX_NS) else {
                return Ok(());
            };
            let property = property.to_string();
            let description = out.entry(subject);
            match object {
                Term::Literal(value) => description.literals.push((property, value)),
                node => {
                    if let Some(key) = node.node_key() {
                        description.links.push((property, key));
                    }
                }
            }
            Ok(())
        })
        .map_err(|e| BiopaxError::Parse(e.to_string()))?;
    Ok(out)
}

// ============================================================================
// Graph reconstruction
// ============================================================================

/// Parse BioPAX RDF/XML bytes into a graph.
pub fn graph_from_rdf_xml(bytes: &[u8]) -> Result<Graph> {
    graph_from_rdf_xml_reader(std::io::BufReader::new(std::io::Cursor::new(bytes)))
}

pub fn graph_from_rdf_xml_reader<R: BufRead>(reader: R) -> Result<Graph> {
    let descriptions = read_descriptions(reader)?;
    let graph = Importer::new(&descriptions).run();
    tracing::debug!(nodes = graph.node_count(), "imported BioPAX graph");
    Ok(graph)
}

struct Importer<'a> {
    input: &'a Descriptions,
    graph: Graph,
    xrefs: HashMap<&'a str, XrefId>,
    references: HashMap<&'a str, ReferenceId>,
    features: HashMap<&'a str, FeatureId>,
    entities: HashMap<&'a str, EntityId>,
    interactions: HashMap<&'a str, InteractionId>,
}

impl<'a> Importer<'a> {
    fn new(input: &'a Descriptions) -> Self {
        Self {
            input,
            graph: Graph::new(),
            xrefs: HashMap::new(),
            references: HashMap::new(),
            features: HashMap::new(),
            entities: HashMap::new(),
            interactions: HashMap::new(),
        }
    }

    fn run(mut self) -> Graph {
        self.xrefs();
        self.references();
        self.features();
        self.entities();
        self.interactions();
        self.publication();
        self.graph
    }

    /// Xrefs that only identify an evidence code are folded into the code.
    fn evidence_code_xrefs(&self) -> HashSet<&'a str> {
        self.input
            .of_class("EvidenceCodeVocabulary")
            .flat_map(|(_, d)| d.links("xref"))
            .collect()
    }

    fn xrefs(&mut self) {
        let input = self.input;
        let code_xrefs = self.evidence_code_xrefs();
        for (key, d) in input.iter() {
            let Some(kind) = d.class.as_deref().and_then(XrefKind::from_biopax_name) else {
                continue;
            };
            if code_xrefs.contains(key) {
                continue;
            }
            let Some(id) = d.literal("id") else {
                tracing::warn!(node = key, "xref without an id; skipping");
                continue;
            };
            let xref = self.graph.insert_xref(Xref {
                kind,
                id: id.to_string(),
                db: d.literal("db").map(str::to_string),
            });
            self.xrefs.insert(key, xref);
        }
    }

    fn references(&mut self) {
        let input = self.input;
        for (key, d) in input.iter() {
            let Some(class) = d.class.as_deref().and_then(ReferenceClass::from_biopax_name) else {
                continue;
            };
            let xref = d.links("xref").find_map(|x| self.xrefs.get(x).copied());
            let reference = self
                .graph
                .insert_reference(class, d.literal("displayName"), xref);
            self.references.insert(key, reference);
        }
    }

    fn features(&mut self) {
        let input = self.input;
        let mut owners: HashMap<&str, ReferenceId> = HashMap::new();
        for (key, d) in input.iter() {
            if let Some(&reference) = self.references.get(key) {
                for feature in d.links("entityFeature") {
                    owners.entry(feature).or_insert(reference);
                }
            }
        }

        for (key, d) in input.of_class("ModificationFeature") {
            let term = d
                .links("modificationType")
                .filter_map(|v| input.get(v))
                .find_map(|v| v.literal("term"));
            let Some(term) = term else {
                tracing::warn!(node = key, "feature without a modification term; skipping");
                continue;
            };
            let feature = self.graph.insert_feature(term, owners.get(key).copied());
            self.features.insert(key, feature);
        }
    }

    fn entities(&mut self) {
        let input = self.input;
        for (key, d) in input.iter() {
            let Some(class) = d.class.as_deref().and_then(EntityClass::from_biopax_name) else {
                continue;
            };
            let reference = d
                .links("entityReference")
                .find_map(|r| self.references.get(r).copied());
            let entity = self
                .graph
                .insert_entity(class, d.literal("displayName"), reference, false);
            self.entities.insert(key, entity);
        }

        for (key, d) in input.iter() {
            let Some(&entity) = self.entities.get(key) else {
                continue;
            };
            for feature in d.links("feature").filter_map(|f| self.features.get(f)) {
                self.graph.add_feature(entity, *feature);
            }
            for feature in d.links("notFeature").filter_map(|f| self.features.get(f)) {
                self.graph.add_not_feature(entity, *feature);
            }
            for component in d.links("component").filter_map(|c| self.entities.get(c)) {
                self.graph.set_in_complex(*component, true);
                self.graph.add_component(entity, *component);
            }
        }
    }

    fn interactions(&mut self) {
        let input = self.input;
        for (key, d) in input.iter() {
            let Some(class) = d.class.as_deref().and_then(InteractionClass::from_biopax_name) else {
                continue;
            };
            let interaction = self.graph.insert_interaction(class);
            self.interactions.insert(key, interaction);
        }

        for (key, d) in input.iter() {
            let Some(&id) = self.interactions.get(key) else {
                continue;
            };
            for (property, object) in &d.links {
                let object = object.as_str();
                match property.as_str() {
                    "left" | "right" => {
                        if let Some(&e) = self.entities.get(object) {
                            let side = if property == "left" { Side::Left } else { Side::Right };
                            self.graph.add_to_side(id, side, e);
                        }
                    }
                    "participant" => {
                        if let Some(&e) = self.entities.get(object) {
                            self.graph.add_participant(id, e);
                        }
                    }
                    "product" => {
                        if let Some(&e) = self.entities.get(object) {
                            self.graph.add_product(id, e);
                        }
                    }
                    "controller" => {
                        if let Some(&e) = self.entities.get(object) {
                            self.graph.set_controller(id, e);
                        }
                    }
                    "controlled" => {
                        if let Some(&x) = self.interactions.get(object) {
                            self.graph.set_controlled(id, x);
                        }
                    }
                    "evidence" => {
                        if let Some(evidence) = self.evidence(object) {
                            self.graph.add_evidence(id, evidence);
                        }
                    }
                    _ => {}
                }
            }
            if let Some(ct) = d.literal("controlType") {
                match ControlType::parse(ct) {
                    Some(ct) => self.graph.set_control_type(id, ct),
                    None => tracing::warn!(node = key, control_type = ct, "unrecognized control type"),
                }
            }
            if let Some(direction) = d.literal("conversionDirection").and_then(ConversionDirection::parse) {
                self.graph.set_direction(id, direction);
            }
        }
    }

    fn evidence(&self, key: &str) -> Option<Evidence> {
        let input = self.input;
        let d = input.get(key)?;
        let mut codes = Vec::new();
        for vocabulary in d.links("evidenceCode").filter_map(|v| input.get(v)) {
            let before = codes.len();
            codes.extend(
                vocabulary
                    .links("xref")
                    .filter_map(|x| input.get(x))
                    .filter_map(|x| x.literal("id"))
                    .map(str::to_string),
            );
            if codes.len() == before {
                codes.extend(vocabulary.literal("term").map(str::to_string));
            }
        }
        let xrefs = d
            .links("xref")
            .filter_map(|x| self.xrefs.get(x).copied())
            .collect();
        Some(Evidence { codes, xrefs })
    }

    /// The first publication xref that no evidence claims.
    fn publication(&mut self) {
        let input = self.input;
        let cited: HashSet<&str> = input
            .of_class("Evidence")
            .flat_map(|(_, d)| d.links("xref"))
            .collect();
        let publication = input
            .of_class(XrefKind::Publication.biopax_name())
            .find(|(key, _)| !cited.contains(key))
            .and_then(|(key, _)| self.xrefs.get(key).copied());
        if let Some(xref) = publication {
            self.graph.set_publication_xref(xref);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_term_display_forms() {
        assert_eq!(parse_term("<http://a/b>").unwrap(), Term::Iri("http://a/b".into()));
        assert_eq!(parse_term("_:n1").unwrap(), Term::Blank("n1".into()));
        assert_eq!(
            parse_term(r#""say \"hi\""^^<http://www.w3.org/2001/XMLSchema#string>"#).unwrap(),
            Term::Literal("say \"hi\"".into())
        );
        assert_eq!(parse_term(r#""x"@en"#).unwrap(), Term::Literal("x".into()));
        assert!(parse_term(r#""open"#).is_err());
        assert!(parse_term("42").is_err());
    }

    #[test]
    fn escaped_backslash_ends_before_quote() {
        assert_eq!(parse_term(r#""a\\""#).unwrap(), Term::Literal("a\\".into()));
    }

    #[test]
    fn rejects_malformed_xml() {
        let xml = br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description></rdf:Bag></rdf:RDF>"#;
        let err = graph_from_rdf_xml(xml).unwrap_err();
        assert!(matches!(err, BiopaxError::Parse(_)));
    }
}
