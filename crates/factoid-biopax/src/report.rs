//! Publication-grouped template report.
//!
//! Walks the top-level controls of a graph, keeps the ones whose controlled
//! process is backed by an accepted experimental evidence code, and restates
//! each as a simplified template (entities plus one interaction referring to
//! them by id) under every PubMed id cited by that evidence.

use crate::Result;
use factoid_graph::{
    EntityClass, EntityId, Graph, InteractionClass, InteractionId, Participant,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

/// Evidence codes (PSI-MI) that qualify an interaction for the report.
pub const ACCEPTED_EVIDENCE_CODES: [&str; 3] = ["MI:0074", "MI:0421", "MI:0113"];

/// Group tag of the target entry of a directed interaction.
pub const TARGET_GROUP: &str = "positive";

// ============================================================================
// Report items
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityItem {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionItem {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub association: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    pub entries: Vec<Entry>,
    pub id: String,
}

/// One element of a publication's list: an entity, or an interaction over
/// entities listed before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportItem {
    Interaction(InteractionItem),
    Entity(EntityItem),
}

impl ReportItem {
    pub fn id(&self) -> &str {
        match self {
            ReportItem::Interaction(x) => &x.id,
            ReportItem::Entity(e) => &e.id,
        }
    }

    pub fn as_interaction(&self) -> Option<&InteractionItem> {
        match self {
            ReportItem::Interaction(x) => Some(x),
            ReportItem::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityItem> {
        match self {
            ReportItem::Entity(e) => Some(e),
            ReportItem::Interaction(_) => None,
        }
    }
}

/// Descriptor type tag of an entity class.
pub fn entity_type_tag(class: EntityClass) -> &'static str {
    match class {
        EntityClass::Protein => "protein",
        EntityClass::SmallMolecule => "chemical",
        EntityClass::Complex => "complex",
        EntityClass::DnaRegion => "dna",
        EntityClass::Rna => "rna",
        EntityClass::PhysicalEntity => "entity",
    }
}

// ============================================================================
// Report construction
// ============================================================================

/// PubMed id -> simplified templates citing it.
pub fn templates_by_publication(graph: &Graph) -> BTreeMap<String, Vec<ReportItem>> {
    let mut out: BTreeMap<String, Vec<ReportItem>> = BTreeMap::new();

    let controlled: HashSet<InteractionId> = graph
        .interactions()
        .filter_map(|(_, x)| x.controlled)
        .collect();

    for (id, x) in graph.interactions() {
        if !x.class.is_control() || controlled.contains(&id) {
            continue;
        }
        let Some(process) = x.controlled else {
            continue;
        };
        if !has_accepted_evidence(graph, process) {
            tracing::trace!(interaction = id.raw(), "no accepted evidence code; skipping");
            continue;
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for evidence in &graph.interaction(process).evidence {
            for &xref in &evidence.xrefs {
                let xref = graph.xref(xref);
                let is_pubmed = xref
                    .db
                    .as_deref()
                    .is_some_and(|db| db.eq_ignore_ascii_case("pubmed"));
                if is_pubmed && seen.insert(xref.id.as_str()) {
                    let items = out.entry(xref.id.clone()).or_default();
                    simplify(graph, id, items);
                }
            }
        }
    }
    out
}

/// [`templates_by_publication`] rendered as a JSON object.
pub fn report_json(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&templates_by_publication(graph))?)
}

fn has_accepted_evidence(graph: &Graph, process: InteractionId) -> bool {
    graph
        .interaction(process)
        .evidence
        .iter()
        .flat_map(|e| &e.codes)
        .any(|code| {
            ACCEPTED_EVIDENCE_CODES
                .iter()
                .any(|accepted| code.eq_ignore_ascii_case(accepted))
        })
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

fn push_entity(graph: &Graph, items: &mut Vec<ReportItem>, entity: EntityId) -> String {
    let e = graph.entity(entity);
    let id = fresh_id();
    items.push(ReportItem::Entity(EntityItem {
        type_tag: entity_type_tag(e.class).to_string(),
        name: e.name.clone(),
        id: id.clone(),
    }));
    id
}

/// A directed interaction from `source` to `target`.
fn push_directed(
    graph: &Graph,
    items: &mut Vec<ReportItem>,
    type_tag: String,
    control_type: Option<String>,
    source: EntityId,
    target: EntityId,
) {
    let source = push_entity(graph, items, source);
    let target = push_entity(graph, items, target);
    items.push(ReportItem::Interaction(InteractionItem {
        association: type_tag.clone(),
        type_tag,
        control_type,
        entries: vec![
            Entry { id: source, group: None },
            Entry { id: target, group: Some(TARGET_GROUP.to_string()) },
        ],
        id: fresh_id(),
    }));
}

/// An undirected interaction among `members`.
fn push_undirected(graph: &Graph, items: &mut Vec<ReportItem>, members: &[EntityId]) {
    let entries = members
        .iter()
        .map(|&m| Entry { id: push_entity(graph, items, m), group: None })
        .collect();
    items.push(ReportItem::Interaction(InteractionItem {
        type_tag: "interaction".to_string(),
        association: "interaction".to_string(),
        control_type: None,
        entries,
        id: fresh_id(),
    }));
}

fn simplify(graph: &Graph, id: InteractionId, items: &mut Vec<ReportItem>) {
    if let Some((type_tag, source, target)) = expression_regulation(graph, id)
        .or_else(|| state_change(graph, id))
    {
        let control_type = graph
            .interaction(id)
            .control_type
            .map(|ct| ct.biopax_name().to_string());
        push_directed(graph, items, type_tag, control_type, source, target);
        return;
    }

    let participants = graph.participants(id);
    let entities: Vec<EntityId> = participants
        .iter()
        .filter_map(|p| match p {
            Participant::Entity(e) => Some(*e),
            Participant::Interaction(_) => None,
        })
        .collect();
    let processes: Vec<InteractionId> = participants
        .iter()
        .filter_map(|p| match p {
            Participant::Interaction(x) => Some(*x),
            Participant::Entity(_) => None,
        })
        .collect();

    if processes.is_empty() {
        push_undirected(graph, items, &entities);
        return;
    }
    if let ([source], [process]) = (entities.as_slice(), processes.as_slice()) {
        if let Some(target) = leaf_entity(graph, Participant::Interaction(*process)) {
            push_directed(graph, items, "interaction".to_string(), None, *source, target);
            return;
        }
    }

    let mut leaves: Vec<EntityId> = Vec::new();
    for &p in &participants {
        if let Some(leaf) = leaf_entity(graph, p) {
            if !leaves.contains(&leaf) {
                leaves.push(leaf);
            }
        }
    }
    push_undirected(graph, items, &leaves);
}

/// Template reaction regulation by a macromolecule or complex of a protein
/// or RNA product.
fn expression_regulation(graph: &Graph, id: InteractionId) -> Option<(String, EntityId, EntityId)> {
    let x = graph.interaction(id);
    if x.class != InteractionClass::TemplateReactionRegulation {
        return None;
    }
    let source = x.controller?;
    if !graph.entity(source).class.is_macromolecule_or_complex() {
        return None;
    }
    let reaction = graph.interaction(x.controlled?);
    if reaction.class != InteractionClass::TemplateReaction {
        return None;
    }
    let target = *reaction.products.first()?;
    matches!(graph.entity(target).class, EntityClass::Protein | EntityClass::Rna)
        .then(|| ("transcription-translation".to_string(), source, target))
}

/// Catalysis by a macromolecule or complex of a conversion whose right side
/// starts with a macromolecule.
fn state_change(graph: &Graph, id: InteractionId) -> Option<(String, EntityId, EntityId)> {
    let x = graph.interaction(id);
    if x.class != InteractionClass::Catalysis {
        return None;
    }
    let source = x.controller?;
    if !graph.entity(source).class.is_macromolecule_or_complex() {
        return None;
    }
    let conversion = graph.interaction(x.controlled?);
    if !conversion.class.is_conversion() {
        return None;
    }
    let target = *conversion.right.first()?;
    let target_entity = graph.entity(target);
    if !target_entity.class.is_macromolecule() {
        return None;
    }
    let type_tag = match target_entity.features.iter().next() {
        Some(&feature) => graph.feature(feature).term.replace("ion", "ed"),
        None => "modification".to_string(),
    };
    Some((type_tag, source, target))
}

/// The first physical entity reachable through participants.
fn leaf_entity(graph: &Graph, start: Participant) -> Option<EntityId> {
    let mut visited: HashSet<InteractionId> = HashSet::new();
    let mut stack = vec![start];
    while let Some(p) = stack.pop() {
        match p {
            Participant::Entity(e) => return Some(e),
            Participant::Interaction(x) => {
                if visited.insert(x) {
                    stack.extend(graph.participants(x).into_iter().rev());
                }
            }
        }
    }
    None
}
