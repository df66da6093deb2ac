//! Physical entity matching.
//!
//! Finds the unique physical entity for a request, or creates it. Three paths:
//!
//! - **Complex**: candidates pooled under `(Complex, name)`; a candidate matches
//!   when its component summary (name, stored xref id and db of each direct
//!   component, order-free) and its feature term sets equal the request's.
//! - **Simple reference** (protein, chemical, DNA, RNA): instances of the
//!   reference; a candidate matches on exact equality of the in-complex flag,
//!   the required term set and the forbidden term set.
//! - **Generic**: candidates pooled under `(class, name)`; any one with the
//!   requested complex membership is reused, whatever its features.
//!
//! Every path is idempotent within one build.

use crate::descriptor::{ComponentSummary, EntityDescriptor};
use crate::error::{ConvertError, Result};
use crate::resolver;
use factoid_graph::{EntityClass, EntityId, FeatureId, Graph, ReferenceId};
use std::collections::BTreeSet;

// ============================================================================
// Requests
// ============================================================================

/// Required and forbidden feature terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequest {
    pub required: BTreeSet<String>,
    pub forbidden: BTreeSet<String>,
}

impl FeatureRequest {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn require(mut self, term: impl Into<String>) -> Self {
        self.required.insert(term.into());
        self
    }

    pub fn forbid(mut self, term: impl Into<String>) -> Self {
        self.forbidden.insert(term.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntityRequest<'a> {
    pub class: EntityClass,
    pub name: Option<&'a str>,
    pub reference: Option<ReferenceId>,
    pub features: &'a FeatureRequest,
    pub in_complex: bool,
    /// Component descriptors; only read for complexes.
    pub components: &'a [EntityDescriptor],
}

// ============================================================================
// Matching
// ============================================================================

pub fn get_or_create(graph: &mut Graph, request: &EntityRequest<'_>) -> Result<EntityId> {
    match (request.class, request.reference) {
        (EntityClass::Complex, None) => get_or_create_complex(graph, request),
        (EntityClass::Complex, Some(_)) => Err(ConvertError::InvariantViolation(
            "a complex cannot have an entity reference".to_string(),
        )),
        (_, Some(reference)) => Ok(get_or_create_simple(graph, reference, request)),
        (class, None) if class.reference_class().is_some() => {
            Err(ConvertError::InvariantViolation(format!(
                "{class} {:?} needs an entity reference",
                request.name
            )))
        }
        (_, None) => Ok(get_or_create_generic(graph, request)),
    }
}

fn get_or_create_simple(
    graph: &mut Graph,
    reference: ReferenceId,
    request: &EntityRequest<'_>,
) -> EntityId {
    let found = graph
        .reference(reference)
        .instances
        .iter()
        .copied()
        .find(|&id| {
            let entity = graph.entity(id);
            entity.in_complex == request.in_complex
                && same_terms(graph, &entity.features, &request.features.required)
                && same_terms(graph, &entity.not_features, &request.features.forbidden)
        });
    if let Some(id) = found {
        return id;
    }

    let id = graph.insert_entity(request.class, request.name, Some(reference), request.in_complex);
    for term in &request.features.required {
        let feature = graph.get_or_create_feature(reference, term);
        graph.add_feature(id, feature);
    }
    for term in &request.features.forbidden {
        let feature = graph.get_or_create_feature(reference, term);
        graph.add_not_feature(id, feature);
    }
    id
}

fn get_or_create_complex(graph: &mut Graph, request: &EntityRequest<'_>) -> Result<EntityId> {
    let wanted: BTreeSet<ComponentSummary> = request
        .components
        .iter()
        .map(|descriptor| requested_summary(graph, descriptor))
        .collect();

    let found = graph
        .no_ref_candidates(EntityClass::Complex, request.name)
        .iter()
        .copied()
        .find(|&id| {
            let entity = graph.entity(id);
            same_terms(graph, &entity.features, &request.features.required)
                && same_terms(graph, &entity.not_features, &request.features.forbidden)
                && component_summary(graph, id) == wanted
        });
    if let Some(id) = found {
        tracing::debug!(name = ?request.name, "complex cache hit");
        return Ok(id);
    }

    // Members first, so a half-built complex is never a candidate.
    let members = request
        .components
        .iter()
        .map(|descriptor| resolver::resolve(graph, descriptor, &FeatureRequest::none(), true))
        .collect::<Result<Vec<_>>>()?;
    let complex = graph.insert_entity(EntityClass::Complex, request.name, None, request.in_complex);
    attach_unowned_features(graph, complex, request.features);
    for member in members {
        graph.add_component(complex, member);
    }
    Ok(complex)
}

fn get_or_create_generic(graph: &mut Graph, request: &EntityRequest<'_>) -> EntityId {
    let reusable = graph
        .no_ref_candidates(request.class, request.name)
        .iter()
        .copied()
        .find(|&id| graph.entity(id).in_complex == request.in_complex);
    if let Some(id) = reusable {
        return id;
    }
    let id = graph.insert_entity(request.class, request.name, None, request.in_complex);
    attach_unowned_features(graph, id, request.features);
    id
}

// ============================================================================
// Helpers
// ============================================================================

/// Reference-less entities get features of their own.
fn attach_unowned_features(graph: &mut Graph, entity: EntityId, features: &FeatureRequest) {
    for term in &features.required {
        let feature = graph.insert_feature(term, None);
        graph.add_feature(entity, feature);
    }
    for term in &features.forbidden {
        let feature = graph.insert_feature(term, None);
        graph.add_not_feature(entity, feature);
    }
}

fn same_terms(graph: &Graph, features: &BTreeSet<FeatureId>, terms: &BTreeSet<String>) -> bool {
    graph
        .feature_terms(features)
        .into_iter()
        .eq(terms.iter().map(String::as_str))
}

/// What a component descriptor contributes to a complex summary once resolved:
/// the xref canonicalized through the graph's key mode, and no xref at all for
/// reference-less kinds.
fn requested_summary(graph: &Graph, descriptor: &EntityDescriptor) -> ComponentSummary {
    let name = descriptor.name.clone();
    let keeps_xref = descriptor
        .kind()
        .map(|kind| kind.reference_class().is_some())
        .unwrap_or(false);
    let Some(xref) = descriptor.xref.as_ref().filter(|_| keeps_xref) else {
        return (name, None, None);
    };
    match graph.find_xref(&xref.id, xref.db.as_deref()) {
        Some(existing) => {
            let stored = graph.xref(existing);
            (name, Some(stored.id.clone()), stored.db.clone())
        }
        None => (name, Some(xref.id.clone()), xref.db.clone()),
    }
}

/// The order-free summary of an existing complex's direct components.
pub fn component_summary(graph: &Graph, complex: EntityId) -> BTreeSet<ComponentSummary> {
    graph
        .entity(complex)
        .components
        .iter()
        .map(|&member| {
            let xref = graph.entity_xref(member);
            (
                graph.entity(member).name.clone(),
                xref.map(|x| x.id.clone()),
                xref.and_then(|x| x.db.clone()),
            )
        })
        .collect()
}
