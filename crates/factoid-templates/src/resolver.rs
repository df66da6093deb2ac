//! Entity resolution: descriptor -> reference lookups -> matcher.

use crate::descriptor::{EntityDescriptor, EntityKind};
use crate::error::{ConvertError, Result};
use crate::matcher::{self, EntityRequest, FeatureRequest};
use factoid_graph::{EntityId, Graph};

/// Resolve `descriptor` to the canonical physical entity for the requested
/// feature state and complex membership.
///
/// Creates the xref and entity reference on first use; never rewrites an
/// existing node apart from appending features a reference mints.
pub fn resolve(
    graph: &mut Graph,
    descriptor: &EntityDescriptor,
    features: &FeatureRequest,
    in_complex: bool,
) -> Result<EntityId> {
    let kind = descriptor.kind()?;
    let name = descriptor.name.as_deref();

    let reference = match kind.reference_class() {
        Some(reference_class) => {
            let xref = descriptor
                .xref
                .as_ref()
                .map(|x| graph.get_or_create_xref(&x.id, x.db.as_deref()));
            Some(graph.get_or_create_reference(reference_class, name, xref))
        }
        None if kind == EntityKind::Complex && descriptor.xref.is_some() => {
            return Err(ConvertError::InvariantViolation(format!(
                "complex {:?} carries an xref",
                name.unwrap_or("<unnamed>")
            )));
        }
        None => {
            if descriptor.xref.is_some() {
                tracing::debug!(kind = %kind, name = ?name, "ignoring xref on a reference-less entity");
            }
            None
        }
    };

    matcher::get_or_create(
        graph,
        &EntityRequest {
            class: kind.entity_class(),
            name,
            reference,
            features,
            in_complex,
            components: descriptor.components(),
        },
    )
}

/// Resolve with no feature constraints, outside any complex.
pub fn resolve_plain(graph: &mut Graph, descriptor: &EntityDescriptor) -> Result<EntityId> {
    resolve(graph, descriptor, &FeatureRequest::none(), false)
}
