//! Template handlers: one sub-graph shape per template.

use crate::descriptor::EntityDescriptor;
use crate::error::{ConvertError, Result};
use crate::matcher::FeatureRequest;
use crate::resolver::{resolve, resolve_plain};
use crate::template::{StateEdge, Template};
use factoid_graph::{ControlType, EntityClass, Graph, InteractionClass, Side};

/// The "active" state term used by state-change templates.
pub const ACTIVE: &str = "active";

/// What a handler did with a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Nothing was built; the reason is reported back to the caller.
    Dropped(String),
}

/// Left and right feature requests of a state-change conversion.
///
/// The modification, when given, is absent on the left and present on the
/// right. "active" goes right for activation and left for inhibition, and is
/// left out when there is no control type.
pub fn state_sides(
    control_type: Option<ControlType>,
    modification: Option<&str>,
) -> (FeatureRequest, FeatureRequest) {
    let mut left = FeatureRequest::none();
    let mut right = FeatureRequest::none();
    if let Some(modification) = modification {
        left = left.forbid(modification);
        right = right.require(modification);
    }
    match control_type {
        Some(ControlType::Activation) => {
            left = left.forbid(ACTIVE);
            right = right.require(ACTIVE);
        }
        Some(ControlType::Inhibition) => {
            left = left.require(ACTIVE);
            right = right.forbid(ACTIVE);
        }
        None => {}
    }
    (left, right)
}

/// Build the sub-graph for one template.
///
/// Participant class pairs with no construction are dropped, or rejected in
/// `strict` mode.
pub fn apply(graph: &mut Graph, template: &Template, strict: bool) -> Result<Outcome> {
    match template {
        Template::ControlsState {
            controller,
            target,
            modification,
            control_type,
            edge,
        } => {
            controls_state(
                graph,
                controller,
                target,
                modification.as_deref(),
                *control_type,
                *edge,
            )?;
        }
        Template::ExpressionRegulation {
            controller,
            target,
            control_type,
        } => expression_regulation(graph, controller, target, *control_type)?,
        Template::MolecularInteraction { participants } => {
            with_participants(graph, InteractionClass::MolecularInteraction, participants)?
        }
        Template::Interaction { participants } => {
            with_participants(graph, InteractionClass::Interaction, participants)?
        }
        Template::ControlledPair {
            controller,
            target,
            control_type,
        } => return controlled_pair(graph, controller, target, *control_type, strict),
        Template::ConsumptionOrProduction {
            controller,
            chemical,
            side,
        } => consumption_or_production(graph, controller, chemical, *side)?,
        Template::ComplexAssembly {
            molecules,
            complex_side,
        } => complex_assembly(graph, molecules, *complex_side)?,
        Template::BiochemicalReaction {
            catalyzer,
            inputs,
            outputs,
        } => biochemical_reaction(graph, catalyzer.as_ref(), inputs, outputs)?,
    }
    Ok(Outcome::Applied)
}

// ============================================================================
// State change and regulation
// ============================================================================

fn controls_state(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    target: &EntityDescriptor,
    modification: Option<&str>,
    control_type: Option<ControlType>,
    edge: StateEdge,
) -> Result<()> {
    let (left_features, right_features) = state_sides(control_type, modification);
    let left = resolve(graph, target, &left_features, false)?;
    let right = resolve(graph, target, &right_features, false)?;
    let controller = resolve_plain(graph, controller)?;

    let conversion = graph.add_conversion(InteractionClass::Conversion, Some(left), Some(right));
    match edge {
        // The template's control type only picks the active side here.
        StateEdge::Catalysis => graph.add_control(
            InteractionClass::Catalysis,
            Some(controller),
            Some(conversion),
            Some(ControlType::Activation),
        ),
        StateEdge::Control => graph.add_control(
            InteractionClass::Control,
            Some(controller),
            Some(conversion),
            control_type,
        ),
    };
    Ok(())
}

fn expression_regulation(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    target: &EntityDescriptor,
    control_type: Option<ControlType>,
) -> Result<()> {
    let controller = resolve_plain(graph, controller)?;
    let product = resolve_plain(graph, target)?;

    let reaction = graph.insert_interaction(InteractionClass::TemplateReaction);
    graph.add_product(reaction, product);
    graph.add_control(
        InteractionClass::TemplateReactionRegulation,
        Some(controller),
        Some(reaction),
        control_type,
    );
    Ok(())
}

fn with_participants(
    graph: &mut Graph,
    class: InteractionClass,
    participants: &[EntityDescriptor],
) -> Result<()> {
    let interaction = graph.insert_interaction(class);
    for descriptor in participants {
        let participant = resolve_plain(graph, descriptor)?;
        graph.add_participant(interaction, participant);
    }
    Ok(())
}

// ============================================================================
// Controlled pairs
// ============================================================================

fn controlled_pair(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    target: &EntityDescriptor,
    control_type: Option<ControlType>,
    strict: bool,
) -> Result<Outcome> {
    let source = controller.kind()?.entity_class();
    let sink = target.kind()?.entity_class();

    if source.is_macromolecule_or_complex() && sink.is_macromolecule_or_complex() {
        control_sequence(graph, controller, target, control_type)?;
    } else if source == EntityClass::Protein && sink == EntityClass::SmallMolecule {
        let side = if control_type == Some(ControlType::Activation) {
            Side::Right
        } else {
            Side::Left
        };
        consumption_or_production(graph, controller, target, side)?;
    } else if source == EntityClass::SmallMolecule && sink.is_macromolecule_or_complex() {
        modulation(graph, controller, target, control_type)?;
    } else if source == EntityClass::SmallMolecule && sink == EntityClass::SmallMolecule {
        chemical_conversion(graph, controller, target, control_type)?;
    } else {
        let (controller_kind, target_kind) = (kind_tag(controller), kind_tag(target));
        if strict {
            return Err(ConvertError::UnsupportedParticipants {
                controller: controller_kind,
                target: target_kind,
            });
        }
        tracing::warn!(
            controller = %controller_kind,
            target = %target_kind,
            "no construction for this participant pair; dropping template"
        );
        return Ok(Outcome::Dropped(format!(
            "unsupported participant pair {controller_kind} -> {target_kind}"
        )));
    }
    Ok(Outcome::Applied)
}

fn kind_tag(descriptor: &EntityDescriptor) -> String {
    descriptor
        .kind()
        .map(|k| k.tag().to_string())
        .unwrap_or_else(|_| descriptor.type_tag.clone())
}

/// Two-level chain: the target controls an unknown process, and the
/// controller controls that control.
fn control_sequence(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    target: &EntityDescriptor,
    control_type: Option<ControlType>,
) -> Result<()> {
    let first = resolve_plain(graph, controller)?;
    let second = resolve_plain(graph, target)?;

    let inner = graph.add_control(InteractionClass::Control, Some(second), None, control_type);
    graph.add_control(InteractionClass::Control, Some(first), Some(inner), control_type);
    Ok(())
}

/// Chemical modulating a catalysis whose process is unknown.
fn modulation(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    target: &EntityDescriptor,
    control_type: Option<ControlType>,
) -> Result<()> {
    let catalyst = resolve_plain(graph, target)?;
    let chemical = resolve_plain(graph, controller)?;

    let catalysis = graph.add_control(
        InteractionClass::Catalysis,
        Some(catalyst),
        None,
        Some(ControlType::Activation),
    );
    graph.add_control(
        InteractionClass::Modulation,
        Some(chemical),
        Some(catalysis),
        control_type,
    );
    Ok(())
}

fn chemical_conversion(
    graph: &mut Graph,
    source: &EntityDescriptor,
    sink: &EntityDescriptor,
    control_type: Option<ControlType>,
) -> Result<()> {
    let (source_side, sink_side) = if control_type == Some(ControlType::Inhibition) {
        (Side::Right, Side::Left)
    } else {
        (Side::Left, Side::Right)
    };
    let conversion = graph.add_conversion(InteractionClass::Conversion, None, None);
    let source = resolve_plain(graph, source)?;
    graph.add_to_side(conversion, source_side, source);
    let sink = resolve_plain(graph, sink)?;
    graph.add_to_side(conversion, sink_side, sink);
    Ok(())
}

// ============================================================================
// Reactions
// ============================================================================

fn consumption_or_production(
    graph: &mut Graph,
    controller: &EntityDescriptor,
    chemical: &EntityDescriptor,
    side: Side,
) -> Result<()> {
    let reaction = graph.add_conversion(InteractionClass::BiochemicalReaction, None, None);
    let chemical = resolve_plain(graph, chemical)?;
    graph.add_to_side(reaction, side, chemical);
    let catalyst = resolve_plain(graph, controller)?;
    graph.add_control(InteractionClass::Catalysis, Some(catalyst), Some(reaction), None);
    Ok(())
}

/// Free molecules on one side, their complex on `complex_side`.
fn complex_assembly(
    graph: &mut Graph,
    molecules: &[EntityDescriptor],
    complex_side: Side,
) -> Result<()> {
    let assembly = graph.add_conversion(InteractionClass::ComplexAssembly, None, None);
    let complex = resolve_plain(graph, &EntityDescriptor::complex(None, molecules.to_vec()))?;
    graph.add_to_side(assembly, complex_side, complex);
    for descriptor in molecules {
        let molecule = resolve_plain(graph, descriptor)?;
        graph.add_to_side(assembly, complex_side.opposite(), molecule);
    }
    Ok(())
}

fn biochemical_reaction(
    graph: &mut Graph,
    catalyzer: Option<&EntityDescriptor>,
    inputs: &[EntityDescriptor],
    outputs: &[EntityDescriptor],
) -> Result<()> {
    let reaction = graph.add_conversion(InteractionClass::BiochemicalReaction, None, None);
    for descriptor in inputs {
        let input = resolve_plain(graph, descriptor)?;
        graph.add_to_side(reaction, Side::Left, input);
    }
    for descriptor in outputs {
        let output = resolve_plain(graph, descriptor)?;
        graph.add_to_side(reaction, Side::Right, output);
    }
    if let Some(catalyzer) = catalyzer {
        let catalyst = resolve_plain(graph, catalyzer)?;
        graph.add_control(InteractionClass::Catalysis, Some(catalyst), Some(reaction), None);
    }
    Ok(())
}
