//! Template handler tests: the sub-graph each template produces

use factoid_graph::{
    ControlType, EntityClass, EntityId, Graph, Interaction, InteractionClass, InteractionId,
};
use factoid_templates::{convert_document, BuildReport, ConvertConfig, ConvertError};
use serde_json::{json, Value};

fn build(document: Value) -> (Graph, BuildReport) {
    convert_document(&document.to_string(), &ConvertConfig::default()).expect("document converts")
}

fn only(g: &Graph, class: InteractionClass) -> (InteractionId, &Interaction) {
    let found: Vec<_> = g.interactions().filter(|(_, x)| x.class == class).collect();
    assert_eq!(found.len(), 1, "expected exactly one {class}");
    found[0]
}

fn terms(g: &Graph, entity: EntityId) -> (Vec<&str>, Vec<&str>) {
    let e = g.entity(entity);
    (
        g.feature_terms(&e.features).into_iter().collect(),
        g.feature_terms(&e.not_features).into_iter().collect(),
    )
}

fn name(g: &Graph, entity: EntityId) -> &str {
    g.entity(entity).name.as_deref().unwrap_or("")
}

fn protein(name: &str, id: &str) -> Value {
    json!({"type": "protein", "name": name, "xref": {"id": id, "db": "uniprot"}})
}

fn chemical(name: &str, id: &str) -> Value {
    json!({"type": "chemical", "name": name, "xref": {"id": id, "db": "pubchem"}})
}

// ============================================================================
// Protein Controls State
// ============================================================================

fn controls_state(control_type: &str) -> Value {
    json!({"interactions": [{
        "type": "Protein Controls State",
        "controller": protein("MDM2", "Q00987"),
        "target": protein("TP53", "P04637"),
        "controlType": control_type
    }]})
}

#[test]
fn test_controls_state_activation() {
    let (g, _) = build(controls_state("activation"));
    let (conversion_id, conversion) = only(&g, InteractionClass::Conversion);

    assert_eq!(terms(&g, conversion.left[0]), (vec![], vec!["active"]));
    assert_eq!(terms(&g, conversion.right[0]), (vec!["active"], vec![]));

    let (_, catalysis) = only(&g, InteractionClass::Catalysis);
    assert_eq!(catalysis.controlled, Some(conversion_id));
    assert_eq!(catalysis.control_type, Some(ControlType::Activation));
    assert_eq!(name(&g, catalysis.controller.unwrap()), "MDM2");
}

#[test]
fn test_controls_state_inhibition_swaps_sides_but_not_catalysis_type() {
    let (g, _) = build(controls_state("INHIBITION"));
    let (_, conversion) = only(&g, InteractionClass::Conversion);

    assert_eq!(terms(&g, conversion.left[0]), (vec!["active"], vec![]));
    assert_eq!(terms(&g, conversion.right[0]), (vec![], vec!["active"]));

    let (_, catalysis) = only(&g, InteractionClass::Catalysis);
    assert_eq!(catalysis.control_type, Some(ControlType::Activation));
}

#[test]
fn test_controls_state_shares_the_active_feature() {
    let (g, _) = build(controls_state("activation"));
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    let left = g.entity(conversion.left[0]);
    let right = g.entity(conversion.right[0]);
    assert_eq!(left.reference, right.reference);
    assert_eq!(left.not_features, right.features);
}

#[test]
fn test_controls_state_with_modification() {
    let (g, _) = build(json!({"interactions": [{
        "type": "Protein Controls State",
        "controller": protein("CDK1", "P06493"),
        "target": protein("TP53", "P04637"),
        "controlType": "activation",
        "modification": "phosphorylated"
    }]}));
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    assert_eq!(
        terms(&g, conversion.left[0]),
        (vec![], vec!["active", "phosphorylated"])
    );
    assert_eq!(
        terms(&g, conversion.right[0]),
        (vec!["active", "phosphorylated"], vec![])
    );
}

#[test]
fn test_controls_state_without_control_type() {
    let (g, _) = build(json!({"interactions": [{
        "type": "Protein Controls State",
        "controller": protein("MDM2", "Q00987"),
        "target": protein("TP53", "P04637")
    }]}));
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    // No state terms: both sides resolve to the same plain instance.
    assert_eq!(conversion.left, conversion.right);
    assert_eq!(g.features().count(), 0);
}

#[test]
fn test_chemical_affects_state() {
    let (g, _) = build(json!({"interactions": [{
        "type": "Chemical Affects State",
        "controller": chemical("Nutlin-3", "216345"),
        "target": protein("MDM2", "Q00987"),
        "controlType": "inhibition"
    }]}));
    let (_, catalysis) = only(&g, InteractionClass::Catalysis);
    let controller = g.entity(catalysis.controller.unwrap());
    assert_eq!(controller.class, EntityClass::SmallMolecule);
    assert_eq!(catalysis.control_type, Some(ControlType::Activation));
}

// ============================================================================
// Expression regulation and plain interactions
// ============================================================================

#[test]
fn test_expression_regulation_carries_real_control_type() {
    let (g, _) = build(json!({"interactions": [{
        "type": "Expression Regulation",
        "controller": protein("TP53", "P04637"),
        "target": protein("CDKN1A", "P38936"),
        "controlType": "inhibition"
    }]}));
    let (reaction_id, reaction) = only(&g, InteractionClass::TemplateReaction);
    assert_eq!(reaction.products.len(), 1);
    assert_eq!(name(&g, reaction.products[0]), "CDKN1A");

    let (_, regulation) = only(&g, InteractionClass::TemplateReactionRegulation);
    assert_eq!(regulation.controlled, Some(reaction_id));
    assert_eq!(regulation.control_type, Some(ControlType::Inhibition));
    assert_eq!(name(&g, regulation.controller.unwrap()), "TP53");
}

#[test]
fn test_other_interaction_without_control_type() {
    let (g, _) = build(json!({"interactions": [{
        "type": "Other Interaction",
        "participants": [protein("A", "P1"), chemical("B", "2"), {"type": "entity", "name": "C"}]
    }]}));
    let (_, interaction) = only(&g, InteractionClass::Interaction);
    assert_eq!(interaction.participants.len(), 3);
    assert_eq!(g.count_interactions(InteractionClass::MolecularInteraction), 0);
}

// ============================================================================
// Other Interaction with a control type
// ============================================================================

fn controlled(controller: Value, target: Value, control_type: &str) -> Graph {
    build(json!({"interactions": [{
        "type": "Other Interaction",
        "controlType": control_type,
        "participants": [controller, target]
    }]}))
    .0
}

#[test]
fn test_macromolecule_pair_builds_a_control_chain() {
    let g = controlled(protein("A", "P1"), protein("B", "P2"), "inhibition");
    let controls: Vec<_> = g
        .interactions()
        .filter(|(_, x)| x.class == InteractionClass::Control)
        .collect();
    assert_eq!(controls.len(), 2);

    let (inner_id, inner) = controls[0];
    let (_, outer) = controls[1];
    assert_eq!(name(&g, inner.controller.unwrap()), "B");
    assert_eq!(inner.controlled, None);
    assert_eq!(inner.control_type, Some(ControlType::Inhibition));
    assert_eq!(name(&g, outer.controller.unwrap()), "A");
    assert_eq!(outer.controlled, Some(inner_id));
    assert_eq!(outer.control_type, Some(ControlType::Inhibition));
}

#[test]
fn test_complex_target_counts_as_macromolecule() {
    let complex = json!({"type": "complex", "name": "c", "components": [protein("X", "P9")]});
    let g = controlled(protein("A", "P1"), complex, "activation");
    assert_eq!(g.count_interactions(InteractionClass::Control), 2);
}

#[test]
fn test_protein_to_chemical_activation_is_production() {
    let g = controlled(protein("E", "P1"), chemical("P", "2"), "activation");
    let (reaction_id, reaction) = only(&g, InteractionClass::BiochemicalReaction);
    assert!(reaction.left.is_empty());
    assert_eq!(name(&g, reaction.right[0]), "P");

    let (_, catalysis) = only(&g, InteractionClass::Catalysis);
    assert_eq!(catalysis.controlled, Some(reaction_id));
    assert_eq!(catalysis.control_type, None);
}

#[test]
fn test_protein_to_chemical_inhibition_is_consumption() {
    let g = controlled(protein("E", "P1"), chemical("S", "2"), "inhibition");
    let (_, reaction) = only(&g, InteractionClass::BiochemicalReaction);
    assert_eq!(name(&g, reaction.left[0]), "S");
    assert!(reaction.right.is_empty());
}

#[test]
fn test_chemical_to_protein_is_modulation() {
    let g = controlled(chemical("Progesterone", "5994"), protein("LEP", "P41159"), "inhibition");
    let (catalysis_id, catalysis) = only(&g, InteractionClass::Catalysis);
    assert_eq!(name(&g, catalysis.controller.unwrap()), "LEP");
    assert_eq!(catalysis.controlled, None);
    assert_eq!(catalysis.control_type, Some(ControlType::Activation));

    let (_, modulation) = only(&g, InteractionClass::Modulation);
    assert_eq!(name(&g, modulation.controller.unwrap()), "Progesterone");
    assert_eq!(modulation.controlled, Some(catalysis_id));
    assert_eq!(modulation.control_type, Some(ControlType::Inhibition));
}

#[test]
fn test_chemical_pair_is_a_conversion() {
    let g = controlled(chemical("A", "1"), chemical("B", "2"), "activation");
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    assert_eq!(name(&g, conversion.left[0]), "A");
    assert_eq!(name(&g, conversion.right[0]), "B");

    let g = controlled(chemical("A", "1"), chemical("B", "2"), "inhibition");
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    assert_eq!(name(&g, conversion.left[0]), "B");
    assert_eq!(name(&g, conversion.right[0]), "A");
}

#[test]
fn test_unmatched_pair_is_dropped() {
    let (g, report) = build(json!({"interactions": [{
        "type": "Other Interaction",
        "controlType": "activation",
        "participants": [chemical("A", "1"), {"type": "entity", "name": "stress"}]
    }]}));
    assert_eq!(g.interactions().count(), 0);
    assert_eq!(report.applied, 0);
    assert_eq!(report.dropped.len(), 1);
}

#[test]
fn test_unmatched_pair_fails_in_strict_mode() {
    let document = json!({"interactions": [{
        "type": "Other Interaction",
        "controlType": "activation",
        "participants": [{"type": "dna", "name": "enhancer"}, chemical("A", "1")]
    }]});
    let err = convert_document(&document.to_string(), &ConvertConfig::default().strict(true))
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedParticipants { .. }));
}

#[test]
fn test_malformed_template_is_a_request_error() {
    let document = json!({"interactions": [{
        "type": "Expression Regulation",
        "controller": protein("TP53", "P04637")
    }]});
    let err = convert_document(&document.to_string(), &ConvertConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedTemplate { ref template, .. } if template == "Expression Regulation"));
}

// ============================================================================
// Legacy protocol
// ============================================================================

#[test]
fn test_legacy_complex_association_and_dissociation() {
    let molecules = json!([protein("CDK2", "P24941"), protein("CCNE1", "P24864")]);
    let (g, report) = build(json!([
        {"type": "Complex Association", "moleculeList": molecules},
        {"type": "Complex Dissociation", "moleculeList": molecules}
    ]));
    assert_eq!(report.applied, 2);
    assert_eq!(g.count_entities(EntityClass::Complex), 1);

    let assemblies: Vec<_> = g
        .interactions()
        .filter(|(_, x)| x.class == InteractionClass::ComplexAssembly)
        .map(|(_, x)| x)
        .collect();
    assert_eq!(assemblies.len(), 2);
    let association = assemblies[0];
    assert_eq!(association.left.len(), 2);
    assert_eq!(g.entity(association.right[0]).class, EntityClass::Complex);
    let dissociation = assemblies[1];
    assert_eq!(g.entity(dissociation.left[0]).class, EntityClass::Complex);
    assert_eq!(dissociation.right, association.left);
}

#[test]
fn test_legacy_biochemical_reaction() {
    let (g, _) = build(json!([{
        "type": "Biochemical Reaction",
        "catalyzer": protein("HK1", "P19367"),
        "inputs": [chemical("glucose", "5793"), chemical("ATP", "5957")],
        "outputs": [chemical("glucose-6-phosphate", "5958"), chemical("ADP", "6022")]
    }]));
    let (reaction_id, reaction) = only(&g, InteractionClass::BiochemicalReaction);
    assert_eq!(reaction.left.len(), 2);
    assert_eq!(reaction.right.len(), 2);
    let (_, catalysis) = only(&g, InteractionClass::Catalysis);
    assert_eq!(catalysis.controlled, Some(reaction_id));
    assert_eq!(catalysis.control_type, None);
}

#[test]
fn test_legacy_activation_inhibition_uses_plain_control() {
    let (g, _) = build(json!([{
        "type": "Activation Inhibition",
        "controllerProtein": protein("MDM2", "Q00987"),
        "targetProtein": protein("TP53", "P04637"),
        "controlType": "inhibition"
    }]));
    let (_, control) = only(&g, InteractionClass::Control);
    assert_eq!(control.control_type, Some(ControlType::Inhibition));
    assert_eq!(g.count_interactions(InteractionClass::Catalysis), 0);
}

#[test]
fn test_legacy_protein_modification() {
    let (g, _) = build(json!([{
        "type": "Protein Modification",
        "controllerProtein": protein("CDK1", "P06493"),
        "targetProtein": protein("TP53", "P04637"),
        "modification": "phosphorylated",
        "controlType": "activation"
    }]));
    let (_, conversion) = only(&g, InteractionClass::Conversion);
    assert_eq!(
        terms(&g, conversion.right[0]),
        (vec!["active", "phosphorylated"], vec![])
    );
}

#[test]
fn test_legacy_consumption() {
    let (g, _) = build(json!([{
        "type": "Protein Controls Consumption",
        "controllerProtein": protein("HK1", "P19367"),
        "chemical": chemical("glucose", "5793")
    }]));
    let (_, reaction) = only(&g, InteractionClass::BiochemicalReaction);
    assert_eq!(name(&g, reaction.left[0]), "glucose");
}

#[test]
fn test_legacy_location_change_is_unrecognized() {
    let (g, report) = build(json!([{"type": "Location Change", "macromoleculeList": []}]));
    assert_eq!(g.node_count(), 0);
    assert_eq!(report.unknown.len(), 1);
}
