//! Template vocabulary and field extraction.
//!
//! A template is one JSON object with a `type` string and type-specific
//! fields. Parsing turns it into a [`Template`] that names exactly what the
//! handlers need, so nothing downstream looks at raw JSON.

use crate::descriptor::EntityDescriptor;
use crate::error::{ConvertError, Result};
use factoid_graph::{ControlType, Side};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

// ============================================================================
// Vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    ProteinControlsState,
    ChemicalAffectsState,
    ExpressionRegulation,
    MolecularInteraction,
    OtherInteraction,
    // Legacy vocabulary only.
    ProteinModification,
    ProteinControlsConsumption,
    ProteinControlsProduction,
    ComplexAssociation,
    ComplexDissociation,
    BiochemicalReaction,
    ActivationInhibition,
}

impl TemplateKind {
    pub const CURRENT: [TemplateKind; 5] = [
        TemplateKind::ProteinControlsState,
        TemplateKind::ChemicalAffectsState,
        TemplateKind::ExpressionRegulation,
        TemplateKind::MolecularInteraction,
        TemplateKind::OtherInteraction,
    ];

    pub const LEGACY: [TemplateKind; 11] = [
        TemplateKind::ProteinControlsState,
        TemplateKind::ChemicalAffectsState,
        TemplateKind::ExpressionRegulation,
        TemplateKind::MolecularInteraction,
        TemplateKind::ProteinModification,
        TemplateKind::ProteinControlsConsumption,
        TemplateKind::ProteinControlsProduction,
        TemplateKind::ComplexAssociation,
        TemplateKind::ComplexDissociation,
        TemplateKind::BiochemicalReaction,
        TemplateKind::ActivationInhibition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::ProteinControlsState => "Protein Controls State",
            TemplateKind::ChemicalAffectsState => "Chemical Affects State",
            TemplateKind::ExpressionRegulation => "Expression Regulation",
            TemplateKind::MolecularInteraction => "Molecular Interaction",
            TemplateKind::OtherInteraction => "Other Interaction",
            TemplateKind::ProteinModification => "Protein Modification",
            TemplateKind::ProteinControlsConsumption => "Protein Controls Consumption",
            TemplateKind::ProteinControlsProduction => "Protein Controls Production",
            TemplateKind::ComplexAssociation => "Complex Association",
            TemplateKind::ComplexDissociation => "Complex Dissociation",
            TemplateKind::BiochemicalReaction => "Biochemical Reaction",
            TemplateKind::ActivationInhibition => "Activation Inhibition",
        }
    }

    /// Case-insensitive exact match against one protocol's vocabulary.
    pub fn lookup(type_str: &str, legacy: bool) -> Option<Self> {
        let vocabulary: &[TemplateKind] = if legacy {
            &Self::LEGACY
        } else {
            &Self::CURRENT
        };
        vocabulary
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(type_str))
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Parsed templates
// ============================================================================

/// The control edge that wraps a state-change conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEdge {
    /// Catalysis with its control type fixed to activation.
    Catalysis,
    /// Plain Control carrying the template's control type.
    Control,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// The target flips between an inactive and an active form.
    ControlsState {
        controller: EntityDescriptor,
        target: EntityDescriptor,
        modification: Option<String>,
        control_type: Option<ControlType>,
        edge: StateEdge,
    },
    ExpressionRegulation {
        controller: EntityDescriptor,
        target: EntityDescriptor,
        control_type: Option<ControlType>,
    },
    MolecularInteraction {
        participants: Vec<EntityDescriptor>,
    },
    /// Other Interaction without a control type.
    Interaction {
        participants: Vec<EntityDescriptor>,
    },
    /// Other Interaction with a control type; dispatched by the participant
    /// class pair. The control type is `None` when the given string was not
    /// recognized.
    ControlledPair {
        controller: EntityDescriptor,
        target: EntityDescriptor,
        control_type: Option<ControlType>,
    },
    ConsumptionOrProduction {
        controller: EntityDescriptor,
        chemical: EntityDescriptor,
        side: Side,
    },
    ComplexAssembly {
        molecules: Vec<EntityDescriptor>,
        complex_side: Side,
    },
    BiochemicalReaction {
        catalyzer: Option<EntityDescriptor>,
        inputs: Vec<EntityDescriptor>,
        outputs: Vec<EntityDescriptor>,
    },
}

impl Template {
    /// Extract the fields `kind` requires from a template object.
    pub fn parse(kind: TemplateKind, value: &Value) -> Result<Self> {
        let template = match kind {
            TemplateKind::ProteinControlsState | TemplateKind::ChemicalAffectsState
                if !is_legacy_state(value) =>
            {
                let f: StateFields = fields(kind, value)?;
                Template::ControlsState {
                    controller: f.controller,
                    target: f.target,
                    modification: f.modification,
                    control_type: control_type(kind, f.control_type.as_deref()),
                    edge: StateEdge::Catalysis,
                }
            }
            TemplateKind::ProteinControlsState | TemplateKind::ChemicalAffectsState => {
                let f: LegacyStateFields = fields(kind, value)?;
                Template::ControlsState {
                    controller: f.controller_protein,
                    target: f.target_protein,
                    modification: None,
                    control_type: control_type(kind, Some(&f.control_type)),
                    edge: StateEdge::Catalysis,
                }
            }
            TemplateKind::ExpressionRegulation if value.get("transcriptionFactor").is_some() => {
                let f: LegacyExpressionFields = fields(kind, value)?;
                Template::ExpressionRegulation {
                    controller: f.transcription_factor,
                    target: f.target_protein,
                    control_type: control_type(kind, Some(&f.control_type)),
                }
            }
            TemplateKind::ExpressionRegulation => {
                let f: RegulationFields = fields(kind, value)?;
                Template::ExpressionRegulation {
                    controller: f.controller,
                    target: f.target,
                    control_type: control_type(kind, Some(&f.control_type)),
                }
            }
            TemplateKind::MolecularInteraction if value.get("moleculeList").is_some() => {
                let f: MoleculeListFields = fields(kind, value)?;
                Template::MolecularInteraction {
                    participants: f.molecule_list,
                }
            }
            TemplateKind::MolecularInteraction => {
                let f: ParticipantFields = fields(kind, value)?;
                Template::MolecularInteraction {
                    participants: f.participants,
                }
            }
            TemplateKind::OtherInteraction => {
                let f: ParticipantFields = fields(kind, value)?;
                match f.control_type {
                    None => Template::Interaction {
                        participants: f.participants,
                    },
                    Some(raw) => {
                        let count = f.participants.len();
                        let [controller, target]: [EntityDescriptor; 2] =
                            f.participants.try_into().map_err(|_| {
                                ConvertError::malformed(
                                    kind.name(),
                                    format!(
                                        "a controlled interaction needs exactly two participants, got {count}"
                                    ),
                                )
                            })?;
                        Template::ControlledPair {
                            controller,
                            target,
                            control_type: control_type(kind, Some(&raw)),
                        }
                    }
                }
            }
            TemplateKind::ProteinModification => {
                let f: LegacyModificationFields = fields(kind, value)?;
                Template::ControlsState {
                    controller: f.controller_protein,
                    target: f.target_protein,
                    modification: Some(f.modification),
                    control_type: control_type(kind, Some(&f.control_type)),
                    edge: StateEdge::Catalysis,
                }
            }
            TemplateKind::ActivationInhibition => {
                let f: LegacyStateFields = fields(kind, value)?;
                Template::ControlsState {
                    controller: f.controller_protein,
                    target: f.target_protein,
                    modification: None,
                    control_type: control_type(kind, Some(&f.control_type)),
                    edge: StateEdge::Control,
                }
            }
            TemplateKind::ProteinControlsConsumption | TemplateKind::ProteinControlsProduction => {
                let f: LegacyConsumptionFields = fields(kind, value)?;
                let side = if kind == TemplateKind::ProteinControlsConsumption {
                    Side::Left
                } else {
                    Side::Right
                };
                Template::ConsumptionOrProduction {
                    controller: f.controller_protein,
                    chemical: f.chemical,
                    side,
                }
            }
            TemplateKind::ComplexAssociation | TemplateKind::ComplexDissociation => {
                let f: MoleculeListFields = fields(kind, value)?;
                let complex_side = if kind == TemplateKind::ComplexAssociation {
                    Side::Right
                } else {
                    Side::Left
                };
                Template::ComplexAssembly {
                    molecules: f.molecule_list,
                    complex_side,
                }
            }
            TemplateKind::BiochemicalReaction => {
                let f: LegacyReactionFields = fields(kind, value)?;
                Template::BiochemicalReaction {
                    catalyzer: f.catalyzer,
                    inputs: f.inputs,
                    outputs: f.outputs,
                }
            }
        };
        Ok(template)
    }

    /// Every top-level descriptor the template mentions.
    pub fn descriptors(&self) -> Vec<&EntityDescriptor> {
        match self {
            Template::ControlsState {
                controller, target, ..
            }
            | Template::ExpressionRegulation {
                controller, target, ..
            }
            | Template::ControlledPair {
                controller, target, ..
            } => vec![controller, target],
            Template::ConsumptionOrProduction {
                controller,
                chemical,
                ..
            } => vec![controller, chemical],
            Template::MolecularInteraction { participants }
            | Template::Interaction { participants } => participants.iter().collect(),
            Template::ComplexAssembly { molecules, .. } => molecules.iter().collect(),
            Template::BiochemicalReaction {
                catalyzer,
                inputs,
                outputs,
            } => catalyzer.iter().chain(inputs).chain(outputs).collect(),
        }
    }

    /// Validate every descriptor tree; runs before any node is created.
    pub fn validate(&self) -> Result<()> {
        self.descriptors()
            .into_iter()
            .try_for_each(EntityDescriptor::validate)
    }
}

fn is_legacy_state(value: &Value) -> bool {
    value.get("targetProtein").is_some()
}

fn fields<T: DeserializeOwned>(kind: TemplateKind, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| ConvertError::malformed(kind.name(), e.to_string()))
}

fn control_type(kind: TemplateKind, raw: Option<&str>) -> Option<ControlType> {
    let raw = raw?;
    let parsed = ControlType::parse(raw);
    if parsed.is_none() {
        tracing::warn!(template = %kind, control_type = %raw, "unrecognized control type; treating as unset");
    }
    parsed
}

// ============================================================================
// Field layouts
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFields {
    controller: EntityDescriptor,
    target: EntityDescriptor,
    #[serde(default)]
    control_type: Option<String>,
    #[serde(default)]
    modification: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegulationFields {
    controller: EntityDescriptor,
    target: EntityDescriptor,
    control_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantFields {
    participants: Vec<EntityDescriptor>,
    #[serde(default)]
    control_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoleculeListFields {
    molecule_list: Vec<EntityDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStateFields {
    #[serde(alias = "chemical")]
    controller_protein: EntityDescriptor,
    target_protein: EntityDescriptor,
    control_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyModificationFields {
    controller_protein: EntityDescriptor,
    target_protein: EntityDescriptor,
    modification: String,
    control_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyExpressionFields {
    transcription_factor: EntityDescriptor,
    target_protein: EntityDescriptor,
    control_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyConsumptionFields {
    controller_protein: EntityDescriptor,
    chemical: EntityDescriptor,
}

#[derive(Deserialize)]
struct LegacyReactionFields {
    #[serde(default)]
    catalyzer: Option<EntityDescriptor>,
    #[serde(default)]
    inputs: Vec<EntityDescriptor>,
    #[serde(default)]
    outputs: Vec<EntityDescriptor>,
}
