//! Factoid graph store
//!
//! An in-memory, single-writer graph of BioPAX-style nodes built by one
//! document conversion pass:
//!
//! - **Xrefs**: external database cross-references (relationship, publication,
//!   unification).
//! - **Entity references**: the canonical "kind of molecule" nodes.
//! - **Features**: named modification/state terms, minted by a reference and
//!   shared by every instance of that reference.
//! - **Physical entities**: concrete instances in a given feature/complex state.
//! - **Interactions**: conversions, controls, molecular interactions and
//!   template reactions.
//!
//! ## Identity
//!
//! Every node lives in a typed arena and is addressed by a `u32` newtype id.
//! Ids are handed out by this graph only and are never reused or invalidated;
//! there is no deletion. The canonical caches (xref cache, reference cache and
//! the pool of reference-less physical entities) grow monotonically.
//!
//! ## Concurrency
//!
//! A `Graph` is owned by exactly one build. Concurrent conversions each get
//! their own instance; nothing here is shared or locked.

pub mod biopax_xml;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use biopax_xml::{write_biopax_xml, WriterOptions, BIOPAX_NS, DEFAULT_BASE_IRI};

// ============================================================================
// Node ids
// ============================================================================

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn raw(self) -> u32 {
                self.0
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Id of an [`Xref`] node.
    XrefId
);
arena_id!(
    /// Id of an [`EntityReference`] node.
    ReferenceId
);
arena_id!(
    /// Id of a [`Feature`] node.
    FeatureId
);
arena_id!(
    /// Id of a [`PhysicalEntity`] node.
    EntityId
);
arena_id!(
    /// Id of an [`Interaction`] node (conversions and controls alike).
    InteractionId
);

fn next_id(len: usize) -> u32 {
    u32::try_from(len).expect("graph arena exceeded u32::MAX nodes")
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Physical entity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityClass {
    Protein,
    SmallMolecule,
    DnaRegion,
    Rna,
    Complex,
    /// Generic `PhysicalEntity` (no reference, no feature matching).
    PhysicalEntity,
}

impl EntityClass {
    pub const ALL: [EntityClass; 6] = [
        EntityClass::Protein,
        EntityClass::SmallMolecule,
        EntityClass::DnaRegion,
        EntityClass::Rna,
        EntityClass::Complex,
        EntityClass::PhysicalEntity,
    ];

    /// The reference class instances of this class point at, if any.
    pub fn reference_class(self) -> Option<ReferenceClass> {
        match self {
            EntityClass::Protein => Some(ReferenceClass::ProteinReference),
            EntityClass::SmallMolecule => Some(ReferenceClass::SmallMoleculeReference),
            EntityClass::DnaRegion => Some(ReferenceClass::DnaRegionReference),
            EntityClass::Rna => Some(ReferenceClass::RnaReference),
            EntityClass::Complex | EntityClass::PhysicalEntity => None,
        }
    }

    /// Protein, DNA region or RNA.
    pub fn is_macromolecule(self) -> bool {
        matches!(
            self,
            EntityClass::Protein | EntityClass::DnaRegion | EntityClass::Rna
        )
    }

    pub fn is_macromolecule_or_complex(self) -> bool {
        self.is_macromolecule() || self == EntityClass::Complex
    }

    pub fn biopax_name(self) -> &'static str {
        match self {
            EntityClass::Protein => "Protein",
            EntityClass::SmallMolecule => "SmallMolecule",
            EntityClass::DnaRegion => "DnaRegion",
            EntityClass::Rna => "Rna",
            EntityClass::Complex => "Complex",
            EntityClass::PhysicalEntity => "PhysicalEntity",
        }
    }

    /// Parse a BioPAX class local name. `Dna` and `RnaRegion` fold onto the
    /// classes the converter emits.
    pub fn from_biopax_name(name: &str) -> Option<Self> {
        match name {
            "Protein" => Some(EntityClass::Protein),
            "SmallMolecule" => Some(EntityClass::SmallMolecule),
            "DnaRegion" | "Dna" => Some(EntityClass::DnaRegion),
            "Rna" | "RnaRegion" => Some(EntityClass::Rna),
            "Complex" => Some(EntityClass::Complex),
            "PhysicalEntity" => Some(EntityClass::PhysicalEntity),
            _ => None,
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.biopax_name())
    }
}

/// Entity reference classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceClass {
    ProteinReference,
    SmallMoleculeReference,
    DnaRegionReference,
    RnaReference,
}

impl ReferenceClass {
    pub fn biopax_name(self) -> &'static str {
        match self {
            ReferenceClass::ProteinReference => "ProteinReference",
            ReferenceClass::SmallMoleculeReference => "SmallMoleculeReference",
            ReferenceClass::DnaRegionReference => "DnaRegionReference",
            ReferenceClass::RnaReference => "RnaReference",
        }
    }

    pub fn from_biopax_name(name: &str) -> Option<Self> {
        match name {
            "ProteinReference" => Some(ReferenceClass::ProteinReference),
            "SmallMoleculeReference" => Some(ReferenceClass::SmallMoleculeReference),
            "DnaRegionReference" | "DnaReference" => Some(ReferenceClass::DnaRegionReference),
            "RnaReference" | "RnaRegionReference" => Some(ReferenceClass::RnaReference),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.biopax_name())
    }
}

/// Interaction classes (processes and control edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InteractionClass {
    Conversion,
    BiochemicalReaction,
    ComplexAssembly,
    MolecularInteraction,
    Interaction,
    TemplateReaction,
    Control,
    Catalysis,
    Modulation,
    TemplateReactionRegulation,
}

impl InteractionClass {
    pub const ALL: [InteractionClass; 10] = [
        InteractionClass::Conversion,
        InteractionClass::BiochemicalReaction,
        InteractionClass::ComplexAssembly,
        InteractionClass::MolecularInteraction,
        InteractionClass::Interaction,
        InteractionClass::TemplateReaction,
        InteractionClass::Control,
        InteractionClass::Catalysis,
        InteractionClass::Modulation,
        InteractionClass::TemplateReactionRegulation,
    ];

    pub fn is_conversion(self) -> bool {
        matches!(
            self,
            InteractionClass::Conversion
                | InteractionClass::BiochemicalReaction
                | InteractionClass::ComplexAssembly
        )
    }

    /// Control and its subclasses: they carry controller/controlled/controlType.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            InteractionClass::Control
                | InteractionClass::Catalysis
                | InteractionClass::Modulation
                | InteractionClass::TemplateReactionRegulation
        )
    }

    pub fn biopax_name(self) -> &'static str {
        match self {
            InteractionClass::Conversion => "Conversion",
            InteractionClass::BiochemicalReaction => "BiochemicalReaction",
            InteractionClass::ComplexAssembly => "ComplexAssembly",
            InteractionClass::MolecularInteraction => "MolecularInteraction",
            InteractionClass::Interaction => "Interaction",
            InteractionClass::TemplateReaction => "TemplateReaction",
            InteractionClass::Control => "Control",
            InteractionClass::Catalysis => "Catalysis",
            InteractionClass::Modulation => "Modulation",
            InteractionClass::TemplateReactionRegulation => "TemplateReactionRegulation",
        }
    }

    pub fn from_biopax_name(name: &str) -> Option<Self> {
        InteractionClass::ALL
            .into_iter()
            .find(|class| class.biopax_name() == name)
    }
}

impl fmt::Display for InteractionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.biopax_name())
    }
}

/// Polarity of a control edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlType {
    Activation,
    Inhibition,
}

impl ControlType {
    /// Case-insensitive parse of `activation` / `inhibition`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("activation") {
            Some(ControlType::Activation)
        } else if s.eq_ignore_ascii_case("inhibition") {
            Some(ControlType::Inhibition)
        } else {
            None
        }
    }

    pub fn biopax_name(self) -> &'static str {
        match self {
            ControlType::Activation => "ACTIVATION",
            ControlType::Inhibition => "INHIBITION",
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.biopax_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionDirection {
    LeftToRight,
    RightToLeft,
    Reversible,
}

impl ConversionDirection {
    pub fn biopax_name(self) -> &'static str {
        match self {
            ConversionDirection::LeftToRight => "LEFT_TO_RIGHT",
            ConversionDirection::RightToLeft => "RIGHT_TO_LEFT",
            ConversionDirection::Reversible => "REVERSIBLE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "LEFT_TO_RIGHT" => Some(ConversionDirection::LeftToRight),
            "RIGHT_TO_LEFT" => Some(ConversionDirection::RightToLeft),
            "REVERSIBLE" => Some(ConversionDirection::Reversible),
            _ => None,
        }
    }
}

/// Side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XrefKind {
    Relationship,
    Publication,
    Unification,
}

impl XrefKind {
    pub fn biopax_name(self) -> &'static str {
        match self {
            XrefKind::Relationship => "RelationshipXref",
            XrefKind::Publication => "PublicationXref",
            XrefKind::Unification => "UnificationXref",
        }
    }

    pub fn from_biopax_name(name: &str) -> Option<Self> {
        match name {
            "RelationshipXref" => Some(XrefKind::Relationship),
            "PublicationXref" => Some(XrefKind::Publication),
            "UnificationXref" => Some(XrefKind::Unification),
            _ => None,
        }
    }
}

/// How relationship xrefs are deduplicated.
///
/// `IdOnly` collapses two xrefs with the same id under different databases onto
/// one node (the first database seen wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XrefKeyMode {
    #[default]
    #[serde(rename = "id")]
    IdOnly,
    IdAndDb,
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xref {
    pub kind: XrefKind,
    pub id: String,
    pub db: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityReference {
    pub class: ReferenceClass,
    pub name: Option<String>,
    pub xref: Option<XrefId>,
    /// Every feature this reference has minted, in creation order.
    pub features: Vec<FeatureId>,
    /// Physical entities built from this reference, in creation order.
    pub instances: Vec<EntityId>,
}

/// A modification/state term. Features minted for a reference are shared by
/// all of its instances; features of reference-less entities have no owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub term: String,
    pub owner: Option<ReferenceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalEntity {
    pub class: EntityClass,
    pub name: Option<String>,
    pub reference: Option<ReferenceId>,
    pub features: BTreeSet<FeatureId>,
    pub not_features: BTreeSet<FeatureId>,
    pub in_complex: bool,
    /// Complex components (ordered, no duplicates).
    pub components: Vec<EntityId>,
}

/// Supporting evidence on an interaction: evidence codes (e.g. `MI:0074`)
/// and supporting xrefs (typically publications).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub codes: Vec<String>,
    pub xrefs: Vec<XrefId>,
}

/// One interaction node. Which fields are meaningful depends on `class`:
/// conversions use `left`/`right`/`direction`, controls use
/// `controller`/`controlled`/`control_type`, template reactions use
/// `products`, the rest use `participants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub class: InteractionClass,
    pub left: Vec<EntityId>,
    pub right: Vec<EntityId>,
    pub direction: Option<ConversionDirection>,
    pub participants: Vec<EntityId>,
    pub products: Vec<EntityId>,
    pub controller: Option<EntityId>,
    pub controlled: Option<InteractionId>,
    pub control_type: Option<ControlType>,
    pub evidence: Vec<Evidence>,
}

impl Interaction {
    fn new(class: InteractionClass) -> Self {
        Self {
            class,
            left: Vec::new(),
            right: Vec::new(),
            direction: None,
            participants: Vec::new(),
            products: Vec::new(),
            controller: None,
            controlled: None,
            control_type: None,
            evidence: Vec::new(),
        }
    }
}

/// A participant of an interaction in the BioPAX sense (super-property of
/// left, right, product, controller and controlled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participant {
    Entity(EntityId),
    Interaction(InteractionId),
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

// ============================================================================
// Graph
// ============================================================================

type XrefKey = (String, Option<String>);
type ReferenceKey = (ReferenceClass, Option<String>, Option<XrefId>);
type PoolKey = (EntityClass, Option<String>);

/// The graph store for one document build.
#[derive(Debug, Default)]
pub struct Graph {
    xrefs: Vec<Xref>,
    references: Vec<EntityReference>,
    features: Vec<Feature>,
    entities: Vec<PhysicalEntity>,
    interactions: Vec<Interaction>,
    publication: Option<XrefId>,

    xref_key_mode: XrefKeyMode,
    /// Relationship xrefs keyed per `xref_key_mode`.
    xref_cache: AHashMap<XrefKey, XrefId>,
    /// (class, name, resolved xref) -> reference.
    reference_cache: AHashMap<ReferenceKey, ReferenceId>,
    /// (class, name) -> reference-less physical entities (complexes, generics).
    no_ref_pool: AHashMap<PoolKey, Vec<EntityId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xref_key_mode(mode: XrefKeyMode) -> Self {
        Self {
            xref_key_mode: mode,
            ..Self::default()
        }
    }

    pub fn xref_key_mode(&self) -> XrefKeyMode {
        self.xref_key_mode
    }

    // ------------------------------------------------------------------------
    // Canonical get-or-create operations
    // ------------------------------------------------------------------------

    /// Get the relationship xref for `(id, db)`, creating it on first use.
    ///
    /// Under [`XrefKeyMode::IdOnly`] the cache key ignores `db`.
    pub fn get_or_create_xref(&mut self, id: &str, db: Option<&str>) -> XrefId {
        let key = self.xref_key(id, db);
        if let Some(&existing) = self.xref_cache.get(&key) {
            return existing;
        }
        let xref_id = self.insert_xref(Xref {
            kind: XrefKind::Relationship,
            id: id.to_string(),
            db: db.map(str::to_string),
        });
        self.xref_cache.insert(key, xref_id);
        xref_id
    }

    /// The relationship xref `(id, db)` would resolve to, without creating one.
    pub fn find_xref(&self, id: &str, db: Option<&str>) -> Option<XrefId> {
        self.xref_cache.get(&self.xref_key(id, db)).copied()
    }

    fn xref_key(&self, id: &str, db: Option<&str>) -> XrefKey {
        match self.xref_key_mode {
            XrefKeyMode::IdOnly => (id.to_string(), None),
            XrefKeyMode::IdAndDb => (id.to_string(), db.map(str::to_string)),
        }
    }

    /// Get the reference keyed by `(class, name, xref)`, creating it on first use.
    pub fn get_or_create_reference(
        &mut self,
        class: ReferenceClass,
        name: Option<&str>,
        xref: Option<XrefId>,
    ) -> ReferenceId {
        let key = (class, name.map(str::to_string), xref);
        if let Some(&existing) = self.reference_cache.get(&key) {
            tracing::debug!(class = %class, name = ?name, "reference cache hit");
            return existing;
        }
        let reference_id = self.insert_reference(class, name, xref);
        self.reference_cache.insert(key, reference_id);
        reference_id
    }

    /// Get the feature with `term` minted by `reference`, minting it on first use.
    pub fn get_or_create_feature(&mut self, reference: ReferenceId, term: &str) -> FeatureId {
        let existing = self.references[reference.index()]
            .features
            .iter()
            .copied()
            .find(|&f| self.features[f.index()].term == term);
        match existing {
            Some(feature) => feature,
            None => self.insert_feature(term, Some(reference)),
        }
    }

    /// Attach the publication xref of the whole graph. A second call with the
    /// same id keeps the existing node.
    pub fn set_publication(&mut self, id: &str, db: Option<&str>) -> XrefId {
        if let Some(existing) = self.publication {
            if self.xrefs[existing.index()].id == id {
                return existing;
            }
        }
        let xref_id = self.insert_xref(Xref {
            kind: XrefKind::Publication,
            id: id.to_string(),
            db: db.map(str::to_string),
        });
        self.publication = Some(xref_id);
        xref_id
    }

    /// Mark an existing publication xref node as the graph's publication.
    pub fn set_publication_xref(&mut self, xref: XrefId) {
        self.publication = Some(xref);
    }

    // ------------------------------------------------------------------------
    // Node creation (no dedup)
    // ------------------------------------------------------------------------

    pub fn insert_xref(&mut self, xref: Xref) -> XrefId {
        let id = XrefId(next_id(self.xrefs.len()));
        tracing::debug!(kind = xref.kind.biopax_name(), id = %xref.id, "new xref");
        self.xrefs.push(xref);
        id
    }

    pub fn insert_reference(
        &mut self,
        class: ReferenceClass,
        name: Option<&str>,
        xref: Option<XrefId>,
    ) -> ReferenceId {
        let id = ReferenceId(next_id(self.references.len()));
        tracing::debug!(class = %class, name = ?name, "new entity reference");
        self.references.push(EntityReference {
            class,
            name: name.map(str::to_string),
            xref,
            features: Vec::new(),
            instances: Vec::new(),
        });
        id
    }

    /// Mint a feature. With an owner it is registered on that reference.
    pub fn insert_feature(&mut self, term: &str, owner: Option<ReferenceId>) -> FeatureId {
        let id = FeatureId(next_id(self.features.len()));
        self.features.push(Feature {
            term: term.to_string(),
            owner,
        });
        if let Some(reference) = owner {
            self.references[reference.index()].features.push(id);
        }
        id
    }

    /// Create a physical entity. It is registered as an instance of its
    /// reference, or pooled under `(class, name)` when it has none.
    pub fn insert_entity(
        &mut self,
        class: EntityClass,
        name: Option<&str>,
        reference: Option<ReferenceId>,
        in_complex: bool,
    ) -> EntityId {
        let id = EntityId(next_id(self.entities.len()));
        tracing::debug!(class = %class, name = ?name, in_complex, "new physical entity");
        self.entities.push(PhysicalEntity {
            class,
            name: name.map(str::to_string),
            reference,
            features: BTreeSet::new(),
            not_features: BTreeSet::new(),
            in_complex,
            components: Vec::new(),
        });
        match reference {
            Some(reference) => self.references[reference.index()].instances.push(id),
            None => self
                .no_ref_pool
                .entry((class, name.map(str::to_string)))
                .or_default()
                .push(id),
        }
        id
    }

    pub fn insert_interaction(&mut self, class: InteractionClass) -> InteractionId {
        let id = InteractionId(next_id(self.interactions.len()));
        tracing::debug!(class = %class, "new interaction");
        self.interactions.push(Interaction::new(class));
        id
    }

    /// Create a conversion with optional left/right members; direction is
    /// left-to-right.
    pub fn add_conversion(
        &mut self,
        class: InteractionClass,
        left: Option<EntityId>,
        right: Option<EntityId>,
    ) -> InteractionId {
        debug_assert!(class.is_conversion());
        let id = self.insert_interaction(class);
        let conversion = &mut self.interactions[id.index()];
        conversion.direction = Some(ConversionDirection::LeftToRight);
        conversion.left.extend(left);
        conversion.right.extend(right);
        id
    }

    /// Create a control edge. Missing controller/controlled stay empty.
    pub fn add_control(
        &mut self,
        class: InteractionClass,
        controller: Option<EntityId>,
        controlled: Option<InteractionId>,
        control_type: Option<ControlType>,
    ) -> InteractionId {
        debug_assert!(class.is_control());
        let id = self.insert_interaction(class);
        let control = &mut self.interactions[id.index()];
        control.controller = controller;
        control.controlled = controlled;
        control.control_type = control_type;
        id
    }

    // ------------------------------------------------------------------------
    // Mutators on existing nodes (append-only)
    // ------------------------------------------------------------------------

    pub fn add_feature(&mut self, entity: EntityId, feature: FeatureId) {
        self.entities[entity.index()].features.insert(feature);
    }

    pub fn add_not_feature(&mut self, entity: EntityId, feature: FeatureId) {
        self.entities[entity.index()].not_features.insert(feature);
    }

    pub fn add_component(&mut self, complex: EntityId, component: EntityId) {
        push_unique(&mut self.entities[complex.index()].components, component);
    }

    pub fn set_in_complex(&mut self, entity: EntityId, in_complex: bool) {
        self.entities[entity.index()].in_complex = in_complex;
    }

    pub fn add_to_side(&mut self, conversion: InteractionId, side: Side, entity: EntityId) {
        let conversion = &mut self.interactions[conversion.index()];
        match side {
            Side::Left => push_unique(&mut conversion.left, entity),
            Side::Right => push_unique(&mut conversion.right, entity),
        }
    }

    pub fn set_direction(&mut self, conversion: InteractionId, direction: ConversionDirection) {
        self.interactions[conversion.index()].direction = Some(direction);
    }

    pub fn add_participant(&mut self, interaction: InteractionId, entity: EntityId) {
        push_unique(&mut self.interactions[interaction.index()].participants, entity);
    }

    pub fn add_product(&mut self, reaction: InteractionId, entity: EntityId) {
        push_unique(&mut self.interactions[reaction.index()].products, entity);
    }

    pub fn set_controller(&mut self, control: InteractionId, controller: EntityId) {
        self.interactions[control.index()].controller = Some(controller);
    }

    pub fn set_controlled(&mut self, control: InteractionId, controlled: InteractionId) {
        self.interactions[control.index()].controlled = Some(controlled);
    }

    pub fn set_control_type(&mut self, control: InteractionId, control_type: ControlType) {
        self.interactions[control.index()].control_type = Some(control_type);
    }

    pub fn add_evidence(&mut self, interaction: InteractionId, evidence: Evidence) {
        self.interactions[interaction.index()].evidence.push(evidence);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn xref(&self, id: XrefId) -> &Xref {
        &self.xrefs[id.index()]
    }

    pub fn reference(&self, id: ReferenceId) -> &EntityReference {
        &self.references[id.index()]
    }

    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.index()]
    }

    pub fn entity(&self, id: EntityId) -> &PhysicalEntity {
        &self.entities[id.index()]
    }

    pub fn interaction(&self, id: InteractionId) -> &Interaction {
        &self.interactions[id.index()]
    }

    pub fn publication(&self) -> Option<XrefId> {
        self.publication
    }

    // Checked variants for ids that did not come from this graph (for example
    // deserialized ones).

    pub fn try_xref(&self, id: XrefId) -> Result<&Xref, GraphError> {
        checked(&self.xrefs, "Xref", id.0)
    }

    pub fn try_reference(&self, id: ReferenceId) -> Result<&EntityReference, GraphError> {
        checked(&self.references, "EntityReference", id.0)
    }

    pub fn try_feature(&self, id: FeatureId) -> Result<&Feature, GraphError> {
        checked(&self.features, "Feature", id.0)
    }

    pub fn try_entity(&self, id: EntityId) -> Result<&PhysicalEntity, GraphError> {
        checked(&self.entities, "PhysicalEntity", id.0)
    }

    pub fn try_interaction(&self, id: InteractionId) -> Result<&Interaction, GraphError> {
        checked(&self.interactions, "Interaction", id.0)
    }

    pub fn xrefs(&self) -> impl Iterator<Item = (XrefId, &Xref)> + '_ {
        self.xrefs.iter().enumerate().map(|(i, x)| (XrefId(i as u32), x))
    }

    pub fn references(&self) -> impl Iterator<Item = (ReferenceId, &EntityReference)> + '_ {
        self.references
            .iter()
            .enumerate()
            .map(|(i, r)| (ReferenceId(i as u32), r))
    }

    pub fn features(&self) -> impl Iterator<Item = (FeatureId, &Feature)> + '_ {
        self.features
            .iter()
            .enumerate()
            .map(|(i, f)| (FeatureId(i as u32), f))
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &PhysicalEntity)> + '_ {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    pub fn interactions(&self) -> impl Iterator<Item = (InteractionId, &Interaction)> + '_ {
        self.interactions
            .iter()
            .enumerate()
            .map(|(i, x)| (InteractionId(i as u32), x))
    }

    /// Pooled reference-less entities for `(class, name)`.
    pub fn no_ref_candidates(&self, class: EntityClass, name: Option<&str>) -> &[EntityId] {
        self.no_ref_pool
            .get(&(class, name.map(str::to_string)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Terms of a feature set.
    pub fn feature_terms<'a>(
        &'a self,
        features: impl IntoIterator<Item = &'a FeatureId>,
    ) -> BTreeSet<&'a str> {
        features
            .into_iter()
            .map(|&f| self.features[f.index()].term.as_str())
            .collect()
    }

    /// The xref of an entity's reference, if it has one.
    pub fn entity_xref(&self, entity: EntityId) -> Option<&Xref> {
        let reference = self.entity(entity).reference?;
        let xref = self.reference(reference).xref?;
        Some(self.xref(xref))
    }

    /// BioPAX participants in property order.
    pub fn participants(&self, interaction: InteractionId) -> Vec<Participant> {
        let x = self.interaction(interaction);
        let mut out: Vec<Participant> = Vec::new();
        let entities = x
            .left
            .iter()
            .chain(&x.right)
            .chain(&x.participants)
            .chain(&x.products)
            .chain(x.controller.as_ref());
        for &e in entities {
            push_unique(&mut out, Participant::Entity(e));
        }
        if let Some(controlled) = x.controlled {
            push_unique(&mut out, Participant::Interaction(controlled));
        }
        out
    }

    /// Controls whose `controlled` is `interaction`.
    pub fn controllers_of(&self, interaction: InteractionId) -> Vec<InteractionId> {
        self.interactions()
            .filter(|(_, x)| x.controlled == Some(interaction))
            .map(|(id, _)| id)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.xrefs.len()
            + self.references.len()
            + self.features.len()
            + self.entities.len()
            + self.interactions.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut by_class: BTreeMap<String, usize> = BTreeMap::new();
        for x in &self.xrefs {
            *by_class.entry(x.kind.biopax_name().to_string()).or_default() += 1;
        }
        for r in &self.references {
            *by_class.entry(r.class.biopax_name().to_string()).or_default() += 1;
        }
        if !self.features.is_empty() {
            by_class.insert("ModificationFeature".to_string(), self.features.len());
        }
        for e in &self.entities {
            *by_class.entry(e.class.biopax_name().to_string()).or_default() += 1;
        }
        for x in &self.interactions {
            *by_class.entry(x.class.biopax_name().to_string()).or_default() += 1;
        }
        GraphStats {
            xrefs: self.xrefs.len(),
            references: self.references.len(),
            features: self.features.len(),
            entities: self.entities.len(),
            interactions: self.interactions.len(),
            by_class,
        }
    }

    /// Number of nodes of one entity class.
    pub fn count_entities(&self, class: EntityClass) -> usize {
        self.entities.iter().filter(|e| e.class == class).count()
    }

    /// Number of nodes of one interaction class.
    pub fn count_interactions(&self, class: InteractionClass) -> usize {
        self.interactions.iter().filter(|x| x.class == class).count()
    }
}

fn checked<'a, T>(arena: &'a [T], kind: &'static str, raw: u32) -> Result<&'a T, GraphError> {
    arena
        .get(raw as usize)
        .ok_or(GraphError::DanglingId { kind, raw })
}

/// Node counts, for tooling and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub xrefs: usize,
    pub references: usize,
    pub features: usize,
    pub entities: usize,
    pub interactions: usize,
    pub by_class: BTreeMap<String, usize>,
}

impl GraphStats {
    pub fn total(&self) -> usize {
        self.xrefs + self.references + self.features + self.entities + self.interactions
    }
}

/// Errors raised by checked lookups and graph serialization.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("no {kind} node with id {raw}")]
    DanglingId { kind: &'static str, raw: u32 },
    #[error("XML write error: {0}")]
    Xml(String),
    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
