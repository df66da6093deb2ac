//! Entity descriptors: the input-side description of a molecule.

use crate::error::{ConvertError, Result};
use factoid_graph::{EntityClass, ReferenceClass};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// An external cross-reference, `{id, db}`. Numeric ids are accepted and
/// kept as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct XrefDescriptor {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub db: Option<String>,
}

impl XrefDescriptor {
    pub fn new(id: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            db: Some(db.into()),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

/// `{type, name?, xref?, components?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xref: Option<XrefDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<EntityDescriptor>>,
}

/// One component's contribution to a complex identity: name, xref id, xref db.
pub type ComponentSummary = (Option<String>, Option<String>, Option<String>);

impl EntityDescriptor {
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            name: Some(name.into()),
            xref: None,
            components: None,
        }
    }

    pub fn protein(name: &str, uniprot: &str) -> Self {
        Self::new("protein", name).with_xref(XrefDescriptor::new(uniprot, "uniprot"))
    }

    pub fn chemical(name: &str, pubchem: &str) -> Self {
        Self::new("chemical", name).with_xref(XrefDescriptor::new(pubchem, "pubchem"))
    }

    pub fn complex(name: Option<&str>, components: Vec<EntityDescriptor>) -> Self {
        Self {
            type_tag: "complex".to_string(),
            name: name.map(str::to_string),
            xref: None,
            components: Some(components),
        }
    }

    pub fn with_xref(mut self, xref: XrefDescriptor) -> Self {
        self.xref = Some(xref);
        self
    }

    pub fn kind(&self) -> Result<EntityKind> {
        EntityKind::from_tag(&self.type_tag).ok_or_else(|| ConvertError::InvalidEntityType {
            type_tag: self.type_tag.clone(),
        })
    }

    pub fn components(&self) -> &[EntityDescriptor] {
        self.components.as_deref().unwrap_or(&[])
    }

    /// Check the whole descriptor tree before anything is built from it.
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind()?;
        if kind == EntityKind::Complex && self.xref.is_some() {
            return Err(ConvertError::InvariantViolation(format!(
                "complex {:?} carries an xref; complexes are identified by their components",
                self.name.as_deref().unwrap_or("<unnamed>")
            )));
        }
        self.components().iter().try_for_each(EntityDescriptor::validate)
    }
}

// ============================================================================
// Entity kinds
// ============================================================================

/// The entity type vocabulary accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Protein,
    Chemical,
    Dna,
    Rna,
    Complex,
    Entity,
}

impl EntityKind {
    /// Case-insensitive; `ggp` (gene or gene product) reads as protein.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "protein" | "ggp" => Some(EntityKind::Protein),
            "chemical" => Some(EntityKind::Chemical),
            "dna" => Some(EntityKind::Dna),
            "rna" => Some(EntityKind::Rna),
            "complex" => Some(EntityKind::Complex),
            "entity" => Some(EntityKind::Entity),
            _ => None,
        }
    }

    pub fn entity_class(self) -> EntityClass {
        match self {
            EntityKind::Protein => EntityClass::Protein,
            EntityKind::Chemical => EntityClass::SmallMolecule,
            EntityKind::Dna => EntityClass::DnaRegion,
            EntityKind::Rna => EntityClass::Rna,
            EntityKind::Complex => EntityClass::Complex,
            EntityKind::Entity => EntityClass::PhysicalEntity,
        }
    }

    pub fn reference_class(self) -> Option<ReferenceClass> {
        self.entity_class().reference_class()
    }

    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Protein => "protein",
            EntityKind::Chemical => "chemical",
            EntityKind::Dna => "dna",
            EntityKind::Rna => "rna",
            EntityKind::Complex => "complex",
            EntityKind::Entity => "entity",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping() {
        assert_eq!(EntityKind::from_tag("GGP"), Some(EntityKind::Protein));
        assert_eq!(EntityKind::from_tag("Chemical"), Some(EntityKind::Chemical));
        assert_eq!(EntityKind::from_tag("cell"), None);
        assert_eq!(
            EntityKind::Chemical.reference_class(),
            Some(ReferenceClass::SmallMoleculeReference)
        );
        assert_eq!(EntityKind::Entity.reference_class(), None);
        assert_eq!(EntityKind::Complex.reference_class(), None);
    }

    #[test]
    fn numeric_xref_ids_are_text() {
        let d: EntityDescriptor =
            serde_json::from_str(r#"{"type":"chemical","name":"x","xref":{"id":5994,"db":"pubchem"}}"#)
                .unwrap();
        assert_eq!(d.xref.unwrap().id, "5994");
    }

    #[test]
    fn validate_rejects_nested_invalid_type() {
        let d = EntityDescriptor::complex(
            Some("c"),
            vec![EntityDescriptor::new("protein", "a"), EntityDescriptor::new("cell", "b")],
        );
        assert!(matches!(
            d.validate(),
            Err(ConvertError::InvalidEntityType { type_tag }) if type_tag == "cell"
        ));
    }

    #[test]
    fn validate_rejects_complex_with_xref() {
        let d = EntityDescriptor::complex(Some("c"), vec![])
            .with_xref(XrefDescriptor::new("1", "x"));
        assert!(matches!(d.validate(), Err(ConvertError::InvariantViolation(_))));
    }
}
