//! Parsed metamodel declarations.
//!
//! These types are what the external parser hands to the resolver: plain,
//! loosely-validated declarations keyed by fully-qualified class name. They
//! are `serde` types so a metamodel can also be loaded from JSON.

mod embedded;
mod enumeration;
mod interface;
mod object;

pub use embedded::{
    EmbeddedAttributeDecl, EmbeddedMappingDecl, EmbeddedValueDecl, EmbeddedValueObjectDecl,
    NestedObjectDecl,
};
pub use enumeration::{EnumerationDecl, EnumerationMemberDecl};
pub use interface::{
    InterfaceAsOfAttributeDecl, InterfaceAttributeDecl, InterfaceDecl, InterfaceRelationshipDecl,
};
pub use object::{
    AsOfAttributeDecl, AttributeDecl, EnumerationAttributeDecl, ObjectDecl, ObjectTypeDecl,
    PrimaryKeyGeneratorStrategy, RelationshipDecl, SimulatedSequenceDecl, SourceAttributeDecl,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Join a package and a simple class name.
pub(crate) fn qualify(package: &str, class_name: &str) -> String {
    if package.is_empty() {
        class_name.to_string()
    } else {
        format!("{}.{}", package, class_name)
    }
}

/// Everything the parser produced for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metamodel {
    /// Persistent objects by fully-qualified name.
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectDecl>,
    /// Embedded value objects by fully-qualified name.
    #[serde(default)]
    pub embedded_value_objects: BTreeMap<String, EmbeddedValueObjectDecl>,
    /// Enumerations by fully-qualified name.
    #[serde(default)]
    pub enumerations: BTreeMap<String, EnumerationDecl>,
    /// Interfaces by fully-qualified name.
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceDecl>,
}

impl Metamodel {
    /// Create an empty metamodel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object declaration.
    pub fn with_object(mut self, object: ObjectDecl) -> Self {
        self.objects.insert(object.fully_qualified_name(), object);
        self
    }

    /// Add an embedded value object declaration.
    pub fn with_embedded_value_object(mut self, object: EmbeddedValueObjectDecl) -> Self {
        self.embedded_value_objects
            .insert(object.fully_qualified_name(), object);
        self
    }

    /// Add an enumeration declaration.
    pub fn with_enumeration(mut self, enumeration: EnumerationDecl) -> Self {
        self.enumerations
            .insert(enumeration.fully_qualified_name(), enumeration);
        self
    }

    /// Add an interface declaration.
    pub fn with_interface(mut self, interface: InterfaceDecl) -> Self {
        self.interfaces
            .insert(interface.fully_qualified_name(), interface);
        self
    }

    /// Parse a metamodel from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the metamodel to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total number of declarations of every kind.
    pub fn len(&self) -> usize {
        self.objects.len()
            + self.embedded_value_objects.len()
            + self.enumerations.len()
            + self.interfaces.len()
    }

    /// Check if the metamodel declares nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
