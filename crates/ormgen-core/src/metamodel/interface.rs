//! Interface declarations.

use serde::{Deserialize, Serialize};

use crate::model::types::DataType;

/// A declared interface that objects can implement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    /// Package the generated interface lives in.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Extended interfaces (simple or fully-qualified names).
    #[serde(default)]
    pub super_interfaces: Vec<String>,
    /// Required attributes.
    #[serde(default)]
    pub attributes: Vec<InterfaceAttributeDecl>,
    /// Required as-of attributes.
    #[serde(default)]
    pub as_of_attributes: Vec<InterfaceAsOfAttributeDecl>,
    /// Required relationships.
    #[serde(default)]
    pub relationships: Vec<InterfaceRelationshipDecl>,
}

/// Attribute an implementing object must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Required type.
    pub data_type: DataType,
}

/// As-of attribute an implementing object must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAsOfAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Processing (transaction) time rather than business time.
    #[serde(default)]
    pub is_processing_date: bool,
}

/// Relationship an implementing object must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRelationshipDecl {
    /// Relationship name.
    pub name: String,
    /// Related object or interface (simple or fully-qualified name).
    pub related_object: String,
    /// Cardinality key.
    pub cardinality: String,
}

impl InterfaceDecl {
    /// Create a new interface declaration.
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
            super_interfaces: Vec::new(),
            attributes: Vec::new(),
            as_of_attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Fully-qualified class name.
    pub fn fully_qualified_name(&self) -> String {
        super::qualify(&self.package, &self.class_name)
    }

    /// Extend another interface.
    pub fn with_super_interface(mut self, name: impl Into<String>) -> Self {
        self.super_interfaces.push(name.into());
        self
    }

    /// Require an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(InterfaceAttributeDecl {
            name: name.into(),
            data_type,
        });
        self
    }

    /// Require an as-of attribute.
    pub fn with_as_of_attribute(
        mut self,
        name: impl Into<String>,
        is_processing_date: bool,
    ) -> Self {
        self.as_of_attributes.push(InterfaceAsOfAttributeDecl {
            name: name.into(),
            is_processing_date,
        });
        self
    }

    /// Require a relationship.
    pub fn with_relationship(
        mut self,
        name: impl Into<String>,
        related_object: impl Into<String>,
        cardinality: impl Into<String>,
    ) -> Self {
        self.relationships.push(InterfaceRelationshipDecl {
            name: name.into(),
            related_object: related_object.into(),
            cardinality: cardinality.into(),
        });
        self
    }
}
