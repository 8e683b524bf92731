//! Resolved interfaces.

use serde::Serialize;

use super::cardinality::Cardinality;
use super::types::DataType;
use crate::metamodel::qualify;

/// Attribute required by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceAttribute {
    /// Attribute name.
    pub name: String,
    /// Required type.
    pub data_type: DataType,
    /// Interface that declared it.
    pub declared_by: String,
}

/// As-of attribute required by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceAsOfAttribute {
    /// Attribute name.
    pub name: String,
    /// Processing time rather than business time.
    pub is_processing_date: bool,
}

/// Relationship required by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceRelationship {
    /// Relationship name.
    pub name: String,
    /// Fully-qualified name of the related object or interface.
    pub related: String,
    /// Cardinality.
    pub cardinality: Cardinality,
}

/// An interface with its super-interfaces flattened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceType {
    /// Package.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Every super-interface, transitively, nearest first.
    pub super_interfaces: Vec<String>,
    /// Own and inherited attributes.
    pub attributes: Vec<InterfaceAttribute>,
    /// Own and inherited as-of attributes.
    pub as_of_attributes: Vec<InterfaceAsOfAttribute>,
    /// Own and inherited relationships.
    pub relationships: Vec<InterfaceRelationship>,
}

impl InterfaceType {
    /// Fully-qualified name.
    pub fn fully_qualified_name(&self) -> String {
        qualify(&self.package, &self.class_name)
    }

    /// Check if this interface is, or extends, the named interface.
    pub fn is_a(&self, name: &str) -> bool {
        self.fully_qualified_name() == name || self.super_interfaces.iter().any(|s| s == name)
    }
}
