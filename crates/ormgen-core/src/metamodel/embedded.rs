//! Embedded value declarations.

use serde::{Deserialize, Serialize};

use crate::model::types::DataType;

/// A value object whose attributes are stored in the columns of its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedValueObjectDecl {
    /// Package the generated class lives in.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Leaf attributes.
    #[serde(default)]
    pub attributes: Vec<EmbeddedAttributeDecl>,
    /// Nested embedded value objects.
    #[serde(default)]
    pub nested: Vec<NestedObjectDecl>,
}

impl EmbeddedValueObjectDecl {
    /// Create a new embedded value object declaration.
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
            attributes: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Fully-qualified class name.
    pub fn fully_qualified_name(&self) -> String {
        super::qualify(&self.package, &self.class_name)
    }

    /// Add a leaf attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(EmbeddedAttributeDecl {
            name: name.into(),
            data_type,
            nullable: None,
            max_length: None,
        });
        self
    }

    /// Add a nested embedded value object.
    pub fn with_nested(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.nested.push(NestedObjectDecl {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }
}

/// Leaf attribute of an embedded value object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Nullability; defaults to nullable.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Maximum string length.
    #[serde(default)]
    pub max_length: Option<u32>,
}

/// Reference from an embedded value object to a nested one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedObjectDecl {
    /// Name of the nested value.
    pub name: String,
    /// Embedded value object type (simple or fully-qualified name).
    pub type_name: String,
}

/// Use of an embedded value object inside a persistent object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedValueDecl {
    /// Name of the embedded value on the owner.
    pub name: String,
    /// Embedded value object type; only set on the root value, nested values
    /// take their type from the enclosing embedded value object.
    #[serde(default)]
    pub type_name: Option<String>,
    /// Column mappings for the leaf attributes.
    #[serde(default)]
    pub mappings: Vec<EmbeddedMappingDecl>,
    /// Nested values.
    #[serde(default)]
    pub nested: Vec<EmbeddedValueDecl>,
}

impl EmbeddedValueDecl {
    /// Create a root embedded value of the given type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            mappings: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Create a nested embedded value.
    pub fn nested(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            mappings: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Map a leaf attribute onto a column.
    pub fn with_mapping(mut self, attribute: impl Into<String>, column: impl Into<String>) -> Self {
        self.mappings.push(EmbeddedMappingDecl {
            attribute: attribute.into(),
            column_name: column.into(),
            underlying_attribute: None,
        });
        self
    }

    /// Add a nested value.
    pub fn with_nested(mut self, nested: EmbeddedValueDecl) -> Self {
        self.nested.push(nested);
        self
    }
}

/// Maps one leaf attribute onto a column of the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedMappingDecl {
    /// Leaf attribute of the embedded value object.
    pub attribute: String,
    /// Column on the owner.
    pub column_name: String,
    /// Explicit name of the generated attribute on the owner.
    #[serde(default)]
    pub underlying_attribute: Option<String>,
}
