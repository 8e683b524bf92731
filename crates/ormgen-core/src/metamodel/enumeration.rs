//! Enumeration declarations.

use serde::{Deserialize, Serialize};

use crate::model::types::DataType;

/// A declared enumeration and its persisted representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationDecl {
    /// Package the generated enumeration lives in.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Type of the persisted value (`int` or `String`).
    pub persisted_type: DataType,
    /// Members, in declaration order.
    #[serde(default)]
    pub members: Vec<EnumerationMemberDecl>,
}

/// One enumeration member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationMemberDecl {
    /// Member name.
    pub name: String,
    /// Value written to the database.
    pub persisted_value: String,
}

impl EnumerationDecl {
    /// Create a new enumeration declaration.
    pub fn new(
        package: impl Into<String>,
        class_name: impl Into<String>,
        persisted_type: DataType,
    ) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
            persisted_type,
            members: Vec::new(),
        }
    }

    /// Fully-qualified class name.
    pub fn fully_qualified_name(&self) -> String {
        super::qualify(&self.package, &self.class_name)
    }

    /// Add a member.
    pub fn with_member(
        mut self,
        name: impl Into<String>,
        persisted_value: impl Into<String>,
    ) -> Self {
        self.members.push(EnumerationMemberDecl {
            name: name.into(),
            persisted_value: persisted_value.into(),
        });
        self
    }
}
