//! Object type wrappers.

use serde::Serialize;

use super::attribute::EnumerationMapping;
use super::graph::{AttributeId, ObjectId, RelationshipId};
use super::types::{DataType, TimezoneConversion};
use crate::metamodel::{qualify, ObjectTypeDecl};

/// Kind of object type held in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    /// Persistent object.
    Plain,
    /// Value object stored in its owner's columns.
    EmbeddedValue,
    /// Enumeration.
    Enumeration,
}

/// Per-object defaults that attributes fall back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ObjectDefaults {
    /// Getters are final unless an attribute says otherwise.
    pub final_getters: bool,
    /// Timezone policy for as-of attributes that leave it unset.
    pub timezone_conversion: TimezoneConversion,
}

/// Progress of an object through inheritance resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResolutionState {
    /// Not visited yet.
    #[default]
    Unresolved,
    /// On the current superclass walk.
    InProgress,
    /// Merged with its superclass chain.
    Resolved,
    /// Could not be resolved; skipped by later passes.
    Failed,
}

/// A nested embedded value object reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedObject {
    /// Name of the nested value.
    pub name: String,
    /// Type name as declared.
    pub type_name: String,
    /// Resolved embedded value object.
    pub target: Option<ObjectId>,
}

/// The resolved representation of one declared object, embedded value object
/// or enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectType {
    id: ObjectId,
    /// Package.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Kind of object type.
    pub kind: ObjectKind,
    /// Transactional or read-only.
    pub object_type: ObjectTypeDecl,
    /// Declared in another module.
    pub imported: bool,
    /// Superclass name as declared.
    pub super_class_name: Option<String>,
    /// Resolved superclass.
    pub super_class: Option<ObjectId>,
    defaults: ObjectDefaults,
    /// Attributes: declared first, then mapped, then inherited.
    pub attributes: Vec<AttributeId>,
    /// Relationships: declared, inherited, then synthesized reverses.
    pub relationships: Vec<RelationshipId>,
    /// Sharding key, if any.
    pub source_attribute: Option<AttributeId>,
    /// Implemented interfaces as declared.
    pub interfaces: Vec<String>,
    /// Nested embedded value objects (embedded value objects only).
    pub nested_objects: Vec<NestedObject>,
    /// Persisted type (enumerations only).
    pub persisted_type: Option<DataType>,
    /// Members (enumerations only).
    pub members: Vec<EnumerationMapping>,
    pub(crate) state: ResolutionState,
}

impl ObjectType {
    /// Create an empty object type.
    pub fn new(
        id: ObjectId,
        package: impl Into<String>,
        class_name: impl Into<String>,
        kind: ObjectKind,
        defaults: ObjectDefaults,
    ) -> Self {
        Self {
            id,
            package: package.into(),
            class_name: class_name.into(),
            kind,
            object_type: ObjectTypeDecl::Transactional,
            imported: false,
            super_class_name: None,
            super_class: None,
            defaults,
            attributes: Vec::new(),
            relationships: Vec::new(),
            source_attribute: None,
            interfaces: Vec::new(),
            nested_objects: Vec::new(),
            persisted_type: None,
            members: Vec::new(),
            state: ResolutionState::Unresolved,
        }
    }

    /// Arena index of this object.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Defaults its attributes fall back on.
    pub fn defaults(&self) -> ObjectDefaults {
        self.defaults
    }

    /// Fully-qualified class name.
    pub fn fully_qualified_name(&self) -> String {
        qualify(&self.package, &self.class_name)
    }

    /// Name of the generated finder class.
    pub fn finder_class_name(&self) -> String {
        format!("{}Finder", self.class_name)
    }

    /// Whether default getters are final.
    pub fn is_default_final_getters(&self) -> bool {
        self.defaults.final_getters
    }

    /// Check if the object has a superclass.
    pub fn has_super_class(&self) -> bool {
        self.super_class_name.is_some()
    }

    /// Check if the object is read-only.
    pub fn is_read_only(&self) -> bool {
        self.object_type == ObjectTypeDecl::ReadOnly
    }

    /// Resolution state.
    pub fn state(&self) -> ResolutionState {
        self.state
    }
}
