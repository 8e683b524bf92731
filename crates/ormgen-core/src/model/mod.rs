//! Resolved object model.
//!
//! Object types, their attributes and relationships, held in one arena and
//! cross-referenced by index.

pub mod attribute;
pub mod cardinality;
pub mod graph;
pub mod interface;
pub mod object;
pub mod relationship;
pub mod types;

pub use attribute::{
    AsOfSettings, Attribute, AttributeKind, Capability, ColumnSettings, EnumerationMapping,
    EnumerationSettings, MappedSettings, ReverseRelationship,
};
pub use cardinality::Cardinality;
pub use graph::{AttributeId, MetamodelGraph, ObjectId, RelationshipId, ResolvedGraph};
pub use interface::{
    InterfaceAsOfAttribute, InterfaceAttribute, InterfaceRelationship, InterfaceType,
};
pub use object::{NestedObject, ObjectDefaults, ObjectKind, ObjectType, ResolutionState};
pub use relationship::{JoinPair, JoinQuery, Relationship};
pub use types::{DataType, TimezoneConversion};
