//! Arena storage for the object graph.
//!
//! Every object, attribute and relationship lives in one [`MetamodelGraph`]
//! and refers to the others by typed index. Resolution mutates the arena;
//! [`ResolvedGraph`] is the frozen result handed to emission.

use serde::Serialize;
use std::collections::BTreeMap;

use super::attribute::Attribute;
use super::interface::InterfaceType;
use super::object::{ObjectKind, ObjectType};
use super::relationship::Relationship;
use crate::error::{Error, Result};

/// Index of an object type in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(pub(crate) usize);

/// Index of an attribute in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttributeId(pub(crate) usize);

/// Index of a relationship in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RelationshipId(pub(crate) usize);

impl ObjectId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl AttributeId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl RelationshipId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Mutable arena used while resolving.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetamodelGraph {
    objects: Vec<ObjectType>,
    attributes: Vec<Attribute>,
    relationships: Vec<Relationship>,
    interfaces: BTreeMap<String, InterfaceType>,
    #[serde(skip)]
    by_name: BTreeMap<String, ObjectId>,
}

impl MetamodelGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object type built for the next free index.
    ///
    /// Returns `None` when an object with the same fully-qualified name exists.
    pub fn add_object(&mut self, build: impl FnOnce(ObjectId) -> ObjectType) -> Option<ObjectId> {
        let id = ObjectId(self.objects.len());
        let object = build(id);
        let name = object.fully_qualified_name();
        if self.by_name.contains_key(&name) {
            return None;
        }
        self.by_name.insert(name, id);
        self.objects.push(object);
        Some(id)
    }

    /// Append an attribute to its owner's attribute list.
    pub fn add_attribute(&mut self, attribute: Attribute) -> AttributeId {
        let id = AttributeId(self.attributes.len());
        let owner = attribute.owner();
        self.attributes.push(attribute);
        self.objects[owner.0].attributes.push(id);
        id
    }

    /// Append a relationship to its owner's relationship list.
    pub fn add_relationship(&mut self, relationship: Relationship) -> RelationshipId {
        let id = RelationshipId(self.relationships.len());
        let owner = relationship.owner;
        self.relationships.push(relationship);
        self.objects[owner.0].relationships.push(id);
        id
    }

    /// Register a resolved interface.
    pub fn add_interface(&mut self, interface: InterfaceType) {
        self.interfaces
            .insert(interface.fully_qualified_name(), interface);
    }

    /// Number of object types.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Object ids in arena order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(ObjectId)
    }

    /// Object ids of one kind, in arena order.
    pub fn object_ids_of_kind(&self, kind: ObjectKind) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.id())
            .collect()
    }

    /// Get an object.
    pub fn object(&self, id: ObjectId) -> &ObjectType {
        &self.objects[id.0]
    }

    /// Get an object mutably.
    pub fn object_mut(&mut self, id: ObjectId) -> &mut ObjectType {
        &mut self.objects[id.0]
    }

    /// Get an attribute.
    pub fn attribute(&self, id: AttributeId) -> &Attribute {
        &self.attributes[id.0]
    }

    /// Get an attribute mutably.
    pub fn attribute_mut(&mut self, id: AttributeId) -> &mut Attribute {
        &mut self.attributes[id.0]
    }

    /// Get a relationship.
    pub fn relationship(&self, id: RelationshipId) -> &Relationship {
        &self.relationships[id.0]
    }

    /// Get a relationship mutably.
    pub fn relationship_mut(&mut self, id: RelationshipId) -> &mut Relationship {
        &mut self.relationships[id.0]
    }

    /// Get a resolved interface by fully-qualified name.
    pub fn interface(&self, name: &str) -> Option<&InterfaceType> {
        self.interfaces.get(name)
    }

    /// All resolved interfaces.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceType> {
        self.interfaces.values()
    }

    /// Find an object of the given kind by fully-qualified name, or by simple
    /// name when exactly one object of that kind carries it.
    pub fn lookup(&self, name: &str, kind: ObjectKind) -> Option<ObjectId> {
        if let Some(id) = self.by_name.get(name) {
            return (self.objects[id.0].kind == kind).then_some(*id);
        }
        let mut candidates = self
            .objects
            .iter()
            .filter(|o| o.kind == kind && o.class_name == name);
        match (candidates.next(), candidates.next()) {
            (Some(object), None) => Some(object.id()),
            _ => None,
        }
    }

    /// Find an attribute of an object by name.
    pub fn attribute_by_name(&self, object: ObjectId, name: &str) -> Option<AttributeId> {
        self.objects[object.0]
            .attributes
            .iter()
            .copied()
            .find(|id| self.attributes[id.0].name() == name)
    }

    /// Find a relationship of an object by name.
    pub fn relationship_by_name(&self, object: ObjectId, name: &str) -> Option<RelationshipId> {
        self.objects[object.0]
            .relationships
            .iter()
            .copied()
            .find(|id| self.relationships[id.0].name == name)
    }

    /// Walk the superclass chain to the top-most ancestor.
    pub fn hierarchy_root(&self, object: ObjectId) -> ObjectId {
        let mut current = object;
        let mut steps = 0;
        while let Some(parent) = self.objects[current.0].super_class {
            current = parent;
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
        }
        current
    }

    /// Number of ancestors above an object.
    pub fn depth(&self, object: ObjectId) -> usize {
        let mut depth = 0;
        let mut current = object;
        while let Some(parent) = self.objects[current.0].super_class {
            current = parent;
            depth += 1;
            if depth > self.objects.len() {
                break;
            }
        }
        depth
    }
}

/// The immutable, fully-resolved object graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedGraph {
    graph: MetamodelGraph,
}

impl ResolvedGraph {
    pub(crate) fn freeze(graph: MetamodelGraph) -> Self {
        Self { graph }
    }

    /// All object types, in arena order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.graph.objects.iter()
    }

    /// Persistent objects only.
    pub fn plain_objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.objects().filter(|o| o.kind == ObjectKind::Plain)
    }

    /// Get an object type.
    pub fn object(&self, id: ObjectId) -> &ObjectType {
        self.graph.object(id)
    }

    /// Find a persistent object by fully-qualified or unambiguous simple name.
    pub fn object_by_name(&self, name: &str) -> Result<&ObjectType> {
        self.graph
            .lookup(name, ObjectKind::Plain)
            .map(|id| self.graph.object(id))
            .ok_or_else(|| Error::UnknownObject(name.to_string()))
    }

    /// Resolved attributes of an object, in order.
    pub fn attributes_of(&self, id: ObjectId) -> impl Iterator<Item = &Attribute> {
        self.graph
            .object(id)
            .attributes
            .iter()
            .map(move |a| self.graph.attribute(*a))
    }

    /// Relationships of an object, in order.
    pub fn relationships_of(&self, id: ObjectId) -> impl Iterator<Item = &Relationship> {
        self.graph
            .object(id)
            .relationships
            .iter()
            .map(move |r| self.graph.relationship(*r))
    }

    /// Superclass of an object.
    pub fn super_class_of(&self, id: ObjectId) -> Option<&ObjectType> {
        self.graph
            .object(id)
            .super_class
            .map(|parent| self.graph.object(parent))
    }

    /// Source attribute of an object.
    pub fn source_attribute_of(&self, id: ObjectId) -> Option<&Attribute> {
        self.graph
            .object(id)
            .source_attribute
            .map(|a| self.graph.attribute(a))
    }

    /// Get an attribute.
    pub fn attribute(&self, id: AttributeId) -> &Attribute {
        self.graph.attribute(id)
    }

    /// Get a relationship.
    pub fn relationship(&self, id: RelationshipId) -> &Relationship {
        self.graph.relationship(id)
    }

    /// Get a resolved interface.
    pub fn interface(&self, name: &str) -> Option<&InterfaceType> {
        self.graph.interface(name)
    }

    /// Top-most ancestor of an object.
    pub fn hierarchy_root(&self, id: ObjectId) -> ObjectId {
        self.graph.hierarchy_root(id)
    }

    /// Number of ancestors above an object.
    pub fn depth(&self, id: ObjectId) -> usize {
        self.graph.depth(id)
    }

    /// Number of object types.
    pub fn object_count(&self) -> usize {
        self.graph.objects.len()
    }

    /// Number of attributes across all objects.
    pub fn attribute_count(&self) -> usize {
        self.graph.attributes.len()
    }

    /// Number of relationships across all objects.
    pub fn relationship_count(&self) -> usize {
        self.graph.relationships.len()
    }

    /// Stable content hash of the resolved graph (hex-encoded blake3).
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.graph)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}
