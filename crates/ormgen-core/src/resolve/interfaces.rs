//! Interface resolution and conformance.

use std::collections::{BTreeMap, BTreeSet};

use super::report::{IssueKind, Phase, ValidationReporter};
use crate::metamodel::{InterfaceDecl, Metamodel};
use crate::model::{
    Cardinality, InterfaceAsOfAttribute, InterfaceAttribute, InterfaceRelationship,
    InterfaceType, MetamodelGraph, ObjectId, ObjectKind, ResolutionState,
};

/// Find an interface declaration by fully-qualified or unambiguous simple name.
pub(crate) fn find_interface<'a>(
    metamodel: &'a Metamodel,
    name: &str,
) -> Option<&'a InterfaceDecl> {
    if let Some(decl) = metamodel.interfaces.get(name) {
        return Some(decl);
    }
    let mut candidates = metamodel.interfaces.values().filter(|i| i.class_name == name);
    match (candidates.next(), candidates.next()) {
        (Some(decl), None) => Some(decl),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolve super-interfaces, flatten inherited members and register every
/// interface that resolved cleanly.
pub(crate) fn resolve_interfaces(
    metamodel: &Metamodel,
    graph: &mut MetamodelGraph,
    reporter: &mut ValidationReporter,
) {
    let mut marks: BTreeMap<String, Mark> = BTreeMap::new();
    let mut cyclic: BTreeSet<String> = BTreeSet::new();
    for name in metamodel.interfaces.keys() {
        detect_cycles(metamodel, name, &mut marks, &mut cyclic, reporter);
    }

    for (name, decl) in &metamodel.interfaces {
        let undefined_super = decl
            .super_interfaces
            .iter()
            .any(|s| find_interface(metamodel, s).is_none());
        if cyclic.contains(name) || undefined_super {
            continue;
        }
        let errors_before = reporter.error_count();
        let interface = flatten(metamodel, graph, decl, reporter);
        if reporter.error_count() == errors_before {
            tracing::debug!(
                interface = %name,
                supers = interface.super_interfaces.len(),
                "interface resolved"
            );
            graph.add_interface(interface);
        }
    }
}

fn detect_cycles(
    metamodel: &Metamodel,
    name: &str,
    marks: &mut BTreeMap<String, Mark>,
    cyclic: &mut BTreeSet<String>,
    reporter: &mut ValidationReporter,
) {
    if marks.contains_key(name) {
        return;
    }
    let Some(decl) = metamodel.interfaces.get(name) else {
        return;
    };
    marks.insert(name.to_string(), Mark::InProgress);
    for super_name in &decl.super_interfaces {
        let Some(parent) = find_interface(metamodel, super_name) else {
            reporter.error(
                Phase::Interfaces,
                IssueKind::Schema,
                name,
                None,
                format!("super interface '{}' is not defined", super_name),
            );
            continue;
        };
        let parent_name = parent.fully_qualified_name();
        match marks.get(&parent_name) {
            Some(Mark::InProgress) => {
                reporter.error(
                    Phase::Interfaces,
                    IssueKind::Consistency,
                    name,
                    None,
                    format!(
                        "Circular dependency between super interface {} and {}",
                        name, parent_name
                    ),
                );
                cyclic.insert(name.to_string());
                cyclic.insert(parent_name);
            }
            Some(Mark::Done) => {
                if cyclic.contains(&parent_name) {
                    cyclic.insert(name.to_string());
                }
            }
            None => {
                detect_cycles(metamodel, &parent_name, marks, cyclic, reporter);
                if cyclic.contains(&parent_name) {
                    cyclic.insert(name.to_string());
                }
            }
        }
    }
    marks.insert(name.to_string(), Mark::Done);
}

/// Transitive super-interfaces, nearest first.
fn ancestors<'a>(metamodel: &'a Metamodel, decl: &InterfaceDecl) -> Vec<&'a InterfaceDecl> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut frontier: Vec<&str> = decl.super_interfaces.iter().map(String::as_str).collect();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for name in frontier {
            let Some(parent) = find_interface(metamodel, name) else {
                continue;
            };
            if seen.insert(parent.fully_qualified_name()) {
                order.push(parent);
                next.extend(parent.super_interfaces.iter().map(String::as_str));
            }
        }
        frontier = next;
    }
    order
}

fn flatten(
    metamodel: &Metamodel,
    graph: &MetamodelGraph,
    decl: &InterfaceDecl,
    reporter: &mut ValidationReporter,
) -> InterfaceType {
    let name = decl.fully_qualified_name();
    let parents = ancestors(metamodel, decl);
    let mut interface = InterfaceType {
        package: decl.package.clone(),
        class_name: decl.class_name.clone(),
        super_interfaces: parents.iter().map(|p| p.fully_qualified_name()).collect(),
        attributes: Vec::new(),
        as_of_attributes: Vec::new(),
        relationships: Vec::new(),
    };

    for source in std::iter::once(decl).chain(parents.iter().copied()) {
        let declared_by = source.fully_qualified_name();
        for attribute in &source.attributes {
            match interface.attributes.iter().find(|a| a.name == attribute.name) {
                Some(existing) if existing.data_type != attribute.data_type => reporter.error(
                    Phase::Interfaces,
                    IssueKind::Schema,
                    &name,
                    Some(&attribute.name),
                    format!(
                        "attribute '{}' is {} in {} but {} in {}",
                        attribute.name,
                        existing.data_type,
                        existing.declared_by,
                        attribute.data_type,
                        declared_by
                    ),
                ),
                Some(_) => {}
                None => interface.attributes.push(InterfaceAttribute {
                    name: attribute.name.clone(),
                    data_type: attribute.data_type,
                    declared_by: declared_by.clone(),
                }),
            }
        }

        for as_of in &source.as_of_attributes {
            match interface.as_of_attributes.iter().find(|a| a.name == as_of.name) {
                Some(existing) if existing.is_processing_date != as_of.is_processing_date => {
                    reporter.error(
                        Phase::Interfaces,
                        IssueKind::Schema,
                        &name,
                        Some(&as_of.name),
                        format!(
                            "as-of attribute '{}' is declared inconsistently by {}",
                            as_of.name, declared_by
                        ),
                    )
                }
                Some(_) => {}
                None => interface.as_of_attributes.push(InterfaceAsOfAttribute {
                    name: as_of.name.clone(),
                    is_processing_date: as_of.is_processing_date,
                }),
            }
        }

        for relationship in &source.relationships {
            let cardinality = match relationship.cardinality.parse::<Cardinality>() {
                Ok(cardinality) => cardinality,
                Err(err) => {
                    // Inherited members were already reported on the interface declaring them.
                    if source.fully_qualified_name() == name {
                        reporter.error(
                            Phase::Interfaces,
                            IssueKind::Schema,
                            &name,
                            Some(&relationship.name),
                            err.to_string(),
                        );
                    }
                    continue;
                }
            };
            let related = graph
                .lookup(&relationship.related_object, ObjectKind::Plain)
                .map(|id| graph.object(id).fully_qualified_name())
                .or_else(|| {
                    find_interface(metamodel, &relationship.related_object)
                        .map(InterfaceDecl::fully_qualified_name)
                });
            let Some(related) = related else {
                if source.fully_qualified_name() == name {
                    reporter.error(
                        Phase::Interfaces,
                        IssueKind::Schema,
                        &name,
                        Some(&relationship.name),
                        format!(
                            "related object '{}' of relationship '{}' is neither an object nor an interface",
                            relationship.related_object, relationship.name
                        ),
                    );
                }
                continue;
            };
            match interface.relationships.iter().find(|r| r.name == relationship.name) {
                Some(existing) if existing.cardinality != cardinality => reporter.error(
                    Phase::Interfaces,
                    IssueKind::Schema,
                    &name,
                    Some(&relationship.name),
                    format!(
                        "relationship '{}' is {} in {} but {} in a super interface",
                        relationship.name, cardinality, declared_by, existing.cardinality
                    ),
                ),
                Some(_) => {}
                None => interface.relationships.push(InterfaceRelationship {
                    name: relationship.name.clone(),
                    related,
                    cardinality,
                }),
            }
        }
    }
    interface
}

/// Check that an object provides every member of the interfaces it declares.
pub(crate) fn check_conformance(
    metamodel: &Metamodel,
    graph: &MetamodelGraph,
    object: ObjectId,
    reporter: &mut ValidationReporter,
) {
    let owner = graph.object(object);
    if owner.state() == ResolutionState::Failed {
        return;
    }
    let fqn = owner.fully_qualified_name();
    for declared in &owner.interfaces {
        let interface = find_interface(metamodel, declared)
            .and_then(|decl| graph.interface(&decl.fully_qualified_name()));
        let Some(interface) = interface else {
            reporter.error(
                Phase::InterfaceConformance,
                IssueKind::Schema,
                &fqn,
                None,
                format!("interface '{}' is not defined or failed resolution", declared),
            );
            continue;
        };
        let interface_name = interface.fully_qualified_name();

        for required in &interface.attributes {
            let found = graph
                .attribute_by_name(object, &required.name)
                .map(|id| graph.attribute(id))
                .filter(|a| !a.is_as_of());
            match found {
                None => reporter.error(
                    Phase::InterfaceConformance,
                    IssueKind::Consistency,
                    &fqn,
                    Some(&required.name),
                    format!(
                        "attribute '{}' required by interface {} is missing",
                        required.name, interface_name
                    ),
                ),
                Some(attribute) if attribute.data_type() != required.data_type => reporter.error(
                    Phase::InterfaceConformance,
                    IssueKind::Consistency,
                    &fqn,
                    Some(&required.name),
                    format!(
                        "attribute '{}' is {} but interface {} requires {}",
                        required.name,
                        attribute.data_type(),
                        interface_name,
                        required.data_type
                    ),
                ),
                Some(_) => {}
            }
        }

        for required in &interface.as_of_attributes {
            let matches = graph
                .attribute_by_name(object, &required.name)
                .map(|id| graph.attribute(id))
                .is_some_and(|a| {
                    a.is_as_of() && a.is_processing_date() == required.is_processing_date
                });
            if !matches {
                reporter.error(
                    Phase::InterfaceConformance,
                    IssueKind::Consistency,
                    &fqn,
                    Some(&required.name),
                    format!(
                        "as-of attribute '{}' required by interface {} is missing or of the wrong kind",
                        required.name, interface_name
                    ),
                );
            }
        }

        for required in &interface.relationships {
            let matches = graph
                .relationship_by_name(object, &required.name)
                .map(|id| graph.relationship(id))
                .is_some_and(|r| r.cardinality == Some(required.cardinality));
            if !matches {
                reporter.error(
                    Phase::InterfaceConformance,
                    IssueKind::Consistency,
                    &fqn,
                    Some(&required.name),
                    format!(
                        "relationship '{}' ({}) required by interface {} is missing",
                        required.name, required.cardinality, interface_name
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::model::DataType;
    use std::sync::Arc;

    fn reporter() -> ValidationReporter {
        ValidationReporter::new(Arc::new(MemoryLogger::new()))
    }

    #[test]
    fn test_super_interfaces_are_flattened() {
        let metamodel = Metamodel::new()
            .with_interface(
                InterfaceDecl::new("com.acme", "Audited")
                    .with_attribute("createdBy", DataType::String),
            )
            .with_interface(
                InterfaceDecl::new("com.acme", "Versioned")
                    .with_super_interface("Audited")
                    .with_attribute("version", DataType::Int),
            )
            .with_interface(
                InterfaceDecl::new("com.acme", "Document")
                    .with_super_interface("com.acme.Versioned"),
            );
        let mut graph = MetamodelGraph::new();
        let mut reporter = reporter();

        resolve_interfaces(&metamodel, &mut graph, &mut reporter);

        assert!(!reporter.has_errors());
        let document = graph.interface("com.acme.Document").unwrap();
        assert_eq!(
            document.super_interfaces,
            vec!["com.acme.Versioned".to_string(), "com.acme.Audited".to_string()]
        );
        assert_eq!(document.attributes.len(), 2);
        assert!(document.is_a("com.acme.Audited"));
    }

    #[test]
    fn test_cycle_is_reported_once() {
        let metamodel = Metamodel::new()
            .with_interface(InterfaceDecl::new("p", "A").with_super_interface("B"))
            .with_interface(InterfaceDecl::new("p", "B").with_super_interface("A"));
        let mut graph = MetamodelGraph::new();
        let mut reporter = reporter();

        resolve_interfaces(&metamodel, &mut graph, &mut reporter);

        let report = reporter.into_report();
        assert_eq!(report.error_count(), 1);
        assert!(report.issues[0]
            .message
            .starts_with("Circular dependency between super interface"));
        assert!(graph.interface("p.A").is_none());
    }

    #[test]
    fn test_conflicting_inherited_attribute() {
        let metamodel = Metamodel::new()
            .with_interface(InterfaceDecl::new("p", "Base").with_attribute("code", DataType::Int))
            .with_interface(
                InterfaceDecl::new("p", "Child")
                    .with_super_interface("Base")
                    .with_attribute("code", DataType::String),
            );
        let mut graph = MetamodelGraph::new();
        let mut reporter = reporter();

        resolve_interfaces(&metamodel, &mut graph, &mut reporter);

        assert_eq!(reporter.error_count(), 1);
        assert!(graph.interface("p.Base").is_some());
        assert!(graph.interface("p.Child").is_none());
    }

    #[test]
    fn test_unknown_cardinality_and_related_object() {
        let metamodel = Metamodel::new().with_interface(
            InterfaceDecl::new("p", "Owner")
                .with_relationship("things", "Nowhere", "one-to-many")
                .with_relationship("others", "Owner", "lots"),
        );
        let mut graph = MetamodelGraph::new();
        let mut reporter = reporter();

        resolve_interfaces(&metamodel, &mut graph, &mut reporter);

        assert_eq!(reporter.error_count(), 2);
    }
}
