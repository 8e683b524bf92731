//! Embedded value objects and their expansion into mapped attributes.

use std::collections::BTreeSet;

use super::report::{IssueKind, Phase, ValidationReporter};
use crate::metamodel::EmbeddedValueDecl;
use crate::model::{
    Attribute, MappedSettings, MetamodelGraph, ObjectId, ObjectKind, ResolutionState,
};

fn first_upper(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn first_lower(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of a (possibly nested) embedded value: `address` nested in
/// `billing` becomes `billingAddress`.
pub(crate) fn nested_name(path: &[&str]) -> String {
    let joined: String = path.iter().map(|segment| first_upper(segment)).collect();
    first_lower(&joined)
}

/// Resolve nested types, reject duplicate member names and nesting cycles.
pub(crate) fn validate_embedded_value_objects(
    graph: &mut MetamodelGraph,
    reporter: &mut ValidationReporter,
) {
    let ids = graph.object_ids_of_kind(ObjectKind::EmbeddedValue);

    for &id in &ids {
        let fqn = graph.object(id).fully_qualified_name();
        let mut names = BTreeSet::new();
        for attribute in graph.object(id).attributes.clone() {
            let name = graph.attribute(attribute).name().to_string();
            if !names.insert(name.clone()) {
                reporter.error(
                    Phase::EmbeddedValues,
                    IssueKind::Schema,
                    &fqn,
                    Some(&name),
                    format!("duplicate member name '{}'", name),
                );
            }
        }

        let mut nested = std::mem::take(&mut graph.object_mut(id).nested_objects);
        for entry in &mut nested {
            if !names.insert(entry.name.clone()) {
                reporter.error(
                    Phase::EmbeddedValues,
                    IssueKind::Schema,
                    &fqn,
                    Some(&entry.name),
                    format!("duplicate member name '{}'", entry.name),
                );
            }
            entry.target = graph.lookup(&entry.type_name, ObjectKind::EmbeddedValue);
            if entry.target.is_none() {
                reporter.error(
                    Phase::EmbeddedValues,
                    IssueKind::Schema,
                    &fqn,
                    Some(&entry.name),
                    format!(
                        "nested object type '{}' is not a defined embedded value object",
                        entry.type_name
                    ),
                );
            }
        }
        graph.object_mut(id).nested_objects = nested;
    }

    for &id in &ids {
        let mut path = Vec::new();
        visit(graph, id, &mut path, reporter);
    }
}

fn visit(
    graph: &mut MetamodelGraph,
    id: ObjectId,
    path: &mut Vec<ObjectId>,
    reporter: &mut ValidationReporter,
) -> bool {
    match graph.object(id).state {
        ResolutionState::Resolved => return true,
        ResolutionState::Failed => return false,
        ResolutionState::InProgress => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let chain: Vec<String> = path[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|p| graph.object(*p).fully_qualified_name())
                .collect();
            reporter.error(
                Phase::EmbeddedValues,
                IssueKind::Consistency,
                &chain[0],
                None,
                format!("cyclic nesting of embedded value objects: {}", chain.join(" -> ")),
            );
            for member in &path[start..] {
                graph.object_mut(*member).state = ResolutionState::Failed;
            }
            return false;
        }
        ResolutionState::Unresolved => {}
    }

    graph.object_mut(id).state = ResolutionState::InProgress;
    path.push(id);
    let targets: Vec<ObjectId> = graph
        .object(id)
        .nested_objects
        .iter()
        .filter_map(|n| n.target)
        .collect();
    let mut ok = true;
    for target in targets {
        ok &= visit(graph, target, path, reporter);
    }
    path.pop();

    let object = graph.object_mut(id);
    if object.state == ResolutionState::InProgress {
        object.state = if ok {
            ResolutionState::Resolved
        } else {
            ResolutionState::Failed
        };
    }
    object.state == ResolutionState::Resolved
}

/// Expand an object's embedded values into mapped attributes.
pub(crate) fn expand_embedded_values(
    graph: &mut MetamodelGraph,
    object: ObjectId,
    embedded_values: &[EmbeddedValueDecl],
    reporter: &mut ValidationReporter,
) {
    let fqn = graph.object(object).fully_qualified_name();
    for decl in embedded_values {
        let Some(type_name) = decl.type_name.as_deref() else {
            reporter.error(
                Phase::Attributes,
                IssueKind::Schema,
                &fqn,
                Some(&decl.name),
                format!("embedded value '{}' does not declare its type", decl.name),
            );
            continue;
        };
        match graph.lookup(type_name, ObjectKind::EmbeddedValue) {
            Some(value_object) if graph.object(value_object).state() == ResolutionState::Failed => {
                reporter.error(
                    Phase::Attributes,
                    IssueKind::Schema,
                    &fqn,
                    Some(&decl.name),
                    format!("embedded value type '{}' failed resolution", type_name),
                )
            }
            Some(value_object) => {
                let mut path = Vec::new();
                expand(graph, object, &fqn, value_object, decl, &mut path, reporter);
            }
            None => reporter.error(
                Phase::Attributes,
                IssueKind::Schema,
                &fqn,
                Some(&decl.name),
                format!("embedded value type '{}' is not defined", type_name),
            ),
        }
    }
}

fn expand<'a>(
    graph: &mut MetamodelGraph,
    owner: ObjectId,
    owner_name: &str,
    value_object: ObjectId,
    decl: &'a EmbeddedValueDecl,
    path: &mut Vec<&'a str>,
    reporter: &mut ValidationReporter,
) {
    path.push(decl.name.as_str());
    let embedded_value = nested_name(path);
    let value_name = graph.object(value_object).fully_qualified_name();

    for mapping in &decl.mappings {
        let Some(source) = graph.attribute_by_name(value_object, &mapping.attribute) else {
            reporter.error(
                Phase::Attributes,
                IssueKind::Schema,
                owner_name,
                Some(&embedded_value),
                format!(
                    "embedded value object {} has no attribute '{}'",
                    value_name, mapping.attribute
                ),
            );
            continue;
        };
        let already_mapped = graph.object(owner).attributes.iter().any(|a| {
            graph.attribute(*a).column_name() == Some(mapping.column_name.as_str())
        });
        if already_mapped {
            tracing::debug!(
                object = %owner_name,
                column = %mapping.column_name,
                "column already mapped, skipping embedded mapping"
            );
            continue;
        }

        let name = mapping
            .underlying_attribute
            .clone()
            .unwrap_or_else(|| format!("{}{}", embedded_value, first_upper(&mapping.attribute)));
        if graph.attribute_by_name(owner, &name).is_some()
            || graph.relationship_by_name(owner, &name).is_some()
        {
            reporter.error(
                Phase::Attributes,
                IssueKind::Consistency,
                owner_name,
                Some(&name),
                format!(
                    "mapped attribute '{}' of embedded value '{}' collides with an existing member",
                    name, embedded_value
                ),
            );
            continue;
        }

        let source = graph.attribute(source);
        let settings = MappedSettings {
            embedded_value: embedded_value.clone(),
            mapping_attribute: mapping.attribute.clone(),
            column_name: mapping.column_name.clone(),
            nullable: source.is_nullable(),
            max_length: source.max_length(),
        };
        let attribute = Attribute::mapped(name, source.data_type(), graph.object(owner), settings);
        graph.add_attribute(attribute);
    }

    for nested in &decl.nested {
        let target = graph
            .object(value_object)
            .nested_objects
            .iter()
            .find(|n| n.name == nested.name)
            .and_then(|n| n.target);
        match target {
            Some(target) => expand(graph, owner, owner_name, target, nested, path, reporter),
            None => reporter.error(
                Phase::Attributes,
                IssueKind::Schema,
                owner_name,
                Some(&embedded_value),
                format!(
                    "embedded value object {} has no nested object '{}'",
                    value_name, nested.name
                ),
            ),
        }
    }
    path.pop();
}
