//! Superclass merge.
//!
//! Every object is resolved after its superclass, so a subclass always sees
//! the fully merged member list of its parent. A per-object
//! [`ResolutionState`] turns a superclass cycle into a single reported error
//! instead of unbounded recursion.

use super::report::{IssueKind, Phase, ValidationReporter};
use crate::model::{MetamodelGraph, ObjectId, ObjectKind, ResolutionState};

type MemberError = (Option<String>, String);

/// Resolve the superclass chain of every persistent object.
pub(crate) fn resolve_inheritance(graph: &mut MetamodelGraph, reporter: &mut ValidationReporter) {
    for id in graph.object_ids_of_kind(ObjectKind::Plain) {
        let mut path = Vec::new();
        resolve(graph, id, &mut path, reporter);
    }
}

fn resolve(
    graph: &mut MetamodelGraph,
    id: ObjectId,
    path: &mut Vec<ObjectId>,
    reporter: &mut ValidationReporter,
) -> bool {
    match graph.object(id).state() {
        ResolutionState::Resolved => return true,
        ResolutionState::Failed => return false,
        ResolutionState::InProgress => {
            report_cycle(graph, id, path, reporter);
            return false;
        }
        ResolutionState::Unresolved => {}
    }

    let fqn = graph.object(id).fully_qualified_name();
    let Some(super_name) = graph.object(id).super_class_name.clone() else {
        graph.object_mut(id).state = ResolutionState::Resolved;
        return true;
    };
    let Some(parent) = graph.lookup(&super_name, ObjectKind::Plain) else {
        reporter.error(
            Phase::Inheritance,
            IssueKind::Schema,
            &fqn,
            None,
            format!("SuperClass name '{}' not defined", super_name),
        );
        graph.object_mut(id).state = ResolutionState::Failed;
        return false;
    };

    graph.object_mut(id).super_class = Some(parent);
    graph.object_mut(id).state = ResolutionState::InProgress;
    path.push(id);
    let parent_ok = resolve(graph, parent, path, reporter);
    path.pop();

    if !parent_ok {
        // Cycle members were already marked and reported.
        if graph.object(id).state() != ResolutionState::Failed {
            reporter.error(
                Phase::Inheritance,
                IssueKind::Consistency,
                &fqn,
                None,
                format!("superclass '{}' of '{}' failed resolution", super_name, fqn),
            );
            graph.object_mut(id).state = ResolutionState::Failed;
        }
        return false;
    }

    tracing::debug!(object = %fqn, parent = %super_name, "merging superclass members");
    let errors = merge(graph, parent, id);
    let clean = errors.is_empty();
    for (member, message) in errors {
        reporter.error(Phase::Inheritance, IssueKind::Schema, &fqn, member.as_deref(), message);
    }
    graph.object_mut(id).state = if clean {
        ResolutionState::Resolved
    } else {
        ResolutionState::Failed
    };
    clean
}

fn report_cycle(
    graph: &mut MetamodelGraph,
    id: ObjectId,
    path: &[ObjectId],
    reporter: &mut ValidationReporter,
) {
    let start = path.iter().position(|p| *p == id).unwrap_or(0);
    let chain: Vec<String> = path[start..]
        .iter()
        .chain(std::iter::once(&id))
        .map(|p| graph.object(*p).fully_qualified_name())
        .collect();
    reporter.error(
        Phase::Inheritance,
        IssueKind::Consistency,
        &chain[0],
        None,
        format!("cyclic superclass chain {}", chain.join(" -> ")),
    );
    for member in &path[start..] {
        graph.object_mut(*member).state = ResolutionState::Failed;
    }
}

/// Merge the members of a resolved parent into `child`.
fn merge(graph: &mut MetamodelGraph, parent: ObjectId, child: ObjectId) -> Vec<MemberError> {
    let mut errors = Vec::new();

    let parent_source = graph.object(parent).source_attribute;
    let child_source = graph.object(child).source_attribute;
    if let (Some(_), Some(own)) = (parent_source, child_source) {
        errors.push((
            Some(graph.attribute(own).name().to_string()),
            "source attributes are not allowed to be overridden".to_string(),
        ));
    }

    for parent_attribute in graph.object(parent).attributes.clone() {
        let inherited = graph.attribute(parent_attribute).clone();
        if Some(parent_attribute) == parent_source {
            if child_source.is_none() {
                let copy = inherited.clone_for_new_owner(graph.object(child));
                let id = graph.add_attribute(copy);
                graph.object_mut(child).source_attribute = Some(id);
            }
            continue;
        }
        match graph.attribute_by_name(child, inherited.name()) {
            Some(own) => {
                let messages = graph
                    .attribute_mut(own)
                    .validate_and_use_missing_values_from_super_class(&inherited);
                errors.extend(
                    messages
                        .into_iter()
                        .map(|m| (Some(inherited.name().to_string()), m)),
                );
            }
            None => {
                let copy = inherited.clone_for_new_owner(graph.object(child));
                graph.add_attribute(copy);
            }
        }
    }

    for parent_relationship in graph.object(parent).relationships.clone() {
        let inherited = graph.relationship(parent_relationship).clone();
        if inherited.is_reverse_relationship {
            continue;
        }
        match graph.relationship_by_name(child, &inherited.name) {
            Some(own) => {
                let messages = graph
                    .relationship_mut(own)
                    .validate_and_use_missing_values_from_super_class(&inherited);
                errors.extend(messages.into_iter().map(|m| (Some(inherited.name.clone()), m)));
            }
            None => {
                graph.add_relationship(inherited.clone_for_new_owner(child));
            }
        }
    }
    errors
}
