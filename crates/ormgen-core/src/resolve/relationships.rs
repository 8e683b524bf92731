//! Join analysis and reverse relationship synthesis.

use super::report::{IssueKind, Phase, ValidationReporter};
use crate::model::{
    Cardinality, JoinQuery, MetamodelGraph, ObjectId, ObjectKind, RelationshipId,
    ResolutionState,
};

/// Analyse every declared relationship of every resolved object and add the
/// reverse side of bidirectional ones to their related objects.
pub(crate) fn resolve_relationships(graph: &mut MetamodelGraph, reporter: &mut ValidationReporter) {
    for object in graph.object_ids_of_kind(ObjectKind::Plain) {
        if graph.object(object).state() == ResolutionState::Failed {
            continue;
        }
        for id in graph.object(object).relationships.clone() {
            analyse(graph, object, id, reporter);
        }
    }
}

fn analyse(
    graph: &mut MetamodelGraph,
    object: ObjectId,
    id: RelationshipId,
    reporter: &mut ValidationReporter,
) {
    let relationship = graph.relationship(id);
    if relationship.is_reverse_relationship {
        return;
    }
    let Some(related) = relationship.related else {
        return;
    };
    let owner_name = graph.object(object).fully_qualified_name();
    let related_name = graph.object(related).fully_qualified_name();
    let name = relationship.name.clone();
    let mut errors: Vec<(IssueKind, String)> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let cardinality = match relationship.cardinality_key.as_deref() {
        None => {
            errors.push((
                IssueKind::Schema,
                format!("relationship '{}' does not declare a cardinality", name),
            ));
            None
        }
        Some(key) => match key.parse::<Cardinality>() {
            Ok(cardinality) => Some(cardinality),
            Err(err) => {
                errors.push((IssueKind::Schema, err.to_string()));
                None
            }
        },
    };

    let join = match relationship.query.as_deref() {
        None => {
            errors.push((
                IssueKind::Schema,
                format!("relationship '{}' does not declare a join", name),
            ));
            JoinQuery::default()
        }
        Some(query) => {
            let join = JoinQuery::parse(query, &graph.object(related).class_name);
            if !join.references_related {
                errors.push((
                    IssueKind::Schema,
                    format!(
                        "relationship query does not have any relational expression involving the related object: {}",
                        related_name
                    ),
                ));
            }
            if !join.references_this {
                errors.push((
                    IssueKind::Schema,
                    "relationship query does not have any relational expression involving 'this'"
                        .to_string(),
                ));
            }
            join
        }
    };

    for pair in &join.pairs {
        if graph.attribute_by_name(object, &pair.this_attribute).is_none() {
            errors.push((
                IssueKind::Schema,
                format!(
                    "join attribute '{}' is not an attribute of {}",
                    pair.this_attribute, owner_name
                ),
            ));
        }
        if graph.attribute_by_name(related, &pair.related_attribute).is_none() {
            errors.push((
                IssueKind::Schema,
                format!(
                    "join attribute '{}' is not an attribute of {}",
                    pair.related_attribute, related_name
                ),
            ));
        }
    }

    let mut related_is_dependent = relationship.related_is_dependent;
    if related_is_dependent == Some(true) {
        let many_to_many = cardinality.is_some_and(|c| c.is_many_to_many());
        let uncovered: Vec<String> = graph
            .object(object)
            .attributes
            .iter()
            .map(|a| graph.attribute(*a))
            .filter(|a| a.is_primary_key())
            .filter(|a| !join.pairs.iter().any(|p| p.this_attribute == a.name()))
            .map(|a| a.name().to_string())
            .collect();
        if many_to_many {
            warnings.push(format!(
                "relationship '{}' cannot be related-dependent because it is many-to-many",
                name
            ));
            related_is_dependent = Some(false);
        } else if !uncovered.is_empty() {
            warnings.push(format!(
                "relationship '{}' cannot be related-dependent because primary key attribute(s) {} are not joined",
                name,
                uncovered.join(", ")
            ));
            related_is_dependent = Some(false);
        }
    }

    if relationship.has_parameters() && relationship.is_bidirectional() {
        errors.push((
            IssueKind::Schema,
            format!(
                "parameterized relationship '{}' cannot have a reverse relationship",
                name
            ),
        ));
    }

    let inherited = relationship.inherited;
    let synthesize = errors.is_empty()
        && !inherited
        && relationship.is_bidirectional()
        && !relationship.has_parameters();

    let relationship = graph.relationship_mut(id);
    relationship.cardinality = cardinality;
    relationship.join = join;
    relationship.related_is_dependent = related_is_dependent;

    // Inherited copies were already reported on the declaring class.
    if !inherited {
        for (kind, message) in errors {
            reporter.error(Phase::Relationships, kind, &owner_name, Some(&name), message);
        }
        for message in warnings {
            reporter.warning(
                Phase::Relationships,
                IssueKind::Schema,
                &owner_name,
                Some(&name),
                message,
            );
        }
    }

    if synthesize {
        add_reverse(graph, id, &owner_name, reporter);
    }
}

fn add_reverse(
    graph: &mut MetamodelGraph,
    forward: RelationshipId,
    owner_name: &str,
    reporter: &mut ValidationReporter,
) {
    let relationship = graph.relationship(forward);
    let (Some(related), Some(reverse_name)) =
        (relationship.related, relationship.reverse_name.clone())
    else {
        return;
    };
    let target = graph.object(related);
    let target_name = target.fully_qualified_name();
    if target.state() == ResolutionState::Failed {
        return;
    }
    if target.imported {
        reporter.error(
            Phase::Relationships,
            IssueKind::Consistency,
            owner_name,
            Some(&relationship.name),
            format!(
                "cannot add reverse relationship '{}' to imported object {}",
                reverse_name, target_name
            ),
        );
        return;
    }
    if graph.attribute_by_name(related, &reverse_name).is_some()
        || graph.relationship_by_name(related, &reverse_name).is_some()
    {
        reporter.error(
            Phase::Relationships,
            IssueKind::Consistency,
            &target_name,
            Some(&reverse_name),
            format!(
                "reverse relationship '{}' of {}.{} collides with an existing member",
                reverse_name, owner_name, relationship.name
            ),
        );
        return;
    }
    if let Some(reverse) = relationship.reverse(forward, owner_name) {
        tracing::debug!(
            object = %target_name,
            relationship = %reverse.name,
            "adding reverse relationship"
        );
        graph.add_relationship(reverse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::metamodel::{AttributeDecl, RelationshipDecl};
    use crate::model::{Attribute, DataType, ObjectDefaults, ObjectType, Relationship};
    use crate::resolve::report::Severity;
    use std::sync::Arc;

    fn reporter() -> ValidationReporter {
        ValidationReporter::new(Arc::new(MemoryLogger::new()))
    }

    fn object(graph: &mut MetamodelGraph, name: &str, attributes: &[AttributeDecl]) -> ObjectId {
        let id = graph
            .add_object(|id| {
                ObjectType::new(id, "com.acme", name, ObjectKind::Plain, ObjectDefaults::default())
            })
            .unwrap();
        for decl in attributes {
            let attribute = Attribute::plain(decl, graph.object(id));
            graph.add_attribute(attribute);
        }
        id
    }

    fn declare(
        graph: &mut MetamodelGraph,
        owner: ObjectId,
        related: ObjectId,
        decl: RelationshipDecl,
    ) -> RelationshipId {
        let mut relationship = Relationship::from_decl(&decl, owner);
        relationship.related = Some(related);
        graph.add_relationship(relationship)
    }

    fn order_and_item() -> (MetamodelGraph, ObjectId, ObjectId) {
        let mut graph = MetamodelGraph::new();
        let order = object(
            &mut graph,
            "Order",
            &[AttributeDecl::new("id", DataType::Int).primary_key()],
        );
        let item = object(
            &mut graph,
            "OrderItem",
            &[
                AttributeDecl::new("id", DataType::Int).primary_key(),
                AttributeDecl::new("orderId", DataType::Int),
            ],
        );
        (graph, order, item)
    }

    #[test]
    fn test_reverse_relationship_added() {
        let (mut graph, order, item) = order_and_item();
        let items = declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .with_reverse_name("order")
            .related_is_dependent(),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        assert!(!reporter.has_errors());
        let reverse = graph.relationship_by_name(item, "order").unwrap();
        let reverse = graph.relationship(reverse);
        assert_eq!(reverse.cardinality, Some(Cardinality::ManyToOne));
        assert_eq!(reverse.reverse_of, Some(items));
        assert!(reverse.is_dependent());
        assert!(graph.relationship(items).is_related_dependent());
    }

    #[test]
    fn test_unknown_cardinality() {
        let (mut graph, order, item) = order_and_item();
        declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "some-to-some",
                "this.id = OrderItem.orderId",
            ),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        let report = reporter.into_report();
        assert_eq!(report.error_count(), 1);
        assert!(report.issues[0].message.contains("some-to-some"));
    }

    #[test]
    fn test_query_must_reference_both_sides() {
        let (mut graph, order, item) = order_and_item();
        declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new("items", "OrderItem", "one-to-many", "OrderItem.orderId = 7"),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        let report = reporter.into_report();
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.issues[0].message,
            "relationship query does not have any relational expression involving 'this'"
        );
    }

    #[test]
    fn test_related_dependent_cleared_when_key_not_joined() {
        let (mut graph, order, item) = order_and_item();
        let items = declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .related_is_dependent(),
        );
        let odd = declare(
            &mut graph,
            item,
            order,
            RelationshipDecl::new("others", "Order", "one-to-many", "this.orderId = Order.id")
                .related_is_dependent(),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        let report = reporter.into_report();
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.issues[0].severity, Severity::Warning);
        assert!(graph.relationship(items).is_related_dependent());
        assert_eq!(graph.relationship(odd).related_is_dependent, Some(false));
    }

    #[test]
    fn test_parameterized_reverse_rejected() {
        let (mut graph, order, item) = order_and_item();
        declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .with_parameters("int state")
            .with_reverse_name("order"),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        assert_eq!(reporter.error_count(), 1);
        assert!(graph.relationship_by_name(item, "order").is_none());
    }

    #[test]
    fn test_reverse_name_collision() {
        let (mut graph, order, item) = order_and_item();
        declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .with_reverse_name("orderId"),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        let report = reporter.into_report();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Consistency);
        assert_eq!(report.issues[0].object, "com.acme.OrderItem");
    }

    #[test]
    fn test_reverse_on_imported_object_rejected() {
        let (mut graph, order, item) = order_and_item();
        graph.object_mut(item).imported = true;
        declare(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .with_reverse_name("order"),
        );
        let mut reporter = reporter();

        resolve_relationships(&mut graph, &mut reporter);

        assert_eq!(reporter.error_count(), 1);
    }
}
