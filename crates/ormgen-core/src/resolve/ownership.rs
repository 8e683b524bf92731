//! Attribute ownership arbitration.
//!
//! When several relationships join on the same foreign-key attribute, exactly
//! one of them owns it and generates the reverse-navigation bookkeeping. The
//! winner is the relationship with the smallest [`OwnershipKey`].

use crate::model::{
    AttributeId, MetamodelGraph, ObjectId, Relationship, RelationshipId, ResolutionState,
    ReverseRelationship,
};

/// Total order used to pick the owning relationship; smaller wins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct OwnershipKey {
    dependency_rank: u8,
    name_length: usize,
    name: String,
    owner: String,
    related: String,
    reverse: bool,
}

impl OwnershipKey {
    pub(crate) fn of(graph: &MetamodelGraph, relationship: &Relationship) -> Self {
        let dependent = relationship.is_dependent() || relationship.is_related_dependent();
        Self {
            dependency_rank: if dependent { 0 } else { 1 },
            name_length: relationship.name.len(),
            name: relationship.name.clone(),
            owner: graph.object(relationship.owner).fully_qualified_name(),
            related: relationship
                .related
                .map(|r| graph.object(r).fully_qualified_name())
                .unwrap_or_default(),
            reverse: relationship.is_reverse_relationship,
        }
    }
}

/// Whether `candidate` should take ownership away from `incumbent`.
pub(crate) fn is_better_for_attribute_ownership(
    graph: &MetamodelGraph,
    candidate: RelationshipId,
    incumbent: RelationshipId,
) -> bool {
    OwnershipKey::of(graph, graph.relationship(candidate))
        < OwnershipKey::of(graph, graph.relationship(incumbent))
}

struct Claim {
    owning_relationship_name: Option<String>,
    reverse_relationship: Option<ReverseRelationship>,
}

/// Arbitrate ownership for every relationship declared on `object`.
///
/// Returns the number of claims that were installed.
pub(crate) fn resolve_ownership(graph: &mut MetamodelGraph, object: ObjectId) -> usize {
    if graph.object(object).state() == ResolutionState::Failed {
        return 0;
    }
    let mut installed = 0;
    for id in graph.object(object).relationships.clone() {
        let relationship = graph.relationship(id).clone();
        if !(relationship.has_setter()
            && !relationship.has_filters()
            && relationship.depends_only_on_from_to_objects())
        {
            continue;
        }
        let (Some(related), Some(cardinality)) = (relationship.related, relationship.cardinality)
        else {
            continue;
        };
        if graph.object(related).state() == ResolutionState::Failed {
            continue;
        }
        let owner = graph.object(object);
        let (owner_package, owner_class) = (owner.package.clone(), owner.class_name.clone());
        let related_object = graph.object(related);
        let (related_package, related_class) =
            (related_object.package.clone(), related_object.class_name.clone());

        for pair in &relationship.join.pairs {
            let (Some(from), Some(to)) = (
                graph.attribute_by_name(object, &pair.this_attribute),
                graph.attribute_by_name(related, &pair.related_attribute),
            ) else {
                continue;
            };
            let (from_attribute, to_attribute) = (graph.attribute(from), graph.attribute(to));
            if from_attribute.is_as_of() || from_attribute.is_source() {
                continue;
            }

            let related_dependent = relationship.is_related_dependent();
            let one_to_one = !cardinality.is_from_many() && !cardinality.is_to_many();
            let one_to_one_forward =
                one_to_one && (related_dependent || !to_attribute.is_primary_key());
            let one_to_one_reverse = one_to_one
                && to_attribute.is_primary_key()
                && (related_dependent || !from_attribute.is_primary_key());
            let one_to_many = !cardinality.is_from_many() && cardinality.is_to_many();
            let many_to_one = cardinality.is_from_many() && !cardinality.is_to_many();

            let (target, claim) = if one_to_many || one_to_one_forward {
                (
                    to,
                    Claim {
                        owning_relationship_name: relationship.reverse_name.clone(),
                        reverse_relationship: Some(ReverseRelationship {
                            package: owner_package.clone(),
                            class_name: owner_class.clone(),
                            name: relationship.name.clone(),
                        }),
                    },
                )
            } else if one_to_one_reverse || many_to_one {
                // Unidirectional claims still record their own name; only the
                // reverse triple needs a reverse name.
                let reverse_relationship = relationship.reverse_name.clone().map(|reverse_name| {
                    ReverseRelationship {
                        package: related_package.clone(),
                        class_name: related_class.clone(),
                        name: reverse_name,
                    }
                });
                (
                    from,
                    Claim {
                        owning_relationship_name: Some(relationship.name.clone()),
                        reverse_relationship,
                    },
                )
            } else {
                continue;
            };

            if claim_attribute(graph, target, id, claim) {
                installed += 1;
            }
        }
    }
    installed
}

fn claim_attribute(
    graph: &mut MetamodelGraph,
    attribute: AttributeId,
    relationship: RelationshipId,
    claim: Claim,
) -> bool {
    let take = match graph.attribute(attribute).owning_relationship() {
        None => true,
        Some(incumbent) if incumbent == relationship => true,
        Some(incumbent) => is_better_for_attribute_ownership(graph, relationship, incumbent),
    };
    if take {
        let attribute = graph.attribute_mut(attribute);
        attribute.clear_ownership();
        attribute.install_ownership(
            relationship,
            claim.owning_relationship_name,
            claim.reverse_relationship,
        );
    }
    take
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{AttributeDecl, RelationshipDecl};
    use crate::model::{
        Attribute, Cardinality, DataType, JoinQuery, ObjectDefaults, ObjectKind, ObjectType,
    };

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

    fn relationship(
        graph: &mut MetamodelGraph,
        owner: ObjectId,
        related: ObjectId,
        decl: RelationshipDecl,
    ) -> RelationshipId {
        let mut relationship = Relationship::from_decl(&decl, owner);
        relationship.related = Some(related);
        relationship.cardinality = decl
            .cardinality
            .as_deref()
            .map(|c| c.parse::<Cardinality>().unwrap());
        relationship.join = JoinQuery::parse(
            decl.query.as_deref().unwrap(),
            &graph.object(related).class_name,
        );
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
    fn test_one_to_many_claims_related_attribute() {
        let (mut graph, order, item) = order_and_item();
        let items = relationship(
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

        assert_eq!(resolve_ownership(&mut graph, order), 1);

        let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
        assert_eq!(order_id.owning_relationship(), Some(items));
        assert_eq!(order_id.owning_relationship_name(), Some("order"));
        assert_eq!(
            order_id.reverse_relationship(),
            Some(&ReverseRelationship {
                package: "com.acme".into(),
                class_name: "Order".into(),
                name: "items".into(),
            })
        );
    }

    #[test]
    fn test_many_to_one_claims_owner_attribute() {
        let (mut graph, order, item) = order_and_item();
        let parent = relationship(
            &mut graph,
            item,
            order,
            RelationshipDecl::new("order", "Order", "many-to-one", "this.orderId = Order.id")
                .with_reverse_name("items"),
        );

        resolve_ownership(&mut graph, item);

        let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
        assert_eq!(order_id.owning_relationship(), Some(parent));
        assert_eq!(order_id.owning_relationship_name(), Some("order"));
        assert_eq!(order_id.reverse_relationship().unwrap().name, "items");
        assert_eq!(order_id.reverse_relationship().unwrap().class_name, "Order");
    }

    #[test]
    fn test_dependent_relationship_wins_in_either_order() {
        for dependent_first in [true, false] {
            let (mut graph, order, item) = order_and_item();
            let declare_dependent = |graph: &mut MetamodelGraph| {
                relationship(
                    graph,
                    order,
                    item,
                    RelationshipDecl::new(
                        "lines",
                        "OrderItem",
                        "one-to-many",
                        "this.id = OrderItem.orderId",
                    )
                    .related_is_dependent(),
                )
            };
            let declare_plain = |graph: &mut MetamodelGraph| {
                relationship(
                    graph,
                    item,
                    order,
                    RelationshipDecl::new("po", "Order", "many-to-one", "this.orderId = Order.id"),
                )
            };
            let dependent = if dependent_first {
                let dependent = declare_dependent(&mut graph);
                declare_plain(&mut graph);
                resolve_ownership(&mut graph, order);
                resolve_ownership(&mut graph, item);
                dependent
            } else {
                declare_plain(&mut graph);
                let dependent = declare_dependent(&mut graph);
                resolve_ownership(&mut graph, item);
                resolve_ownership(&mut graph, order);
                dependent
            };

            let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
            assert_eq!(order_id.owning_relationship(), Some(dependent));
            assert_eq!(order_id.reverse_relationship().unwrap().name, "lines");
            assert_eq!(order_id.owning_relationship_name(), None);
        }
    }

    #[test]
    fn test_key_orders_by_length_then_name() {
        let (mut graph, order, item) = order_and_item();
        let short = relationship(
            &mut graph,
            order,
            item,
            RelationshipDecl::new("ab", "OrderItem", "one-to-many", "this.id = OrderItem.orderId"),
        );
        let long = relationship(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "aa_long",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            ),
        );
        let sibling = relationship(
            &mut graph,
            order,
            item,
            RelationshipDecl::new("aa", "OrderItem", "one-to-many", "this.id = OrderItem.orderId"),
        );

        assert!(is_better_for_attribute_ownership(&graph, short, long));
        assert!(is_better_for_attribute_ownership(&graph, sibling, short));
        assert!(!is_better_for_attribute_ownership(&graph, long, sibling));

        resolve_ownership(&mut graph, order);
        let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
        assert_eq!(order_id.owning_relationship(), Some(sibling));
    }

    #[test]
    fn test_filtered_relationship_never_owns() {
        let (mut graph, order, item) = order_and_item();
        relationship(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "openItems",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId and OrderItem.state = 1",
            ),
        );

        assert_eq!(resolve_ownership(&mut graph, order), 0);
        let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
        assert_eq!(order_id.owning_relationship(), None);
    }

    #[test]
    fn test_one_to_one_on_primary_keys() {
        let mut graph = MetamodelGraph::new();
        let account = object(
            &mut graph,
            "Account",
            &[AttributeDecl::new("id", DataType::Int).primary_key()],
        );
        let profile = object(
            &mut graph,
            "Profile",
            &[AttributeDecl::new("accountId", DataType::Int).primary_key()],
        );
        relationship(
            &mut graph,
            account,
            profile,
            RelationshipDecl::new(
                "profile",
                "Profile",
                "one-to-one",
                "this.id = Profile.accountId",
            ),
        );

        // Both ends are keys and nothing is dependent: neither side may be claimed.
        assert_eq!(resolve_ownership(&mut graph, account), 0);

        let mut graph = MetamodelGraph::new();
        let account = object(
            &mut graph,
            "Account",
            &[AttributeDecl::new("id", DataType::Int).primary_key()],
        );
        let profile = object(
            &mut graph,
            "Profile",
            &[AttributeDecl::new("accountId", DataType::Int).primary_key()],
        );
        let dependent = relationship(
            &mut graph,
            account,
            profile,
            RelationshipDecl::new("profile", "Profile", "one-to-one", "this.id = Profile.accountId")
                .related_is_dependent(),
        );

        assert_eq!(resolve_ownership(&mut graph, account), 1);
        let account_id = graph.attribute(graph.attribute_by_name(profile, "accountId").unwrap());
        assert_eq!(account_id.owning_relationship(), Some(dependent));
    }

    #[test]
    fn test_unidirectional_many_to_one_records_its_name() {
        let (mut graph, order, item) = order_and_item();
        let parent = relationship(
            &mut graph,
            item,
            order,
            RelationshipDecl::new("order", "Order", "many-to-one", "this.orderId = Order.id"),
        );

        assert_eq!(resolve_ownership(&mut graph, item), 1);

        let order_id = graph.attribute(graph.attribute_by_name(item, "orderId").unwrap());
        assert_eq!(order_id.owning_relationship(), Some(parent));
        assert_eq!(order_id.owning_relationship_name(), Some("order"));
        assert_eq!(order_id.reverse_relationship(), None);
    }

    #[test]
    fn test_reclaim_drops_previous_reverse_binding() {
        let (mut graph, order, item) = order_and_item();
        let items = relationship(
            &mut graph,
            order,
            item,
            RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            )
            .with_reverse_name("purchase"),
        );
        resolve_ownership(&mut graph, order);
        let order_id = graph.attribute_by_name(item, "orderId").unwrap();
        assert_eq!(graph.attribute(order_id).owning_relationship(), Some(items));
        assert!(graph.attribute(order_id).reverse_relationship().is_some());

        // Shorter name wins; the challenger has no reverse name to record.
        let po = relationship(
            &mut graph,
            item,
            order,
            RelationshipDecl::new("po", "Order", "many-to-one", "this.orderId = Order.id"),
        );
        assert_eq!(resolve_ownership(&mut graph, item), 1);

        let order_id = graph.attribute(order_id);
        assert_eq!(order_id.owning_relationship(), Some(po));
        assert_eq!(order_id.owning_relationship_name(), Some("po"));
        assert_eq!(order_id.reverse_relationship(), None);
    }
}
