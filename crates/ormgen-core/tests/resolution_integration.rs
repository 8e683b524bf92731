//! Integration tests for metamodel resolution.

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use ormgen_core::metamodel::{
    AsOfAttributeDecl, AttributeDecl, EmbeddedValueDecl, EmbeddedValueObjectDecl, InterfaceDecl,
    ObjectDecl, RelationshipDecl,
};
use ormgen_core::model::ResolutionState;
use ormgen_core::{
    Cardinality, DataType, Error, GeneratorConfig, LogLevel, MemoryLogger, Metamodel, Phase,
    Resolver, ResolvedGraph, Severity,
};

fn resolve(
    metamodel: Metamodel,
) -> (ormgen_core::Result<ResolvedGraph>, ormgen_core::ValidationReport) {
    Resolver::new(metamodel, GeneratorConfig::default(), Arc::new(MemoryLogger::new()))
        .resolve_with_report()
}

fn order() -> ObjectDecl {
    ObjectDecl::new("com.acme", "Order")
        .with_attribute(AttributeDecl::new("id", DataType::Int).primary_key().with_column("ID"))
        .with_attribute(AttributeDecl::new("amount", DataType::Double).with_column("AMOUNT"))
}

fn order_item() -> ObjectDecl {
    ObjectDecl::new("com.acme", "OrderItem")
        .with_attribute(AttributeDecl::new("id", DataType::Int).primary_key().with_column("ID"))
        .with_attribute(AttributeDecl::new("orderId", DataType::Int).with_column("ORDER_ID"))
}

fn attribute_names(graph: &ResolvedGraph, name: &str) -> BTreeSet<String> {
    let object = graph.object_by_name(name).unwrap();
    graph
        .attributes_of(object.id())
        .map(|a| a.name().to_string())
        .collect()
}

#[test]
fn test_subclass_sees_parent_members() {
    let metamodel = Metamodel::new().with_object(order()).with_object(
        ObjectDecl::new("com.acme", "SpecialOrder")
            .with_super_class("Order")
            .with_attribute(
                AttributeDecl::new("discount", DataType::Double).with_column("DISCOUNT"),
            ),
    );

    let (result, report) = resolve(metamodel);
    let graph = result.unwrap();

    assert_eq!(report.error_count(), 0);
    assert_eq!(
        attribute_names(&graph, "SpecialOrder"),
        ["amount", "discount", "id"].iter().map(|s| s.to_string()).collect()
    );
    let special = graph.object_by_name("com.acme.SpecialOrder").unwrap();
    let id = graph.attributes_of(special.id()).find(|a| a.name() == "id").unwrap();
    assert!(id.is_primary_key());
    assert!(id.is_inherited());
    assert_eq!(
        graph.super_class_of(special.id()).map(|s| s.fully_qualified_name()),
        Some("com.acme.Order".to_string())
    );
}

#[test]
fn test_superclass_cycle_fails_generation() {
    let metamodel = Metamodel::new()
        .with_object(ObjectDecl::new("com.acme", "A").with_super_class("B"))
        .with_object(ObjectDecl::new("com.acme", "B").with_super_class("A"));

    let (result, report) = resolve(metamodel);

    let cycle: Vec<_> = report
        .errors()
        .filter(|issue| issue.phase == Phase::Inheritance)
        .collect();
    assert_eq!(cycle.len(), 1);
    assert_eq!(cycle[0].message, "cyclic superclass chain com.acme.A -> com.acme.B -> com.acme.A");
    match result {
        Err(Error::GenerationFailed { error_count, report }) => {
            assert_eq!(error_count, 1);
            assert!(report.contains("cyclic superclass chain"));
        }
        other => panic!("expected generation failure, got {:?}", other.map(|g| g.object_count())),
    }
}

#[test]
fn test_dependent_relationship_owns_foreign_key_regardless_of_order() {
    let lines = RelationshipDecl::new(
        "lines",
        "OrderItem",
        "one-to-many",
        "this.id = OrderItem.orderId",
    )
    .related_is_dependent();
    let po = RelationshipDecl::new("po", "Order", "many-to-one", "this.orderId = Order.id");

    // Declaration order only affects arena order; both layouts must agree.
    let layouts = [
        Metamodel::new()
            .with_object(order().with_relationship(lines.clone()))
            .with_object(order_item().with_relationship(po.clone())),
        Metamodel::new()
            .with_object(order_item().with_relationship(po))
            .with_object(order().with_relationship(lines)),
    ];

    for metamodel in layouts {
        let (result, report) = resolve(metamodel);
        let graph = result.unwrap();
        assert_eq!(report.error_count(), 0);

        let item = graph.object_by_name("OrderItem").unwrap();
        let order_id = graph
            .attributes_of(item.id())
            .find(|a| a.name() == "orderId")
            .unwrap();
        let owner = graph.relationship(order_id.owning_relationship().unwrap());
        assert_eq!(owner.name, "lines");
        assert!(owner.is_related_dependent());
        assert_eq!(order_id.reverse_relationship().unwrap().name, "lines");
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let build = || {
        Metamodel::new()
            .with_object(order().with_relationship(
                RelationshipDecl::new(
                    "items",
                    "OrderItem",
                    "one-to-many",
                    "this.id = OrderItem.orderId",
                )
                .with_reverse_name("order"),
            ))
            .with_object(order_item())
            .with_object(ObjectDecl::new("com.acme", "SpecialOrder").with_super_class("Order"))
    };

    let first = resolve(build()).0.unwrap();
    let second = resolve(build()).0.unwrap();

    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    assert_eq!(first.object_count(), second.object_count());
    assert_eq!(first.relationship_count(), second.relationship_count());

    let item = first.object_by_name("OrderItem").unwrap();
    let reverse = first.relationships_of(item.id()).find(|r| r.name == "order").unwrap();
    assert!(reverse.is_reverse_relationship);
    assert_eq!(reverse.cardinality, Some(Cardinality::ManyToOne));
}

#[test]
fn test_as_of_settings_come_from_superclass() {
    let metamodel = Metamodel::new()
        .with_object(
            order().with_as_of_attribute(
                AsOfAttributeDecl::new("businessDate")
                    .with_columns("FROM_Z", "THRU_Z")
                    .with_infinity_date("[com.acme.Infinity.get()]"),
            ),
        )
        .with_object(
            ObjectDecl::new("com.acme", "SpecialOrder")
                .with_super_class("Order")
                .with_as_of_attribute(AsOfAttributeDecl::new("businessDate")),
        );

    let (result, report) = resolve(metamodel);
    let graph = result.unwrap();

    assert_eq!(report.error_count(), 0);
    let special = graph.object_by_name("SpecialOrder").unwrap();
    let business_date = graph
        .attributes_of(special.id())
        .find(|a| a.name() == "businessDate")
        .unwrap();
    assert!(!business_date.is_inherited());
    assert_eq!(business_date.infinity_expression().as_deref(), Some("com.acme.Infinity.get()"));
    assert_eq!(business_date.as_of_columns(), Some((Some("FROM_Z"), Some("THRU_Z"))));
}

#[test]
fn test_unknown_cardinality_is_reported_against_relationship() {
    let metamodel = Metamodel::new()
        .with_object(order().with_relationship(RelationshipDecl::new(
            "items",
            "OrderItem",
            "few-to-some",
            "this.id = OrderItem.orderId",
        )))
        .with_object(order_item());

    let (result, report) = resolve(metamodel);

    assert!(result.is_err());
    let issue = report.errors().next().unwrap();
    assert_eq!(issue.phase, Phase::Relationships);
    assert_eq!(issue.object, "com.acme.Order");
    assert_eq!(issue.member.as_deref(), Some("items"));
    assert!(issue.message.contains("unknown cardinality 'few-to-some'"));
}

#[test]
fn test_embedded_value_becomes_mapped_columns() {
    let metamodel = Metamodel::new()
        .with_embedded_value_object(
            EmbeddedValueObjectDecl::new("com.acme", "Address")
                .with_attribute("street", DataType::String)
                .with_attribute("city", DataType::String),
        )
        .with_object(order().with_embedded_value(
            EmbeddedValueDecl::new("billing", "Address")
                .with_mapping("street", "BILL_STREET")
                .with_mapping("city", "BILL_CITY"),
        ));

    let (result, _) = resolve(metamodel);
    let graph = result.unwrap();

    let order = graph.object_by_name("Order").unwrap();
    let mapped: Vec<(&str, Option<&str>)> = graph
        .attributes_of(order.id())
        .filter(|a| a.is_mapped())
        .map(|a| (a.name(), a.column_name()))
        .collect();
    assert_eq!(
        mapped,
        vec![("billingStreet", Some("BILL_STREET")), ("billingCity", Some("BILL_CITY"))]
    );
}

#[test]
fn test_interface_cycle_stops_at_first_entry_point() {
    let metamodel = Metamodel::new()
        .with_interface(InterfaceDecl::new("com.acme", "Priced").with_super_interface("Valued"))
        .with_interface(InterfaceDecl::new("com.acme", "Valued").with_super_interface("Priced"))
        .with_object(order());
    let logger = Arc::new(MemoryLogger::new());
    let mut resolver = Resolver::new(metamodel, GeneratorConfig::default(), logger.clone());

    assert!(!resolver.extract_interface_relationships_and_super_interfaces());

    let report = resolver.report();
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.issues[0].phase, Phase::Interfaces);
    assert_eq!(logger.messages(LogLevel::Error).len(), 1);
}

#[test]
fn test_failed_object_does_not_hide_healthy_ones() {
    let metamodel = Metamodel::new()
        .with_object(order())
        .with_object(ObjectDecl::new("com.acme", "Orphan").with_super_class("Missing"));
    let mut resolver = Resolver::new(
        metamodel,
        GeneratorConfig::default(),
        Arc::new(MemoryLogger::new()),
    );

    assert!(resolver.extract_interface_relationships_and_super_interfaces());
    assert!(resolver.validate_embedded_value_objects());
    assert!(!resolver.validate_objects());

    let graph = resolver.graph();
    let orphan = graph.lookup("com.acme.Orphan", ormgen_core::ObjectKind::Plain).unwrap();
    let order = graph.lookup("com.acme.Order", ormgen_core::ObjectKind::Plain).unwrap();
    assert_eq!(graph.object(orphan).state(), ResolutionState::Failed);
    assert_eq!(graph.object(order).state(), ResolutionState::Resolved);
    assert_eq!(resolver.report().issues[0].message, "SuperClass name 'Missing' not defined");
}

#[test]
fn test_warnings_as_errors_fail_generation() {
    let metamodel = Metamodel::new()
        .with_object(order().with_relationship(
            RelationshipDecl::new(
                "tags",
                "OrderItem",
                "many-to-many",
                "this.id = OrderItem.orderId",
            )
            .related_is_dependent(),
        ))
        .with_object(order_item());

    let (lenient, report) = resolve(metamodel.clone());
    assert!(lenient.is_ok());
    assert_eq!(report.warnings().count(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);

    let strict = Resolver::new(
        metamodel,
        GeneratorConfig::default().with_warnings_as_errors(true),
        Arc::new(MemoryLogger::new()),
    )
    .resolve();
    assert!(matches!(strict, Err(Error::GenerationFailed { error_count: 1, .. })));
}

#[test]
fn test_metamodel_loaded_from_json_file() {
    let json = Metamodel::new()
        .with_object(order())
        .with_object(order_item())
        .to_json()
        .unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let metamodel = Metamodel::from_json(&text).unwrap();
    assert_eq!(metamodel.len(), 2);

    let (result, report) = resolve(metamodel);
    assert!(report.issues.is_empty());
    assert_eq!(result.unwrap().object_count(), 2);
}
