//! Metamodel resolution.
//!
//! [`Resolver`] wraps the parsed declarations into an object arena and runs
//! three ordered entry points over it:
//!
//! 1. [`Resolver::extract_interface_relationships_and_super_interfaces`]
//! 2. [`Resolver::validate_embedded_value_objects`]
//! 3. [`Resolver::validate_objects`]
//!
//! Each returns `true` when it added no error. [`Resolver::resolve`] runs all
//! three and freezes the arena into a [`ResolvedGraph`] on success.

mod embedded;
mod inheritance;
mod interfaces;
mod ownership;
mod relationships;
pub mod report;

pub use report::{Issue, IssueKind, Phase, Severity, ValidationReport, ValidationReporter};

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::metamodel::{AttributeDecl, EnumerationDecl, Metamodel};
use crate::model::{
    Attribute, AttributeKind, DataType, EnumerationMapping, EnumerationSettings, MetamodelGraph,
    NestedObject, ObjectDefaults, ObjectId, ObjectKind, ObjectType, Relationship,
    ResolutionState, ResolvedGraph,
};

/// Drives resolution of one metamodel.
pub struct Resolver {
    metamodel: Metamodel,
    config: GeneratorConfig,
    logger: Arc<dyn Logger>,
    graph: MetamodelGraph,
    reporter: ValidationReporter,
    /// Persistent objects with the key of their declaration.
    declared: Vec<(ObjectId, String)>,
}

impl Resolver {
    /// Wrap every declaration of `metamodel` into the object arena.
    pub fn new(metamodel: Metamodel, config: GeneratorConfig, logger: Arc<dyn Logger>) -> Self {
        let reporter = ValidationReporter::new(Arc::clone(&logger))
            .with_warnings_as_errors(config.warnings_as_errors);
        let mut resolver = Self {
            metamodel,
            config,
            logger,
            graph: MetamodelGraph::new(),
            reporter,
            declared: Vec::new(),
        };
        resolver.wrap_enumerations();
        resolver.wrap_embedded_value_objects();
        resolver.wrap_objects();
        tracing::debug!(
            objects = resolver.declared.len(),
            total = resolver.graph.object_count(),
            "metamodel wrapped"
        );
        resolver
    }

    fn duplicate(&mut self, name: &str) {
        self.reporter.error(
            Phase::Names,
            IssueKind::Schema,
            name,
            None,
            format!("duplicate type name '{}'", name),
        );
    }

    fn wrap_enumerations(&mut self) {
        let mut duplicates = Vec::new();
        for (key, decl) in &self.metamodel.enumerations {
            let added = self.graph.add_object(|id| {
                let mut object = ObjectType::new(
                    id,
                    &decl.package,
                    &decl.class_name,
                    ObjectKind::Enumeration,
                    ObjectDefaults::default(),
                );
                object.persisted_type = Some(decl.persisted_type);
                object.members = decl
                    .members
                    .iter()
                    .map(|m| EnumerationMapping {
                        member: m.name.clone(),
                        persisted_value: m.persisted_value.clone(),
                    })
                    .collect();
                object
            });
            if added.is_none() {
                duplicates.push(key.clone());
            }
        }
        for key in duplicates {
            self.duplicate(&key);
        }
    }

    fn wrap_embedded_value_objects(&mut self) {
        let mut duplicates = Vec::new();
        for (key, decl) in &self.metamodel.embedded_value_objects {
            let added = self.graph.add_object(|id| {
                let mut object = ObjectType::new(
                    id,
                    &decl.package,
                    &decl.class_name,
                    ObjectKind::EmbeddedValue,
                    ObjectDefaults::default(),
                );
                object.nested_objects = decl
                    .nested
                    .iter()
                    .map(|n| NestedObject {
                        name: n.name.clone(),
                        type_name: n.type_name.clone(),
                        target: None,
                    })
                    .collect();
                object
            });
            let Some(id) = added else {
                duplicates.push(key.clone());
                continue;
            };
            for attribute in &decl.attributes {
                let mut column = AttributeDecl::new(&attribute.name, attribute.data_type);
                column.nullable = attribute.nullable;
                column.max_length = attribute.max_length;
                let attribute = Attribute::plain(&column, self.graph.object(id));
                self.graph.add_attribute(attribute);
            }
        }
        for key in duplicates {
            self.duplicate(&key);
        }
    }

    fn wrap_objects(&mut self) {
        let mut duplicates = Vec::new();
        for (key, decl) in &self.metamodel.objects {
            let defaults = ObjectDefaults {
                final_getters: decl
                    .default_final_getters
                    .unwrap_or(self.config.default_final_getters),
                timezone_conversion: self.config.default_timezone_conversion,
            };
            let added = self.graph.add_object(|id| {
                let mut object = ObjectType::new(
                    id,
                    &decl.package,
                    &decl.class_name,
                    ObjectKind::Plain,
                    defaults,
                );
                object.object_type = decl.object_type;
                object.imported = decl.imported;
                object.super_class_name = decl.super_class.clone();
                object.interfaces = decl.interfaces.clone();
                object
            });
            let Some(id) = added else {
                duplicates.push(key.clone());
                continue;
            };

            for attribute in &decl.attributes {
                let attribute = Attribute::plain(attribute, self.graph.object(id));
                self.graph.add_attribute(attribute);
            }
            for attribute in &decl.as_of_attributes {
                let attribute = Attribute::as_of(attribute, self.graph.object(id));
                self.graph.add_attribute(attribute);
            }
            for attribute in &decl.enumeration_attributes {
                // Unknown enumerations are reported when enumeration attributes are resolved.
                let persisted_type = self
                    .graph
                    .lookup(&attribute.enumeration, ObjectKind::Enumeration)
                    .and_then(|e| self.graph.object(e).persisted_type)
                    .unwrap_or(DataType::Int);
                let attribute = Attribute::enumeration(
                    attribute,
                    self.graph.object(id),
                    persisted_type,
                    EnumerationSettings::from_decl(attribute),
                );
                self.graph.add_attribute(attribute);
            }
            if let Some(source) = &decl.source_attribute {
                let attribute =
                    Attribute::source(&source.name, source.data_type, self.graph.object(id));
                let attribute = self.graph.add_attribute(attribute);
                self.graph.object_mut(id).source_attribute = Some(attribute);
            }
            for relationship in &decl.relationships {
                self.graph.add_relationship(Relationship::from_decl(relationship, id));
            }
            self.declared.push((id, key.clone()));
        }
        for key in duplicates {
            self.duplicate(&key);
        }
    }

    /// Resolve super-interfaces and interface relationships.
    pub fn extract_interface_relationships_and_super_interfaces(&mut self) -> bool {
        let before = self.reporter.error_count();
        interfaces::resolve_interfaces(&self.metamodel, &mut self.graph, &mut self.reporter);
        let ok = self.reporter.error_count() == before;
        tracing::debug!(interfaces = self.metamodel.interfaces.len(), ok, "interfaces resolved");
        ok
    }

    /// Resolve nesting between embedded value objects.
    pub fn validate_embedded_value_objects(&mut self) -> bool {
        let before = self.reporter.error_count();
        embedded::validate_embedded_value_objects(&mut self.graph, &mut self.reporter);
        let ok = self.reporter.error_count() == before;
        tracing::debug!(
            embedded_value_objects = self.metamodel.embedded_value_objects.len(),
            ok,
            "embedded value objects validated"
        );
        ok
    }

    /// Validate persistent objects: names, attributes, inheritance,
    /// relationships, ownership and interface conformance.
    pub fn validate_objects(&mut self) -> bool {
        let before = self.reporter.error_count();

        self.check_enumerations();
        self.check_related_objects();
        self.resolve_enumeration_attributes();
        self.expand_embedded_values();
        inheritance::resolve_inheritance(&mut self.graph, &mut self.reporter);
        self.validate_attributes();
        relationships::resolve_relationships(&mut self.graph, &mut self.reporter);

        let mut claims = 0;
        for (id, _) in &self.declared {
            claims += ownership::resolve_ownership(&mut self.graph, *id);
        }
        tracing::debug!(claims, "attribute ownership resolved");

        for (id, _) in &self.declared {
            interfaces::check_conformance(&self.metamodel, &self.graph, *id, &mut self.reporter);
        }
        self.post_validate();

        let errors = self.reporter.error_count() - before;
        if errors == 0 {
            self.logger
                .info(&format!("validated {} object(s)", self.declared.len()));
        }
        errors == 0
    }

    fn check_enumerations(&mut self) {
        for (key, decl) in &self.metamodel.enumerations {
            for message in enumeration_errors(decl) {
                self.reporter
                    .error(Phase::Names, IssueKind::Schema, key, None, message);
            }
        }
    }

    fn check_related_objects(&mut self) {
        for (object, key) in &self.declared {
            for id in self.graph.object(*object).relationships.clone() {
                let relationship = self.graph.relationship(id);
                match self
                    .graph
                    .lookup(&relationship.related_object_name, ObjectKind::Plain)
                {
                    Some(related) => self.graph.relationship_mut(id).related = Some(related),
                    None => {
                        let message = format!(
                            "related object '{}' of relationship '{}' is not defined",
                            relationship.related_object_name, relationship.name
                        );
                        let name = relationship.name.clone();
                        self.reporter
                            .error(Phase::Names, IssueKind::Schema, key, Some(&name), message);
                    }
                }
            }
        }
    }

    fn resolve_enumeration_attributes(&mut self) {
        for (object, _) in &self.declared {
            for id in self.graph.object(*object).attributes.clone() {
                let name = match self.graph.attribute(id).kind() {
                    AttributeKind::Enumeration(settings) => settings.enumeration.clone(),
                    _ => continue,
                };
                let Some(enumeration) = self.graph.lookup(&name, ObjectKind::Enumeration) else {
                    continue;
                };
                let target = self.graph.object(enumeration);
                let class_name = target.class_name.clone();
                let members = target.members.clone();
                if let Some(settings) = self.graph.attribute_mut(id).enumeration_settings_mut() {
                    settings.enumeration_id = Some(enumeration);
                    settings.enumeration_class = Some(class_name);
                    settings.mappings = members;
                }
            }
        }
    }

    fn expand_embedded_values(&mut self) {
        for (object, key) in &self.declared {
            let Some(decl) = self.metamodel.objects.get(key) else {
                continue;
            };
            if decl.embedded_values.is_empty() {
                continue;
            }
            embedded::expand_embedded_values(
                &mut self.graph,
                *object,
                &decl.embedded_values,
                &mut self.reporter,
            );
        }
    }

    fn validate_attributes(&mut self) {
        for (object, key) in &self.declared {
            if self.graph.object(*object).state() == ResolutionState::Failed {
                continue;
            }
            for id in &self.graph.object(*object).attributes {
                let attribute = self.graph.attribute(*id);
                if attribute.is_inherited() {
                    continue;
                }
                self.reporter.process_errors(
                    Phase::Attributes,
                    IssueKind::Schema,
                    key,
                    Some(attribute.name()),
                    attribute.validate(),
                );
            }
        }
    }

    fn post_validate(&mut self) {
        for (object, key) in &self.declared {
            let owner = self.graph.object(*object);
            if owner.state() == ResolutionState::Failed {
                continue;
            }

            let mut names = BTreeSet::new();
            let members = owner
                .attributes
                .iter()
                .map(|a| self.graph.attribute(*a).name())
                .chain(
                    owner
                        .relationships
                        .iter()
                        .map(|r| self.graph.relationship(*r).name.as_str()),
                );
            for name in members {
                if !names.insert(name) {
                    self.reporter.error(
                        Phase::PostValidation,
                        IssueKind::Consistency,
                        key,
                        Some(name),
                        format!("duplicate member name '{}'", name),
                    );
                }
            }

            let processing_dates = owner
                .attributes
                .iter()
                .map(|a| self.graph.attribute(*a))
                .filter(|a| a.is_as_of() && a.is_processing_date())
                .count();
            if processing_dates > 1 {
                self.reporter.error(
                    Phase::PostValidation,
                    IssueKind::Consistency,
                    key,
                    None,
                    format!(
                        "only one processing date as-of attribute is allowed, found {}",
                        processing_dates
                    ),
                );
            }

            for id in &owner.relationships {
                let relationship = self.graph.relationship(*id);
                let Some(forward) = relationship.reverse_of else {
                    continue;
                };
                let expected = self.graph.relationship(forward).cardinality.map(|c| c.reverse());
                if relationship.cardinality != expected {
                    self.reporter.error(
                        Phase::PostValidation,
                        IssueKind::Consistency,
                        key,
                        Some(&relationship.name),
                        format!(
                            "reverse relationship '{}' does not invert the cardinality of '{}'",
                            relationship.name,
                            self.graph.relationship(forward).name
                        ),
                    );
                }
            }
        }
    }

    /// Issues collected so far.
    pub fn report(&self) -> &ValidationReport {
        self.reporter.report()
    }

    /// The arena as resolved so far.
    pub fn graph(&self) -> &MetamodelGraph {
        &self.graph
    }

    /// Run all three entry points and freeze the graph.
    pub fn resolve(self) -> Result<ResolvedGraph> {
        self.resolve_with_report().0
    }

    /// Like [`Resolver::resolve`], also returning every collected issue,
    /// warnings included.
    pub fn resolve_with_report(mut self) -> (Result<ResolvedGraph>, ValidationReport) {
        let interfaces = self.extract_interface_relationships_and_super_interfaces();
        let embedded = self.validate_embedded_value_objects();
        let objects = self.validate_objects();
        let success = interfaces && embedded && objects && !self.reporter.has_errors();

        let report = self.reporter.into_report();
        if success {
            tracing::info!(
                objects = self.graph.object_count(),
                warnings = report.warnings().count(),
                "metamodel resolved"
            );
            (Ok(ResolvedGraph::freeze(self.graph)), report)
        } else {
            let error = Error::GenerationFailed {
                error_count: report.error_count(),
                report: report.to_string(),
            };
            (Err(error), report)
        }
    }
}

fn enumeration_errors(decl: &EnumerationDecl) -> Vec<String> {
    let mut errors = Vec::new();
    if !matches!(decl.persisted_type, DataType::Int | DataType::String) {
        errors.push(format!(
            "enumeration persisted type must be int or String, not {}",
            decl.persisted_type
        ));
    }
    let mut names = BTreeSet::new();
    let mut values = BTreeSet::new();
    for member in &decl.members {
        if !names.insert(member.name.as_str()) {
            errors.push(format!("duplicate enumeration member '{}'", member.name));
        }
        if !values.insert(member.persisted_value.trim()) {
            errors.push(format!(
                "duplicate persisted value '{}' for member '{}'",
                member.persisted_value, member.name
            ));
        }
        if !decl.persisted_type.accepts_literal(&member.persisted_value) {
            errors.push(format!(
                "persisted value '{}' of member '{}' is not a valid {}",
                member.persisted_value, member.name, decl.persisted_type
            ));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::metamodel::{
        AsOfAttributeDecl, EmbeddedValueDecl, EmbeddedValueObjectDecl, EnumerationAttributeDecl,
        InterfaceDecl, ObjectDecl, RelationshipDecl, SimulatedSequenceDecl, SourceAttributeDecl,
    };
    use crate::model::Cardinality;

    fn resolver(metamodel: Metamodel) -> Resolver {
        Resolver::new(metamodel, GeneratorConfig::default(), Arc::new(MemoryLogger::new()))
    }

    fn order() -> ObjectDecl {
        ObjectDecl::new("com.acme", "Order")
            .with_attribute(AttributeDecl::new("id", DataType::Int).primary_key())
            .with_attribute(AttributeDecl::new("amount", DataType::Double))
    }

    #[test]
    fn test_entry_points_succeed_on_clean_metamodel() {
        let metamodel = Metamodel::new()
            .with_object(order())
            .with_object(ObjectDecl::new("com.acme", "SpecialOrder").with_super_class("Order"));
        let mut resolver = resolver(metamodel);

        assert!(resolver.extract_interface_relationships_and_super_interfaces());
        assert!(resolver.validate_embedded_value_objects());
        assert!(resolver.validate_objects());
        assert!(resolver.report().issues.is_empty());
    }

    #[test]
    fn test_default_final_getters_override() {
        let metamodel = Metamodel::new()
            .with_object(order())
            .with_object(ObjectDecl::new("com.acme", "Trade").with_default_final_getters(true));
        let config = GeneratorConfig::default().with_default_final_getters(false);
        let resolver = Resolver::new(metamodel, config, Arc::new(MemoryLogger::new()));
        let graph = resolver.resolve().unwrap();

        assert!(!graph.object_by_name("Order").unwrap().is_default_final_getters());
        assert!(graph.object_by_name("Trade").unwrap().is_default_final_getters());
    }

    #[test]
    fn test_enumeration_attribute_resolution() {
        let metamodel = Metamodel::new()
            .with_enumeration(
                EnumerationDecl::new("com.acme", "Status", DataType::String)
                    .with_member("OPEN", "O")
                    .with_member("CLOSED", "C"),
            )
            .with_object(order().with_enumeration_attribute(
                EnumerationAttributeDecl::new("status", "Status").with_column("STATUS"),
            ));
        let graph = resolver(metamodel).resolve().unwrap();

        let order = graph.object_by_name("com.acme.Order").unwrap();
        let status = graph
            .attributes_of(order.id())
            .find(|a| a.name() == "status")
            .unwrap();
        assert_eq!(status.data_type(), DataType::String);
        assert_eq!(status.enumeration_mappings().len(), 2);
        assert_eq!(status.enumeration_mappings()[1].persisted_value, "C");
    }

    #[test]
    fn test_enumeration_attribute_unsupported_capability() {
        let mut attribute = EnumerationAttributeDecl::new("status", "Status");
        attribute.simulated_sequence = Some(SimulatedSequenceDecl::new("SEQ"));
        let metamodel = Metamodel::new()
            .with_enumeration(
                EnumerationDecl::new("com.acme", "Status", DataType::Int).with_member("OPEN", "1"),
            )
            .with_object(order().with_enumeration_attribute(attribute));

        let (result, report) = resolver(metamodel).resolve_with_report();

        assert!(matches!(result, Err(Error::GenerationFailed { error_count: 1, .. })));
        assert_eq!(
            report.issues[0].message,
            "attribute 'status' does not support a simulated sequence"
        );
    }

    #[test]
    fn test_bad_enumeration_declarations() {
        let metamodel = Metamodel::new().with_enumeration(
            EnumerationDecl::new("com.acme", "Level", DataType::Int)
                .with_member("LOW", "1")
                .with_member("LOW", "x"),
        );
        let (result, report) = resolver(metamodel).resolve_with_report();

        assert!(result.is_err());
        assert_eq!(report.error_count(), 2);
        let invalid = "persisted value 'x' of member 'LOW' is not a valid int";
        assert!(report.issues.iter().any(|issue| issue.message == invalid));
    }

    #[test]
    fn test_unknown_related_object() {
        let metamodel = Metamodel::new().with_object(order().with_relationship(
            RelationshipDecl::new("items", "Missing", "one-to-many", "this.id = Missing.orderId"),
        ));
        let (result, report) = resolver(metamodel).resolve_with_report();

        assert!(result.is_err());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].phase, Phase::Names);
    }

    #[test]
    fn test_duplicate_member_names() {
        let metamodel = Metamodel::new().with_object(
            order().with_attribute(AttributeDecl::new("amount", DataType::Double)),
        );
        let (_, report) = resolver(metamodel).resolve_with_report();

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].phase, Phase::PostValidation);
    }

    #[test]
    fn test_single_processing_date() {
        let metamodel = Metamodel::new().with_object(
            order()
                .with_as_of_attribute(
                    AsOfAttributeDecl::new("processingDate")
                        .with_columns("IN_Z", "OUT_Z")
                        .processing_date(),
                )
                .with_as_of_attribute(
                    AsOfAttributeDecl::new("auditDate")
                        .with_columns("A_IN", "A_OUT")
                        .processing_date(),
                ),
        );
        let (_, report) = resolver(metamodel).resolve_with_report();

        assert_eq!(report.error_count(), 1);
        assert!(report.issues[0].message.contains("processing date"));
    }

    #[test]
    fn test_source_attribute_type() {
        let metamodel = Metamodel::new().with_object(
            order().with_source_attribute(SourceAttributeDecl::new("region", DataType::Double)),
        );
        let (_, report) = resolver(metamodel).resolve_with_report();

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].phase, Phase::Attributes);
    }

    #[test]
    fn test_interface_conformance() {
        let metamodel = Metamodel::new()
            .with_interface(
                InterfaceDecl::new("com.acme", "Priced")
                    .with_attribute("amount", DataType::Double)
                    .with_attribute("currency", DataType::String),
            )
            .with_object(order().with_interface("Priced"));
        let (_, report) = resolver(metamodel).resolve_with_report();

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].phase, Phase::InterfaceConformance);
        assert_eq!(report.issues[0].member.as_deref(), Some("currency"));
    }

    #[test]
    fn test_embedded_value_expansion() {
        let metamodel = Metamodel::new()
            .with_embedded_value_object(
                EmbeddedValueObjectDecl::new("com.acme", "Address")
                    .with_attribute("street", DataType::String)
                    .with_attribute("city", DataType::String),
            )
            .with_object(order().with_embedded_value(
                EmbeddedValueDecl::new("shipping", "Address")
                    .with_mapping("street", "SHIP_STREET")
                    .with_mapping("city", "SHIP_CITY"),
            ));
        let graph = resolver(metamodel).resolve().unwrap();

        let order = graph.object_by_name("Order").unwrap();
        let names: Vec<&str> = graph.attributes_of(order.id()).map(|a| a.name()).collect();
        assert_eq!(names, vec!["id", "amount", "shippingStreet", "shippingCity"]);
        assert!(graph.attributes_of(order.id()).any(|a| a.is_mapped()));
    }

    #[test]
    fn test_reverse_cardinality_invariant() {
        let metamodel = Metamodel::new()
            .with_object(order().with_relationship(
                RelationshipDecl::new(
                    "items",
                    "OrderItem",
                    "one-to-many",
                    "this.id = OrderItem.orderId",
                )
                .with_reverse_name("order"),
            ))
            .with_object(
                ObjectDecl::new("com.acme", "OrderItem")
                    .with_attribute(AttributeDecl::new("id", DataType::Int).primary_key())
                    .with_attribute(AttributeDecl::new("orderId", DataType::Int)),
            );
        let graph = resolver(metamodel).resolve().unwrap();

        let item = graph.object_by_name("OrderItem").unwrap();
        let reverse = graph.relationships_of(item.id()).find(|r| r.name == "order").unwrap();
        assert_eq!(reverse.cardinality, Some(Cardinality::ManyToOne));
        assert!(reverse.is_reverse_relationship);
    }
}
