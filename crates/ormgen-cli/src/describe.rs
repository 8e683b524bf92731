//! Emitter that renders a plain-text summary of each resolved object.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use ormgen_core::{Emitter, ObjectId, ResolvedGraph, TemplateCache};

const HEADER_TEMPLATE: &str = "{name} [{kind}]{super}";
const ATTRIBUTE_TEMPLATE: &str = "  {name}: {type}{flags}";
const RELATIONSHIP_TEMPLATE: &str = "  {name} -> {related} ({cardinality}){flags}";

fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// Collects one description per object, keyed by fully-qualified name.
#[derive(Debug, Default)]
pub struct DescribeEmitter {
    output: Mutex<BTreeMap<String, String>>,
}

impl DescribeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions in name order.
    pub fn into_output(self) -> BTreeMap<String, String> {
        self.output.into_inner()
    }
}

impl Emitter for DescribeEmitter {
    fn emit(
        &self,
        graph: &ResolvedGraph,
        object: ObjectId,
        cache: &TemplateCache,
    ) -> ormgen_core::Result<()> {
        let header = cache.get_or_load("header", || Ok(HEADER_TEMPLATE.to_string()))?;
        let attribute_line =
            cache.get_or_load("attribute", || Ok(ATTRIBUTE_TEMPLATE.to_string()))?;
        let relationship_line =
            cache.get_or_load("relationship", || Ok(RELATIONSHIP_TEMPLATE.to_string()))?;

        let owner = graph.object(object);
        let name = owner.fully_qualified_name();
        let super_class = graph
            .super_class_of(object)
            .map(|parent| format!(" extends {}", parent.fully_qualified_name()))
            .unwrap_or_default();
        let kind = if owner.is_read_only() { "read-only" } else { "transactional" };

        let mut text = render(
            &header,
            &[("name", name.as_str()), ("kind", kind), ("super", super_class.as_str())],
        );
        for attribute in graph.attributes_of(object) {
            let mut flags = String::new();
            if attribute.is_primary_key() {
                flags.push_str(" pk");
            }
            if attribute.is_as_of() {
                flags.push_str(" as-of");
            }
            if attribute.is_inherited() {
                flags.push_str(" inherited");
            }
            if let Some(owning) = attribute.owning_relationship() {
                flags.push_str(&format!(" owned-by {}", graph.relationship(owning).name));
            }
            let data_type = attribute.data_type().to_string();
            text.push('\n');
            text.push_str(&render(
                &attribute_line,
                &[
                    ("name", attribute.name()),
                    ("type", data_type.as_str()),
                    ("flags", flags.as_str()),
                ],
            ));
        }
        for relationship in graph.relationships_of(object) {
            let related = relationship
                .related
                .map(|r| graph.object(r).fully_qualified_name())
                .unwrap_or_else(|| relationship.related_object_name.clone());
            let cardinality = relationship
                .cardinality
                .map(|c| c.to_string())
                .unwrap_or_default();
            let mut flags = String::new();
            if relationship.is_related_dependent() {
                flags.push_str(" dependent");
            }
            if relationship.is_reverse_relationship {
                flags.push_str(" reverse");
            }
            text.push('\n');
            text.push_str(&render(
                &relationship_line,
                &[
                    ("name", relationship.name.as_str()),
                    ("related", related.as_str()),
                    ("cardinality", cardinality.as_str()),
                    ("flags", flags.as_str()),
                ],
            ));
        }

        self.output.lock().insert(name, text);
        Ok(())
    }
}
