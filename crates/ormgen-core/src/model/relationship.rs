//! Relationship definitions between object types.

use serde::Serialize;

use super::cardinality::Cardinality;
use super::graph::{ObjectId, RelationshipId};
use crate::metamodel::RelationshipDecl;

/// Equality between an attribute of the owner and one of the related object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPair {
    /// Attribute on the owning (`this`) side.
    pub this_attribute: String,
    /// Attribute on the related side.
    pub related_attribute: String,
}

/// Analysed relationship query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinQuery {
    /// Attribute equalities joining both sides, in query order.
    pub pairs: Vec<JoinPair>,
    /// Conjuncts that are not plain joins.
    pub filters: Vec<String>,
    /// Some conjunct references `this`.
    pub references_this: bool,
    /// Some conjunct references the related object.
    pub references_related: bool,
    /// Classes other than `this` and the related object.
    pub other_classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    This(String),
    Class(String, String),
    Literal,
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn parse_term(text: &str) -> Term {
    let text = text.trim();
    if let Some((class, attribute)) = text.split_once('.') {
        if is_identifier(class) && is_identifier(attribute) {
            return if class == "this" {
                Term::This(attribute.to_string())
            } else {
                Term::Class(class.to_string(), attribute.to_string())
            };
        }
    }
    Term::Literal
}

fn strip_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoted = false;
    for c in text.chars() {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted {
            out.push(c);
        }
    }
    out
}

fn strip_parens(text: &str) -> &str {
    let mut text = text.trim();
    while text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn split_conjuncts(query: &str) -> Vec<String> {
    let mut conjuncts = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut quoted = false;
    for word in query.split_whitespace() {
        if !quoted && word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                conjuncts.push(current.join(" "));
                current.clear();
            }
        } else {
            if word.matches('\'').count() % 2 == 1 {
                quoted = !quoted;
            }
            current.push(word);
        }
    }
    if !current.is_empty() {
        conjuncts.push(current.join(" "));
    }
    conjuncts
}

fn references(conjunct: &str) -> Vec<Term> {
    strip_quoted(conjunct)
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .map(parse_term)
        .filter(|term| *term != Term::Literal)
        .collect()
}

fn as_equality(conjunct: &str) -> Option<(Term, Term)> {
    let conjunct = strip_parens(conjunct);
    let position = conjunct.find(['=', '!', '<', '>'])?;
    let rest = &conjunct[position..];
    if !rest.starts_with('=') || rest.starts_with("==") {
        return None;
    }
    let lhs = parse_term(&conjunct[..position]);
    let rhs = parse_term(&conjunct[position + 1..]);
    Some((lhs, rhs))
}

impl JoinQuery {
    /// Analyse a query such as `this.id = OrderItem.orderId and OrderItem.status = 1`.
    ///
    /// `related_class` is the simple class name of the related object.
    pub fn parse(query: &str, related_class: &str) -> Self {
        let mut join = JoinQuery::default();
        for conjunct in split_conjuncts(query) {
            for term in references(&conjunct) {
                match term {
                    Term::This(_) => join.references_this = true,
                    Term::Class(class, _) if class == related_class => {
                        join.references_related = true
                    }
                    Term::Class(class, _) => {
                        if !join.other_classes.contains(&class) {
                            join.other_classes.push(class);
                        }
                    }
                    Term::Literal => {}
                }
            }

            match as_equality(&conjunct) {
                Some((Term::This(this_attribute), Term::Class(class, related_attribute)))
                | Some((Term::Class(class, related_attribute), Term::This(this_attribute)))
                    if class == related_class =>
                {
                    join.pairs.push(JoinPair {
                        this_attribute,
                        related_attribute,
                    });
                }
                _ => join.filters.push(conjunct),
            }
        }
        join
    }

    /// The same join seen from the related object.
    pub fn reversed(&self) -> Self {
        Self {
            pairs: self
                .pairs
                .iter()
                .map(|pair| JoinPair {
                    this_attribute: pair.related_attribute.clone(),
                    related_attribute: pair.this_attribute.clone(),
                })
                .collect(),
            filters: self.filters.clone(),
            references_this: self.references_related,
            references_related: self.references_this,
            other_classes: self.other_classes.clone(),
        }
    }
}

/// A relationship from an owner object to a related object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    /// Relationship name (unique among the owner's members).
    pub name: String,
    /// Object declaring the relationship.
    pub owner: ObjectId,
    /// Object the relationship was first declared on, when inherited.
    pub original_owner: Option<ObjectId>,
    /// Related object name as declared.
    pub related_object_name: String,
    /// Resolved related object.
    pub related: Option<ObjectId>,
    /// Cardinality key as declared.
    pub cardinality_key: Option<String>,
    /// Parsed cardinality.
    pub cardinality: Option<Cardinality>,
    /// Query text.
    pub query: Option<String>,
    /// Analysed query.
    pub join: JoinQuery,
    /// Name of the relationship seen from the related object.
    pub reverse_name: Option<String>,
    /// Declared related-dependent flag; cleared when it cannot hold.
    pub related_is_dependent: Option<bool>,
    /// Ordering of to-many results.
    pub order_by: Option<String>,
    /// Parameters of a parameterized relationship.
    pub parameters: Option<String>,
    /// Synthesized as the reverse of another relationship.
    pub is_reverse_relationship: bool,
    /// Reverse of a related-dependent relationship.
    pub has_parent_container: bool,
    /// Forward relationship this one reverses.
    pub reverse_of: Option<RelationshipId>,
    /// Copied in from a superclass.
    pub inherited: bool,
}

impl Relationship {
    /// Create a relationship from its declaration.
    pub fn from_decl(decl: &RelationshipDecl, owner: ObjectId) -> Self {
        Self {
            name: decl.name.clone(),
            owner,
            original_owner: None,
            related_object_name: decl.related_object.clone(),
            related: None,
            cardinality_key: decl.cardinality.clone(),
            cardinality: None,
            query: decl.query.clone(),
            join: JoinQuery::default(),
            reverse_name: decl.reverse_name.clone(),
            related_is_dependent: decl.related_is_dependent,
            order_by: decl.order_by.clone(),
            parameters: decl.parameters.clone(),
            is_reverse_relationship: false,
            has_parent_container: false,
            reverse_of: None,
            inherited: false,
        }
    }

    /// Whether related objects are owned by the owner.
    pub fn is_related_dependent(&self) -> bool {
        self.related_is_dependent.unwrap_or(false)
    }

    /// Whether the owner is itself a dependent of the related object.
    pub fn is_dependent(&self) -> bool {
        self.is_reverse_relationship && self.has_parent_container
    }

    /// Whether a reverse relationship is declared.
    pub fn is_bidirectional(&self) -> bool {
        self.reverse_name.is_some()
    }

    /// Check if the relationship takes parameters.
    pub fn has_parameters(&self) -> bool {
        self.parameters.is_some()
    }

    /// Only unparameterized relationships get a setter.
    pub fn has_setter(&self) -> bool {
        !self.has_parameters()
    }

    /// Check if the query contains anything besides plain join equalities.
    pub fn has_filters(&self) -> bool {
        !self.join.filters.is_empty()
    }

    /// Whether the query mentions no class besides the two ends.
    pub fn depends_only_on_from_to_objects(&self) -> bool {
        self.join.other_classes.is_empty()
    }

    /// Whether the owning side is "many".
    pub fn is_from_many(&self) -> bool {
        self.cardinality.map(|c| c.is_from_many()).unwrap_or(false)
    }

    /// Whether the related side is "many".
    pub fn is_to_many(&self) -> bool {
        self.cardinality.map(|c| c.is_to_many()).unwrap_or(false)
    }

    /// Check agreement with the same-named superclass relationship and copy
    /// over every setting this declaration leaves unset.
    pub fn validate_and_use_missing_values_from_super_class(
        &mut self,
        parent: &Relationship,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        if self.related != parent.related {
            errors.push(format!(
                "related object type mismatch with superclass for relationship '{}'",
                self.name
            ));
        }
        match (&self.cardinality_key, &parent.cardinality_key) {
            (Some(mine), Some(theirs)) if mine != theirs => errors.push(format!(
                "cardinality mismatch with superclass for relationship '{}'",
                self.name
            )),
            (None, Some(theirs)) => self.cardinality_key = Some(theirs.clone()),
            _ => {}
        }
        if self.query.is_none() {
            self.query.clone_from(&parent.query);
        }
        if self.order_by.is_none() {
            self.order_by.clone_from(&parent.order_by);
        }
        if self.related_is_dependent.is_none() {
            self.related_is_dependent = parent.related_is_dependent;
        }
        errors
    }

    /// Copy the relationship onto a subclass.
    pub fn clone_for_new_owner(&self, new_owner: ObjectId) -> Relationship {
        let mut copy = self.clone();
        copy.owner = new_owner;
        copy.original_owner = Some(self.original_owner.unwrap_or(self.owner));
        copy.inherited = true;
        copy
    }

    /// Build the reverse relationship to be added to the related object.
    ///
    /// Returns `None` unless the relationship is bidirectional with a known
    /// related object.
    pub fn reverse(&self, forward: RelationshipId, owner_name: &str) -> Option<Relationship> {
        let reverse_name = self.reverse_name.clone()?;
        let related = self.related?;
        Some(Relationship {
            name: reverse_name,
            owner: related,
            original_owner: None,
            related_object_name: owner_name.to_string(),
            related: Some(self.owner),
            cardinality_key: self.cardinality.map(|c| c.reverse().key().to_string()),
            cardinality: self.cardinality.map(|c| c.reverse()),
            query: None,
            join: self.join.reversed(),
            reverse_name: Some(self.name.clone()),
            related_is_dependent: Some(false),
            order_by: None,
            parameters: None,
            is_reverse_relationship: true,
            has_parent_container: self.is_related_dependent(),
            reverse_of: Some(forward),
            inherited: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_join() {
        let join = JoinQuery::parse("this.id = OrderItem.orderId", "OrderItem");
        assert_eq!(
            join.pairs,
            vec![JoinPair {
                this_attribute: "id".into(),
                related_attribute: "orderId".into(),
            }]
        );
        assert!(join.filters.is_empty());
        assert!(join.references_this && join.references_related);
    }

    #[test]
    fn test_reversed_operands_and_filters() {
        let join = JoinQuery::parse(
            "OrderItem.orderId = this.id AND OrderItem.state = 'open' and (this.type = 2)",
            "OrderItem",
        );
        assert_eq!(join.pairs.len(), 1);
        assert_eq!(join.pairs[0].this_attribute, "id");
        assert_eq!(join.filters.len(), 2);
        assert!(join.other_classes.is_empty());
    }

    #[test]
    fn test_third_class_reference() {
        let join = JoinQuery::parse(
            "this.id = Account.ownerId and Account.deskId = Desk.id",
            "Account",
        );
        assert_eq!(join.pairs.len(), 1);
        assert_eq!(join.other_classes, vec!["Desk".to_string()]);
    }

    #[test]
    fn test_missing_sides() {
        let join = JoinQuery::parse("OrderItem.orderId = 5", "OrderItem");
        assert!(!join.references_this);
        assert!(join.references_related);
        assert!(join.pairs.is_empty());

        let join = JoinQuery::parse("this.id >= OrderItem.orderId", "OrderItem");
        assert!(join.pairs.is_empty());
        assert_eq!(join.filters.len(), 1);
    }

    #[test]
    fn test_literal_with_dot_is_not_a_reference() {
        let join = JoinQuery::parse("this.id = Item.orderId and Item.label = 'a.b'", "Item");
        assert!(join.other_classes.is_empty());
        let join = JoinQuery::parse("this.price = 1.5", "Item");
        assert!(join.other_classes.is_empty());
    }

    #[test]
    fn test_and_inside_literal_does_not_split() {
        let join = JoinQuery::parse("this.id = Item.orderId and Item.label = 'a and b'", "Item");
        assert_eq!(join.pairs.len(), 1);
        assert_eq!(join.filters, vec!["Item.label = 'a and b'".to_string()]);

        let join = JoinQuery::parse("Item.label = 'x' AND this.id = Item.orderId", "Item");
        assert_eq!(join.pairs.len(), 1);
        assert_eq!(join.filters.len(), 1);
    }

    #[test]
    fn test_reverse_relationship() {
        let decl = RelationshipDecl::new(
            "items",
            "OrderItem",
            "one-to-many",
            "this.id = OrderItem.orderId",
        )
        .with_reverse_name("order")
        .related_is_dependent();
        let mut forward = Relationship::from_decl(&decl, ObjectId(0));
        forward.related = Some(ObjectId(1));
        forward.cardinality = Some(Cardinality::OneToMany);
        forward.join = JoinQuery::parse(forward.query.as_deref().unwrap(), "OrderItem");

        let reverse = forward.reverse(RelationshipId(0), "com.acme.Order").unwrap();

        assert_eq!(reverse.name, "order");
        assert_eq!(reverse.owner, ObjectId(1));
        assert_eq!(reverse.related, Some(ObjectId(0)));
        assert_eq!(reverse.cardinality, Some(Cardinality::ManyToOne));
        assert_eq!(reverse.join.pairs[0].this_attribute, "orderId");
        assert!(reverse.is_dependent());
        assert!(!reverse.is_related_dependent());
    }

    #[test]
    fn test_super_class_backfill() {
        let parent_decl = RelationshipDecl::new(
            "items",
            "OrderItem",
            "one-to-many",
            "this.id = OrderItem.orderId",
        )
        .with_order_by("lineNumber asc");
        let mut parent = Relationship::from_decl(&parent_decl, ObjectId(0));
        parent.related = Some(ObjectId(2));
        let redeclared = RelationshipDecl::redeclared("items", "OrderItem");
        let mut child = Relationship::from_decl(&redeclared, ObjectId(1));
        child.related = Some(ObjectId(2));

        assert!(child.validate_and_use_missing_values_from_super_class(&parent).is_empty());
        assert_eq!(child.cardinality_key.as_deref(), Some("one-to-many"));
        assert_eq!(child.query, parent.query);
        assert_eq!(child.order_by.as_deref(), Some("lineNumber asc"));
    }

    #[test]
    fn test_super_class_mismatch() {
        let mut parent = Relationship::from_decl(
            &RelationshipDecl::new(
                "items",
                "OrderItem",
                "one-to-many",
                "this.id = OrderItem.orderId",
            ),
            ObjectId(0),
        );
        parent.related = Some(ObjectId(2));
        let mut child = Relationship::from_decl(
            &RelationshipDecl::new("items", "Other", "one-to-one", "this.id = Other.orderId"),
            ObjectId(1),
        );
        child.related = Some(ObjectId(3));

        let errors = child.validate_and_use_missing_values_from_super_class(&parent);
        assert_eq!(errors.len(), 2);
    }
}
