//! Object, attribute and relationship declarations.

use serde::{Deserialize, Serialize};

use super::embedded::EmbeddedValueDecl;
use crate::model::types::{DataType, TimezoneConversion};

/// Kind of persistent object declared in the metamodel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectTypeDecl {
    /// Participates in transactions.
    #[default]
    Transactional,
    /// Cached, never written.
    ReadOnly,
}

/// A declared object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDecl {
    /// Package the generated classes live in.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Superclass name (simple or fully-qualified).
    #[serde(default)]
    pub super_class: Option<String>,
    /// Transactional or read-only.
    #[serde(default)]
    pub object_type: ObjectTypeDecl,
    /// Declared in another module; nothing is generated for it.
    #[serde(default)]
    pub imported: bool,
    /// Overrides the generator-wide final getter default.
    #[serde(default)]
    pub default_final_getters: Option<bool>,
    /// Plain attributes, in declaration order.
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    /// Bitemporal attributes.
    #[serde(default)]
    pub as_of_attributes: Vec<AsOfAttributeDecl>,
    /// Sharding key.
    #[serde(default)]
    pub source_attribute: Option<SourceAttributeDecl>,
    /// Attributes whose values come from an enumeration.
    #[serde(default)]
    pub enumeration_attributes: Vec<EnumerationAttributeDecl>,
    /// Embedded values mapped onto this object's columns.
    #[serde(default)]
    pub embedded_values: Vec<EmbeddedValueDecl>,
    /// Relationships, in declaration order.
    #[serde(default)]
    pub relationships: Vec<RelationshipDecl>,
    /// Implemented interfaces (simple or fully-qualified names).
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl ObjectDecl {
    /// Create a new object declaration.
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
            super_class: None,
            object_type: ObjectTypeDecl::Transactional,
            imported: false,
            default_final_getters: None,
            attributes: Vec::new(),
            as_of_attributes: Vec::new(),
            source_attribute: None,
            enumeration_attributes: Vec::new(),
            embedded_values: Vec::new(),
            relationships: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    /// Fully-qualified class name.
    pub fn fully_qualified_name(&self) -> String {
        super::qualify(&self.package, &self.class_name)
    }

    /// Set the superclass.
    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    /// Mark the object as read-only.
    pub fn read_only(mut self) -> Self {
        self.object_type = ObjectTypeDecl::ReadOnly;
        self
    }

    /// Mark the object as imported from another module.
    pub fn imported(mut self) -> Self {
        self.imported = true;
        self
    }

    /// Override the final getter default.
    pub fn with_default_final_getters(mut self, final_getters: bool) -> Self {
        self.default_final_getters = Some(final_getters);
        self
    }

    /// Add a plain attribute.
    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add an as-of attribute.
    pub fn with_as_of_attribute(mut self, attribute: AsOfAttributeDecl) -> Self {
        self.as_of_attributes.push(attribute);
        self
    }

    /// Set the source attribute.
    pub fn with_source_attribute(mut self, attribute: SourceAttributeDecl) -> Self {
        self.source_attribute = Some(attribute);
        self
    }

    /// Add an enumeration attribute.
    pub fn with_enumeration_attribute(mut self, attribute: EnumerationAttributeDecl) -> Self {
        self.enumeration_attributes.push(attribute);
        self
    }

    /// Add an embedded value.
    pub fn with_embedded_value(mut self, embedded: EmbeddedValueDecl) -> Self {
        self.embedded_values.push(embedded);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: RelationshipDecl) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Declare an implemented interface.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

/// Primary key generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryKeyGeneratorStrategy {
    /// Next value is `max(pk) + 1`.
    Max,
    /// Values are drawn from a table-backed sequence.
    SimulatedSequence,
}

impl PrimaryKeyGeneratorStrategy {
    /// Name used by the emission templates.
    pub fn name(&self) -> &'static str {
        match self {
            PrimaryKeyGeneratorStrategy::Max => "Max",
            PrimaryKeyGeneratorStrategy::SimulatedSequence => "SimulatedSequence",
        }
    }
}

/// Table-backed sequence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedSequenceDecl {
    /// Sequence name.
    pub sequence_name: String,
    /// Values reserved per round trip.
    #[serde(default)]
    pub batch_size: Option<u32>,
    /// First value handed out.
    #[serde(default)]
    pub initial_value: Option<i64>,
    /// Step between values.
    #[serde(default)]
    pub increment_size: Option<u32>,
}

impl SimulatedSequenceDecl {
    /// Create a sequence with default sizing.
    pub fn new(sequence_name: impl Into<String>) -> Self {
        Self {
            sequence_name: sequence_name.into(),
            batch_size: None,
            initial_value: None,
            increment_size: None,
        }
    }
}

/// A plain attribute declaration.
///
/// Optional settings stay `None` when the declaration leaves them out so the
/// inheritance merge can tell "unset" apart from an explicit value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Column the attribute maps to.
    #[serde(default)]
    pub column_name: Option<String>,
    /// Nullability.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Database identity column.
    #[serde(default)]
    pub identity: bool,
    /// Primary key value may change after insert.
    #[serde(default)]
    pub mutable_primary_key: bool,
    /// Maximum string length.
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Trim string values on set.
    #[serde(default)]
    pub trim: Option<bool>,
    /// Truncate string values exceeding `max_length`.
    #[serde(default)]
    pub truncate: Option<bool>,
    /// Intern values in a shared pool.
    #[serde(default)]
    pub poolable: Option<bool>,
    /// Timezone policy (timestamps only).
    #[serde(default)]
    pub timezone_conversion: Option<TimezoneConversion>,
    /// Expression used when the column is null.
    #[serde(default)]
    pub default_if_null: Option<String>,
    /// Decimal precision.
    #[serde(default)]
    pub precision: Option<i32>,
    /// Decimal scale.
    #[serde(default)]
    pub scale: Option<i32>,
    /// No setter is generated.
    #[serde(default)]
    pub read_only: bool,
    /// Getter is declared final.
    #[serde(default)]
    pub final_getter: Option<bool>,
    /// Bound as a string literal (dates and timestamps only).
    #[serde(default)]
    pub set_as_string: bool,
    /// Primary key generation strategy.
    #[serde(default)]
    pub primary_key_generator_strategy: Option<PrimaryKeyGeneratorStrategy>,
    /// Sequence settings for `SimulatedSequence`.
    #[serde(default)]
    pub simulated_sequence: Option<SimulatedSequenceDecl>,
}

impl AttributeDecl {
    /// Create a new attribute declaration with every optional setting unset.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            column_name: None,
            nullable: None,
            primary_key: false,
            identity: false,
            mutable_primary_key: false,
            max_length: None,
            trim: None,
            truncate: None,
            poolable: None,
            timezone_conversion: None,
            default_if_null: None,
            precision: None,
            scale: None,
            read_only: false,
            final_getter: None,
            set_as_string: false,
            primary_key_generator_strategy: None,
            simulated_sequence: None,
        }
    }

    /// Mark as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Set the column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    /// Set nullability explicitly.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Set the maximum length.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the trim policy.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    /// Set the pooling policy.
    pub fn with_poolable(mut self, poolable: bool) -> Self {
        self.poolable = Some(poolable);
        self
    }

    /// Set the timezone policy.
    pub fn with_timezone_conversion(mut self, conversion: TimezoneConversion) -> Self {
        self.timezone_conversion = Some(conversion);
        self
    }

    /// Set decimal precision and scale.
    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Set the default-if-null expression.
    pub fn with_default_if_null(mut self, expression: impl Into<String>) -> Self {
        self.default_if_null = Some(expression.into());
        self
    }

    /// Set the primary key generator strategy.
    pub fn with_primary_key_generator(mut self, strategy: PrimaryKeyGeneratorStrategy) -> Self {
        self.primary_key_generator_strategy = Some(strategy);
        self
    }

    /// Attach simulated sequence settings.
    pub fn with_simulated_sequence(mut self, sequence: SimulatedSequenceDecl) -> Self {
        self.simulated_sequence = Some(sequence);
        self
    }

    /// Bind the value as a string literal.
    pub fn set_as_string(mut self) -> Self {
        self.set_as_string = true;
        self
    }
}

/// A bitemporal attribute declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsOfAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Column holding the start of the interval.
    #[serde(default)]
    pub from_column_name: Option<String>,
    /// Column holding the end of the interval.
    #[serde(default)]
    pub to_column_name: Option<String>,
    /// Expression denoting "infinity", written as `[expr]`.
    #[serde(default)]
    pub infinity_date: Option<String>,
    /// Infinity is represented by null.
    #[serde(default)]
    pub infinity_is_null: bool,
    /// Value used when a query does not specify this attribute.
    #[serde(default)]
    pub default_if_not_specified: Option<String>,
    /// The end of the interval is inclusive.
    #[serde(default)]
    pub to_is_inclusive: Option<bool>,
    /// Processing (transaction) time rather than business time.
    #[serde(default)]
    pub is_processing_date: bool,
    /// Timezone policy; defaults to the owning object's.
    #[serde(default)]
    pub timezone_conversion: Option<TimezoneConversion>,
    /// Intern values in the timestamp pool.
    #[serde(default)]
    pub poolable: Option<bool>,
    /// Getter is declared final.
    #[serde(default)]
    pub final_getter: Option<bool>,
}

impl AsOfAttributeDecl {
    /// Create a new as-of attribute declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_column_name: None,
            to_column_name: None,
            infinity_date: None,
            infinity_is_null: false,
            default_if_not_specified: None,
            to_is_inclusive: None,
            is_processing_date: false,
            timezone_conversion: None,
            poolable: None,
            final_getter: None,
        }
    }

    /// Set the from/to columns.
    pub fn with_columns(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_column_name = Some(from.into());
        self.to_column_name = Some(to.into());
        self
    }

    /// Set the infinity expression.
    pub fn with_infinity_date(mut self, infinity: impl Into<String>) -> Self {
        self.infinity_date = Some(infinity.into());
        self
    }

    /// Mark as processing date.
    pub fn processing_date(mut self) -> Self {
        self.is_processing_date = true;
        self
    }

    /// Set the default used when a query leaves the attribute out.
    pub fn with_default_if_not_specified(mut self, expression: impl Into<String>) -> Self {
        self.default_if_not_specified = Some(expression.into());
        self
    }
}

/// Sharding key declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
}

impl SourceAttributeDecl {
    /// Create a new source attribute declaration.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An attribute whose values are members of an enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationAttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Enumeration name (simple or fully-qualified).
    pub enumeration: String,
    /// Column the persisted value maps to.
    #[serde(default)]
    pub column_name: Option<String>,
    /// Nullability.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Requests primary key membership; not supported.
    #[serde(default)]
    pub primary_key: bool,
    /// Requests a simulated sequence; not supported.
    #[serde(default)]
    pub simulated_sequence: Option<SimulatedSequenceDecl>,
    /// Requests a timezone policy; not supported.
    #[serde(default)]
    pub timezone_conversion: Option<TimezoneConversion>,
}

impl EnumerationAttributeDecl {
    /// Create a new enumeration attribute declaration.
    pub fn new(name: impl Into<String>, enumeration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enumeration: enumeration.into(),
            column_name: None,
            nullable: None,
            primary_key: false,
            simulated_sequence: None,
            timezone_conversion: None,
        }
    }

    /// Set the column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }
}

/// A relationship declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDecl {
    /// Relationship name.
    pub name: String,
    /// Related object (simple or fully-qualified name).
    pub related_object: String,
    /// Cardinality key, e.g. `one-to-many`.
    #[serde(default)]
    pub cardinality: Option<String>,
    /// Join expression, e.g. `this.id = OrderItem.orderId`.
    #[serde(default)]
    pub query: Option<String>,
    /// Name of the relationship navigated from the related side.
    #[serde(default)]
    pub reverse_name: Option<String>,
    /// Related objects are owned by this one.
    #[serde(default)]
    pub related_is_dependent: Option<bool>,
    /// Ordering of to-many results.
    #[serde(default)]
    pub order_by: Option<String>,
    /// Parameter list of a parameterized relationship.
    #[serde(default)]
    pub parameters: Option<String>,
}

impl RelationshipDecl {
    /// Create a new relationship declaration.
    pub fn new(
        name: impl Into<String>,
        related_object: impl Into<String>,
        cardinality: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            related_object: related_object.into(),
            cardinality: Some(cardinality.into()),
            query: Some(query.into()),
            reverse_name: None,
            related_is_dependent: None,
            order_by: None,
            parameters: None,
        }
    }

    /// Redeclare an inherited relationship, leaving everything else to the superclass.
    pub fn redeclared(name: impl Into<String>, related_object: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            related_object: related_object.into(),
            cardinality: None,
            query: None,
            reverse_name: None,
            related_is_dependent: None,
            order_by: None,
            parameters: None,
        }
    }

    /// Set the reverse relationship name.
    pub fn with_reverse_name(mut self, reverse_name: impl Into<String>) -> Self {
        self.reverse_name = Some(reverse_name.into());
        self
    }

    /// Mark the related objects as dependent.
    pub fn related_is_dependent(mut self) -> Self {
        self.related_is_dependent = Some(true);
        self
    }

    /// Set the ordering.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Declare parameters.
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }
}
