//! Attribute definitions for object types.
//!
//! An [`Attribute`] is one column-like member of an object type. The kind set
//! is closed ([`AttributeKind`]) and every derived property used by emission
//! is an exhaustive `match` over it, so adding a kind forces every decision
//! table to be revisited.

use serde::Serialize;
use std::fmt;

use super::graph::{ObjectId, RelationshipId};
use super::object::{ObjectDefaults, ObjectType};
use super::types::{DataType, TimezoneConversion};
use crate::error::{Error, Result};
use crate::metamodel::{
    AsOfAttributeDecl, AttributeDecl, EnumerationAttributeDecl, PrimaryKeyGeneratorStrategy,
    SimulatedSequenceDecl,
};

/// Capabilities that only some attribute kinds provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// Membership in the primary key.
    PrimaryKey,
    /// A primary key generator strategy.
    PrimaryKeyGenerator,
    /// A simulated sequence.
    SimulatedSequence,
    /// A timezone conversion policy.
    TimezoneConversion,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::PrimaryKey => write!(f, "primary key membership"),
            Capability::PrimaryKeyGenerator => write!(f, "a primary key generator strategy"),
            Capability::SimulatedSequence => write!(f, "a simulated sequence"),
            Capability::TimezoneConversion => write!(f, "a timezone conversion policy"),
        }
    }
}

/// Column settings of a plain attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSettings {
    /// Column the attribute maps to.
    pub column_name: Option<String>,
    /// Declared nullability; `None` when not declared.
    pub nullable: Option<bool>,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Database identity column.
    pub identity: bool,
    /// Primary key value may change after insert.
    pub mutable_primary_key: bool,
    /// Maximum string length.
    pub max_length: Option<u32>,
    /// Trim string values on set.
    pub trim: Option<bool>,
    /// Truncate strings exceeding `max_length`.
    pub truncate: Option<bool>,
    /// Intern values in a shared pool.
    pub poolable: Option<bool>,
    /// Timezone policy (timestamps only).
    pub timezone_conversion: Option<TimezoneConversion>,
    /// Expression used when the column is null.
    pub default_if_null: Option<String>,
    /// Decimal precision.
    pub precision: Option<i32>,
    /// Decimal scale.
    pub scale: Option<i32>,
    /// No setter is generated.
    pub read_only: bool,
    /// Getter is declared final.
    pub final_getter: Option<bool>,
    /// Bound as a string literal.
    pub set_as_string: bool,
    /// Primary key generator strategy.
    pub primary_key_generator_strategy: Option<PrimaryKeyGeneratorStrategy>,
    /// Simulated sequence settings.
    pub simulated_sequence: Option<SimulatedSequenceDecl>,
}

impl From<&AttributeDecl> for ColumnSettings {
    fn from(decl: &AttributeDecl) -> Self {
        Self {
            column_name: decl.column_name.clone(),
            nullable: decl.nullable,
            primary_key: decl.primary_key,
            identity: decl.identity,
            mutable_primary_key: decl.mutable_primary_key,
            max_length: decl.max_length,
            trim: decl.trim,
            truncate: decl.truncate,
            poolable: decl.poolable,
            timezone_conversion: decl.timezone_conversion,
            default_if_null: decl.default_if_null.clone(),
            precision: decl.precision,
            scale: decl.scale,
            read_only: decl.read_only,
            final_getter: decl.final_getter,
            set_as_string: decl.set_as_string,
            primary_key_generator_strategy: decl.primary_key_generator_strategy,
            simulated_sequence: decl.simulated_sequence.clone(),
        }
    }
}

/// Settings of a bitemporal attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsOfSettings {
    /// Column holding the start of the interval.
    pub from_column_name: Option<String>,
    /// Column holding the end of the interval.
    pub to_column_name: Option<String>,
    /// Infinity expression, written as `[expr]`.
    pub infinity_date: Option<String>,
    /// Infinity is represented by null.
    pub infinity_is_null: bool,
    /// Value used when a query leaves the attribute out.
    pub default_if_not_specified: Option<String>,
    /// The end of the interval is inclusive.
    pub to_is_inclusive: Option<bool>,
    /// Processing (transaction) time rather than business time.
    pub is_processing_date: bool,
    /// Timezone policy; the owner's default applies when unset.
    pub timezone_conversion: Option<TimezoneConversion>,
    /// Intern values in the timestamp pool.
    pub poolable: Option<bool>,
    /// Getter is declared final.
    pub final_getter: Option<bool>,
}

impl From<&AsOfAttributeDecl> for AsOfSettings {
    fn from(decl: &AsOfAttributeDecl) -> Self {
        Self {
            from_column_name: decl.from_column_name.clone(),
            to_column_name: decl.to_column_name.clone(),
            infinity_date: decl.infinity_date.clone(),
            infinity_is_null: decl.infinity_is_null,
            default_if_not_specified: decl.default_if_not_specified.clone(),
            to_is_inclusive: decl.to_is_inclusive,
            is_processing_date: decl.is_processing_date,
            timezone_conversion: decl.timezone_conversion,
            poolable: decl.poolable,
            final_getter: decl.final_getter,
        }
    }
}

/// One enumeration member and the value written for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumerationMapping {
    /// Member name.
    pub member: String,
    /// Persisted value.
    pub persisted_value: String,
}

/// Settings of an enumeration attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerationSettings {
    /// Enumeration name as declared.
    pub enumeration: String,
    /// Resolved enumeration object, if it exists.
    pub enumeration_id: Option<ObjectId>,
    /// Simple class name of the resolved enumeration.
    pub enumeration_class: Option<String>,
    /// Column the persisted value maps to.
    pub column_name: Option<String>,
    /// Declared nullability.
    pub nullable: Option<bool>,
    /// Member-to-value mappings in declaration order.
    pub mappings: Vec<EnumerationMapping>,
    /// Capabilities the declaration asked for but cannot have.
    pub unsupported_requests: Vec<Capability>,
}

impl EnumerationSettings {
    pub(crate) fn from_decl(decl: &EnumerationAttributeDecl) -> Self {
        let mut unsupported_requests = Vec::new();
        if decl.primary_key {
            unsupported_requests.push(Capability::PrimaryKey);
        }
        if decl.simulated_sequence.is_some() {
            unsupported_requests.push(Capability::SimulatedSequence);
        }
        if decl.timezone_conversion.is_some() {
            unsupported_requests.push(Capability::TimezoneConversion);
        }
        Self {
            enumeration: decl.enumeration.clone(),
            enumeration_id: None,
            enumeration_class: None,
            column_name: decl.column_name.clone(),
            nullable: decl.nullable,
            mappings: Vec::new(),
            unsupported_requests,
        }
    }
}

/// Settings of an attribute contributed by an embedded value mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedSettings {
    /// Nested name of the embedded value the mapping belongs to.
    pub embedded_value: String,
    /// Leaf attribute of the embedded value object.
    pub mapping_attribute: String,
    /// Column on the owner.
    pub column_name: String,
    /// Nullability inherited from the embedded value object attribute.
    pub nullable: bool,
    /// Maximum string length.
    pub max_length: Option<u32>,
}

/// The closed set of attribute kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeKind {
    /// Ordinary column.
    Plain(ColumnSettings),
    /// Bitemporal validity interval.
    AsOf(AsOfSettings),
    /// Column holding an enumeration's persisted value.
    Enumeration(EnumerationSettings),
    /// Sharding key.
    Source,
    /// Column contributed by an embedded value.
    Mapped(MappedSettings),
}

impl AttributeKind {
    /// Short human-readable kind name.
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Plain(_) => "plain",
            AttributeKind::AsOf(_) => "as-of",
            AttributeKind::Enumeration(_) => "enumeration",
            AttributeKind::Source => "source",
            AttributeKind::Mapped(_) => "mapped",
        }
    }
}

/// Reverse-navigation binding recorded on an owned attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseRelationship {
    /// Package of the object declaring the relationship.
    pub package: String,
    /// Simple class name of the object declaring the relationship.
    pub class_name: String,
    /// Relationship name.
    pub name: String,
}

/// A resolved attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    name: String,
    owner: ObjectId,
    original_owner: Option<ObjectId>,
    inherited: bool,
    data_type: DataType,
    owner_defaults: ObjectDefaults,
    kind: AttributeKind,
    owning_relationship: Option<RelationshipId>,
    owning_relationship_name: Option<String>,
    reverse_relationship: Option<ReverseRelationship>,
}

impl Attribute {
    fn with_kind(
        name: impl Into<String>,
        owner: &ObjectType,
        data_type: DataType,
        kind: AttributeKind,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.id(),
            original_owner: None,
            inherited: false,
            data_type,
            owner_defaults: owner.defaults(),
            kind,
            owning_relationship: None,
            owning_relationship_name: None,
            reverse_relationship: None,
        }
    }

    /// Create a plain attribute from its declaration.
    pub fn plain(decl: &AttributeDecl, owner: &ObjectType) -> Self {
        Self::with_kind(
            &decl.name,
            owner,
            decl.data_type,
            AttributeKind::Plain(ColumnSettings::from(decl)),
        )
    }

    /// Create an as-of attribute from its declaration.
    pub fn as_of(decl: &AsOfAttributeDecl, owner: &ObjectType) -> Self {
        Self::with_kind(
            &decl.name,
            owner,
            DataType::Timestamp,
            AttributeKind::AsOf(AsOfSettings::from(decl)),
        )
    }

    /// Create an enumeration attribute.
    ///
    /// The type is the enumeration's persisted type and cannot change later.
    pub fn enumeration(
        decl: &EnumerationAttributeDecl,
        owner: &ObjectType,
        persisted_type: DataType,
        settings: EnumerationSettings,
    ) -> Self {
        Self::with_kind(
            &decl.name,
            owner,
            persisted_type,
            AttributeKind::Enumeration(settings),
        )
    }

    /// Create a source attribute.
    pub fn source(name: impl Into<String>, data_type: DataType, owner: &ObjectType) -> Self {
        Self::with_kind(name, owner, data_type, AttributeKind::Source)
    }

    /// Create an attribute for an embedded value mapping.
    pub fn mapped(
        name: impl Into<String>,
        data_type: DataType,
        owner: &ObjectType,
        settings: MappedSettings,
    ) -> Self {
        Self::with_kind(name, owner, data_type, AttributeKind::Mapped(settings))
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object the attribute belongs to.
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Object the attribute was first declared on, for inherited attributes.
    pub fn original_owner(&self) -> Option<ObjectId> {
        self.original_owner
    }

    /// Check if the attribute was copied in from a superclass.
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Semantic data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The attribute kind and its settings.
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Check if this is a bitemporal attribute.
    pub fn is_as_of(&self) -> bool {
        matches!(self.kind, AttributeKind::AsOf(_))
    }

    /// Check if this is the sharding key.
    pub fn is_source(&self) -> bool {
        matches!(self.kind, AttributeKind::Source)
    }

    /// Check if this is an enumeration attribute.
    pub fn is_enumeration(&self) -> bool {
        matches!(self.kind, AttributeKind::Enumeration(_))
    }

    /// Check if this attribute comes from an embedded value mapping.
    pub fn is_mapped(&self) -> bool {
        matches!(self.kind, AttributeKind::Mapped(_))
    }

    /// Column the attribute maps to, when it maps to exactly one.
    pub fn column_name(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.column_name.as_deref(),
            AttributeKind::Enumeration(settings) => settings.column_name.as_deref(),
            AttributeKind::Mapped(settings) => Some(&settings.column_name),
            AttributeKind::AsOf(_) | AttributeKind::Source => None,
        }
    }

    /// Whether generated code must handle null values.
    pub fn is_nullable(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => {
                let nullable = settings.nullable.unwrap_or(true);
                nullable && (settings.nullable.is_some() || !settings.primary_key)
            }
            AttributeKind::Enumeration(settings) => settings.nullable.unwrap_or(true),
            AttributeKind::Mapped(settings) => settings.nullable,
            AttributeKind::AsOf(_) | AttributeKind::Source => false,
        }
    }

    /// Check if the attribute is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.primary_key,
            _ => false,
        }
    }

    /// Check if the attribute is a database identity column.
    pub fn is_identity(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.identity,
            _ => false,
        }
    }

    /// Check if the attribute is read-only.
    pub fn is_read_only(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.read_only,
            AttributeKind::AsOf(_) | AttributeKind::Source => true,
            AttributeKind::Enumeration(_) | AttributeKind::Mapped(_) => false,
        }
    }

    /// Whether values are interned in a shared pool.
    pub fn is_poolable(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => {
                self.data_type.can_be_pooled() && settings.poolable.unwrap_or(true)
            }
            AttributeKind::AsOf(settings) => settings.poolable.unwrap_or(true),
            AttributeKind::Source => self.data_type.is_textual(),
            AttributeKind::Mapped(_) => self.data_type.can_be_pooled(),
            AttributeKind::Enumeration(_) => false,
        }
    }

    /// Whether string values are trimmed on set.
    pub fn must_trim(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => {
                self.data_type.is_textual() && settings.trim.unwrap_or(true)
            }
            AttributeKind::Mapped(_) => self.data_type.is_textual(),
            _ => false,
        }
    }

    /// Whether over-long strings are truncated.
    pub fn must_truncate(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.truncate.unwrap_or(false),
            _ => false,
        }
    }

    /// Maximum string length, if declared.
    pub fn max_length(&self) -> Option<u32> {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.max_length,
            AttributeKind::Mapped(settings) => settings.max_length,
            _ => None,
        }
    }

    /// Finder attribute class used by generated finders.
    pub fn finder_attribute_type(&self) -> &'static str {
        match &self.kind {
            AttributeKind::AsOf(_) => "AsOfAttribute",
            _ => self.data_type.finder_attribute_type(),
        }
    }

    /// Effective timezone policy.
    ///
    /// Plain timestamps default to no conversion; as-of attributes default to
    /// the owning object's policy.
    pub fn timezone_conversion(&self) -> TimezoneConversion {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.timezone_conversion.unwrap_or_default(),
            AttributeKind::AsOf(settings) => settings
                .timezone_conversion
                .unwrap_or(self.owner_defaults.timezone_conversion),
            _ => TimezoneConversion::None,
        }
    }

    /// Whether values need timezone conversion on the way in and out.
    pub fn is_timezone_conversion_needed(&self) -> bool {
        self.data_type == DataType::Timestamp && !self.timezone_conversion().is_none()
    }

    /// Change the timezone policy.
    pub fn set_timezone_conversion(&mut self, conversion: TimezoneConversion) -> Result<()> {
        let slot = match &mut self.kind {
            AttributeKind::Plain(settings) => &mut settings.timezone_conversion,
            AttributeKind::AsOf(settings) => &mut settings.timezone_conversion,
            _ => {
                return Err(Error::UnsupportedCapability {
                    attribute: self.name.clone(),
                    capability: Capability::TimezoneConversion,
                })
            }
        };
        *slot = Some(conversion);
        Ok(())
    }

    /// Default-value expression emitted for the attribute.
    pub fn default_value_expression(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Plain(settings) => settings.default_if_null.as_deref(),
            AttributeKind::AsOf(settings) => settings.default_if_not_specified.as_deref(),
            _ => None,
        }
    }

    /// Whether the generated getter is final.
    pub fn is_final_getter(&self) -> bool {
        let declared = match &self.kind {
            AttributeKind::Plain(settings) => settings.final_getter,
            AttributeKind::AsOf(settings) => settings.final_getter,
            _ => None,
        };
        declared.unwrap_or(self.owner_defaults.final_getters)
    }

    /// Primary key generator strategy.
    pub fn primary_key_generator_strategy(&self) -> Result<Option<PrimaryKeyGeneratorStrategy>> {
        match &self.kind {
            AttributeKind::Plain(settings) => Ok(settings.primary_key_generator_strategy),
            AttributeKind::Enumeration(_) => Err(self.unsupported(Capability::PrimaryKeyGenerator)),
            _ => Ok(None),
        }
    }

    /// Simulated sequence settings.
    pub fn simulated_sequence(&self) -> Result<Option<&SimulatedSequenceDecl>> {
        match &self.kind {
            AttributeKind::Plain(settings) => Ok(settings.simulated_sequence.as_ref()),
            AttributeKind::Enumeration(_) => Err(self.unsupported(Capability::SimulatedSequence)),
            _ => Ok(None),
        }
    }

    /// Member-to-persisted-value mappings; empty for non-enumeration kinds.
    pub fn enumeration_mappings(&self) -> &[EnumerationMapping] {
        match &self.kind {
            AttributeKind::Enumeration(settings) => &settings.mappings,
            _ => &[],
        }
    }

    fn as_of_settings(&self) -> Option<&AsOfSettings> {
        match &self.kind {
            AttributeKind::AsOf(settings) => Some(settings),
            _ => None,
        }
    }

    /// Infinity expression of an as-of attribute.
    pub fn infinity_expression(&self) -> Option<String> {
        let settings = self.as_of_settings()?;
        if settings.infinity_is_null {
            return Some("NullDataTimestamp.getInstance()".to_string());
        }
        Some(match settings.infinity_date.as_deref().map(str::trim) {
            Some(date) if date.starts_with('[') && date.ends_with(']') && date.len() >= 2 => {
                date[1..date.len() - 1].to_string()
            }
            Some(date) => date.to_string(),
            None => "null".to_string(),
        })
    }

    /// Whether the interval end of an as-of attribute is inclusive.
    pub fn to_is_inclusive(&self) -> bool {
        self.as_of_settings()
            .map(|s| s.to_is_inclusive.unwrap_or(true))
            .unwrap_or(false)
    }

    /// Whether an as-of attribute models processing time.
    pub fn is_processing_date(&self) -> bool {
        self.as_of_settings()
            .map(|s| s.is_processing_date)
            .unwrap_or(false)
    }

    /// From/to column bindings of an as-of attribute.
    pub fn as_of_columns(&self) -> Option<(Option<&str>, Option<&str>)> {
        self.as_of_settings().map(|s| {
            (
                s.from_column_name.as_deref(),
                s.to_column_name.as_deref(),
            )
        })
    }

    /// Statement that writes the attribute to an object output stream.
    pub fn serialization_statement(&self) -> String {
        let field = format!("this.{}", self.name);
        match &self.kind {
            AttributeKind::AsOf(_) => format!(
                "MithraTimestamp.write{}TimestampWithInfinity(out, {}, {})",
                self.timezone_prefix(),
                field,
                self.infinity_expression().unwrap_or_else(|| "null".to_string())
            ),
            AttributeKind::Enumeration(settings) => format!(
                "out.write{}({}.toPersistedValue({}))",
                self.data_type.io_type(),
                enumeration_class(settings),
                field
            ),
            _ => match self.data_type {
                DataType::ByteArray => format!(
                    "if ({f} == null) {{ out.writeInt(-1); }} else {{ out.writeInt({f}.length); out.write({f}); }}",
                    f = field
                ),
                DataType::Timestamp => format!(
                    "MithraTimestamp.write{}(out, {})",
                    if self.timezone_conversion().is_none() {
                        "TimezoneInsensitiveTimestamp"
                    } else {
                        "Timestamp"
                    },
                    field
                ),
                DataType::Date => {
                    format!("MithraTimestamp.writeTimezoneInsensitiveDate(out, {})", field)
                }
                other => format!("out.write{}({})", other.io_type(), field),
            },
        }
    }

    /// Statement that reads the attribute back from an object input stream.
    ///
    /// `finder_class` names the finder consulted for full-cache pooling.
    pub fn deserialization_statement(&self, finder_class: &str) -> String {
        let field = format!("this.{}", self.name);
        let value = match &self.kind {
            AttributeKind::AsOf(_) => format!(
                "MithraTimestamp.read{}TimestampWithInfinity(in, {})",
                self.timezone_prefix(),
                self.infinity_expression().unwrap_or_else(|| "null".to_string())
            ),
            AttributeKind::Enumeration(settings) => format!(
                "{}.fromPersistedValue({}in.read{}())",
                enumeration_class(settings),
                self.data_type.io_cast(),
                self.data_type.io_type()
            ),
            _ => match self.data_type {
                DataType::ByteArray => {
                    return format!(
                        "int {n}Length = in.readInt(); if ({n}Length == -1) {{ {f} = null; }} else {{ {f} = new byte[{n}Length]; in.readFully({f}); }}",
                        n = self.name,
                        f = field
                    );
                }
                DataType::Timestamp => format!(
                    "MithraTimestamp.read{}(in)",
                    if self.timezone_conversion().is_none() {
                        "TimezoneInsensitiveTimestamp"
                    } else {
                        "Timestamp"
                    }
                ),
                DataType::Date => "MithraTimestamp.readTimezoneInsensitiveDate(in)".to_string(),
                other => format!("{}in.read{}()", other.io_cast(), other.io_type()),
            },
        };

        if self.is_poolable() {
            format!(
                "{} = {}Pool.getInstance().getOrAddToCache({}, {}.isFullCache())",
                field,
                self.data_type.name(),
                value,
                finder_class
            )
        } else {
            format!("{} = {}", field, value)
        }
    }

    fn timezone_prefix(&self) -> &'static str {
        if self.timezone_conversion().is_none() {
            "TimezoneInsensitive"
        } else {
            ""
        }
    }

    fn unsupported(&self, capability: Capability) -> Error {
        Error::UnsupportedCapability {
            attribute: self.name.clone(),
            capability,
        }
    }

    /// Check the attribute's own declaration for contradictions.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match &self.kind {
            AttributeKind::Plain(settings) => self.validate_plain(settings, &mut errors),
            AttributeKind::AsOf(settings) => self.validate_as_of(settings, &mut errors),
            AttributeKind::Enumeration(settings) => {
                if settings.enumeration_id.is_none() {
                    errors.push(format!(
                        "enumeration '{}' referenced by attribute '{}' is not defined",
                        settings.enumeration, self.name
                    ));
                }
                for capability in &settings.unsupported_requests {
                    errors.push(self.unsupported(*capability).to_string());
                }
            }
            AttributeKind::Source => {
                if !matches!(self.data_type, DataType::Int | DataType::Long | DataType::String) {
                    errors.push(format!(
                        "source attribute '{}' must be int, long or String, not {}",
                        self.name, self.data_type
                    ));
                }
            }
            AttributeKind::Mapped(_) => {}
        }
        errors
    }

    fn validate_plain(&self, settings: &ColumnSettings, errors: &mut Vec<String>) {
        let strategy = settings.primary_key_generator_strategy;
        if settings.simulated_sequence.is_some()
            && strategy != Some(PrimaryKeyGeneratorStrategy::SimulatedSequence)
        {
            errors.push(format!(
                "attribute '{}' declares a simulated sequence but its primary key generator strategy is not SimulatedSequence",
                self.name
            ));
        }
        if strategy == Some(PrimaryKeyGeneratorStrategy::SimulatedSequence)
            && settings.simulated_sequence.is_none()
        {
            errors.push(format!(
                "attribute '{}' uses the SimulatedSequence strategy without declaring a simulated sequence",
                self.name
            ));
        }
        if settings.poolable == Some(true) && !self.data_type.can_be_pooled() {
            errors.push(format!(
                "cannot pool attribute '{}': only String and Timestamp attributes can be pooled",
                self.name
            ));
        }
        if settings.trim == Some(true) && !self.data_type.is_textual() {
            errors.push(format!(
                "cannot trim attribute '{}': only String attributes can be trimmed",
                self.name
            ));
        }
        if settings.set_as_string && !self.data_type.can_be_set_as_string() {
            errors.push(format!(
                "attribute '{}' cannot be set as string: only Date and Timestamp attributes support it",
                self.name
            ));
        }
        if let Some(conversion) = settings.timezone_conversion {
            if !conversion.is_none() && self.data_type != DataType::Timestamp {
                errors.push(format!(
                    "timezone conversion on attribute '{}' only applies to Timestamp attributes",
                    self.name
                ));
            }
        }
        if self.data_type == DataType::BigDecimal {
            match (settings.precision, settings.scale) {
                (Some(precision), Some(scale)) => {
                    if scale < 0 {
                        errors.push(format!(
                            "BigDecimal attribute '{}' has negative scale {}",
                            self.name, scale
                        ));
                    }
                    if precision < 1 {
                        errors.push(format!(
                            "BigDecimal attribute '{}' must have a precision of at least 1, got {}",
                            self.name, precision
                        ));
                    }
                    if scale > precision {
                        errors.push(format!(
                            "BigDecimal attribute '{}' has scale {} greater than precision {}",
                            self.name, scale, precision
                        ));
                    }
                }
                _ => errors.push(format!(
                    "BigDecimal attribute '{}' must declare both precision and scale",
                    self.name
                )),
            }
        }
    }

    fn validate_as_of(&self, settings: &AsOfSettings, errors: &mut Vec<String>) {
        if settings.from_column_name.is_none() || settings.to_column_name.is_none() {
            errors.push(format!(
                "as-of attribute '{}' must declare both from and to columns",
                self.name
            ));
        }
        match settings.infinity_date.as_deref().map(str::trim) {
            Some(_) if settings.infinity_is_null => errors.push(format!(
                "as-of attribute '{}' cannot declare an infinity date when infinity is null",
                self.name
            )),
            Some(date) if !(date.starts_with('[') && date.ends_with(']')) => {
                errors.push(format!(
                    "infinity date of as-of attribute '{}' must be a bracketed expression, got '{}'",
                    self.name, date
                ))
            }
            _ => {}
        }
    }

    /// Check agreement with the same-named superclass attribute and copy over
    /// every optional setting this declaration leaves unset.
    ///
    /// Nothing is copied when any error is returned.
    pub fn validate_and_use_missing_values_from_super_class(
        &mut self,
        parent: &Attribute,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        if self.kind.name() != parent.kind.name() {
            errors.push(format!(
                "attribute '{}' is declared as {} but as {} in superclass",
                self.name,
                self.kind.name(),
                parent.kind.name()
            ));
            return errors;
        }
        if self.data_type != parent.data_type {
            errors.push(format!(
                "type {} of attribute '{}' does not match type {} of the same attribute in superclass",
                self.data_type, self.name, parent.data_type
            ));
        }

        match (&mut self.kind, &parent.kind) {
            (AttributeKind::Plain(mine), AttributeKind::Plain(theirs)) => {
                if mine.primary_key != theirs.primary_key {
                    errors.push(if theirs.primary_key {
                        format!("attribute '{}' is a primary key in superclass", self.name)
                    } else {
                        format!("attribute '{}' is not a primary key in superclass", self.name)
                    });
                }
                if errors.is_empty() {
                    backfill(&mut mine.poolable, &theirs.poolable);
                    backfill(&mut mine.trim, &theirs.trim);
                    backfill(&mut mine.truncate, &theirs.truncate);
                    backfill(&mut mine.nullable, &theirs.nullable);
                    backfill(&mut mine.timezone_conversion, &theirs.timezone_conversion);
                    backfill(&mut mine.final_getter, &theirs.final_getter);
                    backfill(&mut mine.max_length, &theirs.max_length);
                    backfill(&mut mine.precision, &theirs.precision);
                    backfill(&mut mine.scale, &theirs.scale);
                    backfill(&mut mine.column_name, &theirs.column_name);
                    backfill(&mut mine.default_if_null, &theirs.default_if_null);
                }
            }
            (AttributeKind::AsOf(mine), AttributeKind::AsOf(theirs)) => {
                if mine.is_processing_date != theirs.is_processing_date {
                    errors.push(format!(
                        "as-of attribute '{}' disagrees with superclass on being a processing date",
                        self.name
                    ));
                }
                if errors.is_empty() {
                    if !mine.infinity_is_null {
                        backfill(&mut mine.infinity_date, &theirs.infinity_date);
                    }
                    backfill(&mut mine.from_column_name, &theirs.from_column_name);
                    backfill(&mut mine.to_column_name, &theirs.to_column_name);
                    backfill(&mut mine.to_is_inclusive, &theirs.to_is_inclusive);
                    backfill(
                        &mut mine.default_if_not_specified,
                        &theirs.default_if_not_specified,
                    );
                    backfill(&mut mine.poolable, &theirs.poolable);
                    backfill(&mut mine.timezone_conversion, &theirs.timezone_conversion);
                    backfill(&mut mine.final_getter, &theirs.final_getter);
                }
            }
            (AttributeKind::Enumeration(mine), AttributeKind::Enumeration(theirs)) => {
                if mine.enumeration_id != theirs.enumeration_id {
                    errors.push(format!(
                        "attribute '{}' uses enumeration '{}' but superclass uses '{}'",
                        self.name, mine.enumeration, theirs.enumeration
                    ));
                }
                if errors.is_empty() {
                    backfill(&mut mine.column_name, &theirs.column_name);
                    backfill(&mut mine.nullable, &theirs.nullable);
                }
            }
            _ => {}
        }
        errors
    }

    /// Copy the attribute onto another object, as an inherited member.
    ///
    /// The copy shares nothing with the original and carries no ownership
    /// bookkeeping; ownership is arbitrated per object.
    pub fn clone_for_new_owner(&self, new_owner: &ObjectType) -> Attribute {
        let mut copy = self.clone();
        copy.owner = new_owner.id();
        copy.owner_defaults = new_owner.defaults();
        copy.original_owner = Some(self.original_owner.unwrap_or(self.owner));
        copy.inherited = true;
        copy.clear_ownership();
        copy
    }

    /// Relationship currently owning this attribute.
    pub fn owning_relationship(&self) -> Option<RelationshipId> {
        self.owning_relationship
    }

    /// Name of the relationship used to navigate back to the owner.
    pub fn owning_relationship_name(&self) -> Option<&str> {
        self.owning_relationship_name.as_deref()
    }

    /// Reverse-relationship triple recorded by the owner.
    pub fn reverse_relationship(&self) -> Option<&ReverseRelationship> {
        self.reverse_relationship.as_ref()
    }

    pub(crate) fn install_ownership(
        &mut self,
        relationship: RelationshipId,
        owning_relationship_name: Option<String>,
        reverse_relationship: Option<ReverseRelationship>,
    ) {
        self.owning_relationship = Some(relationship);
        self.owning_relationship_name = owning_relationship_name;
        self.reverse_relationship = reverse_relationship;
    }

    pub(crate) fn clear_ownership(&mut self) {
        self.owning_relationship = None;
        self.owning_relationship_name = None;
        self.reverse_relationship = None;
    }

    pub(crate) fn enumeration_settings_mut(&mut self) -> Option<&mut EnumerationSettings> {
        match &mut self.kind {
            AttributeKind::Enumeration(settings) => Some(settings),
            _ => None,
        }
    }
}

fn backfill<T: Clone>(mine: &mut Option<T>, theirs: &Option<T>) {
    if mine.is_none() {
        mine.clone_from(theirs);
    }
}

fn enumeration_class(settings: &EnumerationSettings) -> &str {
    settings
        .enumeration_class
        .as_deref()
        .unwrap_or(settings.enumeration.as_str())
}
