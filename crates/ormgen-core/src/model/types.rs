//! Core type definitions for the metamodel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic data types an attribute can carry.
///
/// Names follow the metamodel's declared type spelling (`int`, `String`,
/// `Timestamp`, `byte[]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean value.
    #[serde(rename = "boolean")]
    Boolean,
    /// 8-bit signed integer.
    #[serde(rename = "byte")]
    Byte,
    /// 16-bit character.
    #[serde(rename = "char")]
    Char,
    /// 16-bit signed integer.
    #[serde(rename = "short")]
    Short,
    /// 32-bit signed integer.
    #[serde(rename = "int")]
    Int,
    /// 64-bit signed integer.
    #[serde(rename = "long")]
    Long,
    /// 32-bit floating point.
    #[serde(rename = "float")]
    Float,
    /// 64-bit floating point.
    #[serde(rename = "double")]
    Double,
    /// Text.
    #[serde(rename = "String")]
    String,
    /// Calendar date without time.
    #[serde(rename = "Date")]
    Date,
    /// Point in time.
    #[serde(rename = "Timestamp")]
    Timestamp,
    /// Time of day.
    #[serde(rename = "Time")]
    Time,
    /// Fixed-precision decimal.
    #[serde(rename = "BigDecimal")]
    BigDecimal,
    /// Binary data.
    #[serde(rename = "byte[]")]
    ByteArray,
}

impl DataType {
    /// All data types, in declaration order.
    pub const ALL: [DataType; 14] = [
        DataType::Boolean,
        DataType::Byte,
        DataType::Char,
        DataType::Short,
        DataType::Int,
        DataType::Long,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Date,
        DataType::Timestamp,
        DataType::Time,
        DataType::BigDecimal,
        DataType::ByteArray,
    ];

    /// Declared type name as written in the metamodel.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Char => "char",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "String",
            DataType::Date => "Date",
            DataType::Timestamp => "Timestamp",
            DataType::Time => "Time",
            DataType::BigDecimal => "BigDecimal",
            DataType::ByteArray => "byte[]",
        }
    }

    /// Look up a type by its declared name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Check if this type is textual.
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::String)
    }

    /// Only strings and timestamps are interned in a value pool.
    pub fn can_be_pooled(&self) -> bool {
        matches!(self, DataType::String | DataType::Timestamp)
    }

    /// Types that can be handed to the database as a string literal.
    pub fn can_be_set_as_string(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }

    /// Suffix of the `write*`/`read*` methods used by object streams.
    pub fn io_type(&self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::Byte => "Byte",
            DataType::Char => "Char",
            DataType::Short => "Short",
            DataType::Int => "Int",
            DataType::Long => "Long",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::String
            | DataType::Date
            | DataType::Timestamp
            | DataType::Time
            | DataType::BigDecimal
            | DataType::ByteArray => "Object",
        }
    }

    /// Cast prefix applied to a value read back from an object stream.
    pub fn io_cast(&self) -> &'static str {
        match self {
            DataType::String => "(String) ",
            DataType::Date => "(Date) ",
            DataType::Timestamp => "(Timestamp) ",
            DataType::Time => "(Time) ",
            DataType::BigDecimal => "(BigDecimal) ",
            DataType::ByteArray => "(byte[]) ",
            _ => "",
        }
    }

    /// Finder attribute class used by generated finders.
    pub fn finder_attribute_type(&self) -> &'static str {
        match self {
            DataType::Boolean => "BooleanAttribute",
            DataType::Byte => "ByteAttribute",
            DataType::Char => "CharAttribute",
            DataType::Short => "ShortAttribute",
            DataType::Int => "IntegerAttribute",
            DataType::Long => "LongAttribute",
            DataType::Float => "FloatAttribute",
            DataType::Double => "DoubleAttribute",
            DataType::String => "StringAttribute",
            DataType::Date => "DateAttribute",
            DataType::Timestamp => "TimestampAttribute",
            DataType::Time => "TimeAttribute",
            DataType::BigDecimal => "BigDecimalAttribute",
            DataType::ByteArray => "ByteArrayAttribute",
        }
    }

    /// Check whether a literal value parses as this type.
    ///
    /// Only the types used for persisted enumeration values are checked
    /// strictly; everything else is accepted.
    pub fn accepts_literal(&self, literal: &str) -> bool {
        match self {
            DataType::Int => literal.trim().parse::<i32>().is_ok(),
            DataType::Long => literal.trim().parse::<i64>().is_ok(),
            DataType::Short => literal.trim().parse::<i16>().is_ok(),
            DataType::Byte => literal.trim().parse::<i8>().is_ok(),
            DataType::Boolean => matches!(literal.trim(), "true" | "false"),
            DataType::Char => literal.chars().count() == 1,
            _ => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timezone conversion policy for timestamp attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimezoneConversion {
    /// Values are stored as-is.
    #[default]
    None,
    /// Convert to UTC on the way in and out.
    ConvertToUtc,
    /// Convert to the database's timezone.
    ConvertToDatabaseTimezone,
}

impl TimezoneConversion {
    /// Whether no conversion is performed.
    pub fn is_none(&self) -> bool {
        matches!(self, TimezoneConversion::None)
    }
}
