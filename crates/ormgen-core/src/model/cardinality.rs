//! Relationship cardinality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Shape of a relationship, seen from its owning object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// One owner instance relates to at most one related instance.
    OneToOne,
    /// One owner instance relates to many related instances.
    OneToMany,
    /// Many owner instances relate to one related instance.
    ManyToOne,
    /// Many owner instances relate to many related instances.
    ManyToMany,
}

impl Cardinality {
    /// All four cardinalities.
    pub const ALL: [Cardinality; 4] = [
        Cardinality::OneToOne,
        Cardinality::OneToMany,
        Cardinality::ManyToOne,
        Cardinality::ManyToMany,
    ];

    /// Canonical lookup key.
    pub fn key(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }

    /// The cardinality of the same relationship seen from the other side.
    pub fn reverse(&self) -> Self {
        match self {
            Cardinality::OneToOne => Cardinality::OneToOne,
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::ManyToMany => Cardinality::ManyToMany,
        }
    }

    /// Whether the owning side is "many".
    pub fn is_from_many(&self) -> bool {
        matches!(self, Cardinality::ManyToOne | Cardinality::ManyToMany)
    }

    /// Whether the related side is "many".
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }

    /// Check if this is a many-to-many cardinality.
    pub fn is_many_to_many(&self) -> bool {
        self.is_from_many() && self.is_to_many()
    }
}

impl FromStr for Cardinality {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .ok_or_else(|| Error::UnknownCardinality(key.to_string()))
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
