//! Core error types.

use thiserror::Error;

use crate::model::attribute::Capability;

/// Errors raised by the resolution engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Cardinality lookup by a key outside the four canonical values.
    #[error("unknown cardinality '{0}' (expected one-to-one, one-to-many, many-to-one or many-to-many)")]
    UnknownCardinality(String),

    /// A capability was requested from an attribute variant that cannot provide it.
    #[error("attribute '{attribute}' does not support {capability}")]
    UnsupportedCapability {
        /// Name of the attribute.
        attribute: String,
        /// The capability that was requested.
        capability: Capability,
    },

    /// Lookup of an object type that is not part of the graph.
    #[error("unknown object type '{0}'")]
    UnknownObject(String),

    /// Resolution collected one or more hard errors.
    #[error("one or more error(s) while validating the metamodel ({error_count} error(s)):\n{report}")]
    GenerationFailed {
        /// Number of hard errors collected.
        error_count: usize,
        /// Consolidated, human-readable report.
        report: String,
    },

    /// A single emitter failure.
    #[error("emission error: {0}")]
    Emission(String),

    /// One or more emitters failed during a scheduled run.
    #[error("emission failed for {} object(s): {}", failures.len(), failures.join("; "))]
    EmissionFailed {
        /// One entry per failed object, prefixed by its fully-qualified name.
        failures: Vec<String>,
    },

    /// Malformed metamodel input handed over by the parser.
    #[error("metamodel error: {0}")]
    Metamodel(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Metamodel(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
