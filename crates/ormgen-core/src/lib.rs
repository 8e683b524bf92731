//! ormgen core - metamodel resolution for the ormgen code generator.
//!
//! This crate turns parsed object-relational declarations into a resolved,
//! inheritance-aware object graph ready for template emission.

pub mod config;
pub mod emit;
pub mod error;
pub mod logger;
pub mod metamodel;
pub mod model;
pub mod resolve;

pub use config::GeneratorConfig;
pub use emit::{EmissionScheduler, EmissionSummary, Emitter, TemplateCache};
pub use error::{Error, Result};
pub use logger::{LogLevel, LogRecord, Logger, MemoryLogger, TracingLogger};
pub use metamodel::Metamodel;
pub use model::{
    Attribute, AttributeId, AttributeKind, Cardinality, DataType, ObjectId, ObjectKind,
    ObjectType, Relationship, RelationshipId, ResolvedGraph, TimezoneConversion,
};
pub use resolve::{
    Issue, IssueKind, Phase, Resolver, Severity, ValidationReport, ValidationReporter,
};
