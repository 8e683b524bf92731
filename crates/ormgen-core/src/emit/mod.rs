//! Emission of the resolved graph.
//!
//! Template rendering itself lives outside this crate behind the [`Emitter`]
//! trait. This module schedules emitters over the resolved objects and owns
//! the per-run [`TemplateCache`].

mod cache;
mod scheduler;

pub use cache::TemplateCache;
pub use scheduler::{EmissionScheduler, EmissionSummary, Emitter};
