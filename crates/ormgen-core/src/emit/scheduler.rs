//! Emission scheduling.
//!
//! Objects sharing a superclass hierarchy share generated resources, so they
//! form one slot and are emitted by one worker, parents first. Slots are
//! handed out to a bounded pool of scoped worker threads.

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::cache::TemplateCache;
use crate::config::{GeneratorConfig, MIN_EMISSION_WORKERS};
use crate::error::{Error, Result};
use crate::model::{ObjectId, ResolvedGraph};

/// Turns one resolved object into generated output.
pub trait Emitter: Send + Sync {
    /// Emit one object.
    fn emit(&self, graph: &ResolvedGraph, object: ObjectId, cache: &TemplateCache) -> Result<()>;
}

/// Outcome of a successful emission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionSummary {
    /// Objects emitted.
    pub emitted: usize,
    /// Resource slots processed.
    pub slots: usize,
    /// Templates loaded into the run's cache.
    pub templates_loaded: usize,
}

/// Runs an [`Emitter`] over every persistent object of a resolved graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionScheduler {
    workers: usize,
}

impl EmissionScheduler {
    /// Create a scheduler with the given number of workers.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(MIN_EMISSION_WORKERS),
        }
    }

    /// Create a scheduler sized from the generator configuration.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.emission_workers)
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Persistent objects grouped by hierarchy root. Imported objects are
    /// left out.
    ///
    /// Slots are ordered by root name; within a slot objects are ordered by
    /// depth, then by fully-qualified name.
    pub fn slots(graph: &ResolvedGraph) -> Vec<Vec<ObjectId>> {
        let mut slots: BTreeMap<String, Vec<(usize, String, ObjectId)>> = BTreeMap::new();
        for object in graph.plain_objects().filter(|o| !o.imported) {
            let root = graph.object(graph.hierarchy_root(object.id())).fully_qualified_name();
            slots.entry(root).or_default().push((
                graph.depth(object.id()),
                object.fully_qualified_name(),
                object.id(),
            ));
        }
        slots
            .into_values()
            .map(|mut members| {
                members.sort();
                members.into_iter().map(|(_, _, id)| id).collect()
            })
            .collect()
    }

    /// Emit every persistent object of `graph`.
    ///
    /// All failures are collected; the run fails with
    /// [`Error::EmissionFailed`] if any object failed.
    pub fn run(
        &self,
        graph: Arc<ResolvedGraph>,
        emitter: Arc<dyn Emitter>,
    ) -> Result<EmissionSummary> {
        let slots = Self::slots(&graph);
        let slot_count = slots.len();
        let workers = self.workers.min(slot_count).max(MIN_EMISSION_WORKERS);
        let queue = Mutex::new(VecDeque::from(slots));
        let failures = Mutex::new(Vec::new());
        let emitted = AtomicUsize::new(0);
        let cache = TemplateCache::new();

        tracing::info!(slots = slot_count, workers, "starting emission");

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let (graph, emitter) = (&graph, &emitter);
                let (queue, failures, emitted, cache) = (&queue, &failures, &emitted, &cache);
                scope.spawn(move || loop {
                    let Some(slot) = queue.lock().pop_front() else {
                        break;
                    };
                    for object in slot {
                        match emitter.emit(graph, object, cache) {
                            Ok(()) => {
                                emitted.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => {
                                let name = graph.object(object).fully_qualified_name();
                                tracing::warn!(
                                    worker,
                                    object = %name,
                                    error = %err,
                                    "emission failed"
                                );
                                failures.lock().push(format!("{}: {}", name, err));
                            }
                        }
                    }
                });
            }
        });

        let mut failures = failures.into_inner();
        if !failures.is_empty() {
            failures.sort();
            return Err(Error::EmissionFailed { failures });
        }

        let summary = EmissionSummary {
            emitted: emitted.into_inner(),
            slots: slot_count,
            templates_loaded: cache.load_count(),
        };
        tracing::info!(
            emitted = summary.emitted,
            templates = summary.templates_loaded,
            "emission complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_floor() {
        assert_eq!(EmissionScheduler::new(0).workers(), 1);
        let config = GeneratorConfig::default().with_emission_workers(3);
        assert_eq!(EmissionScheduler::from_config(&config).workers(), 3);
    }
}
