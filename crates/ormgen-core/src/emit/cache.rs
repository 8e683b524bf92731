//! Template cache shared by the workers of one emission run.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Loaded templates keyed by name.
///
/// One cache is created per [`EmissionScheduler::run`](super::EmissionScheduler::run)
/// and dropped with it.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: DashMap<String, Arc<str>>,
    loads: AtomicUsize,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a template, loading it on first use.
    ///
    /// The loader runs at most once per name. Workers racing on the same name
    /// wait on the shard lock and observe the first load. The loader must not
    /// call back into the cache.
    pub fn get_or_load<F>(&self, name: &str, load: F) -> Result<Arc<str>>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(template) = self.templates.get(name) {
            return Ok(Arc::clone(template.value()));
        }
        match self.templates.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let loaded: Arc<str> = Arc::from(load()?);
                self.loads.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(entry.insert(loaded).value()))
            }
        }
    }

    /// Get a template that is already loaded.
    pub fn get(&self, name: &str) -> Option<Arc<str>> {
        self.templates.get(name).map(|t| Arc::clone(t.value()))
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Number of times a loader was invoked.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
