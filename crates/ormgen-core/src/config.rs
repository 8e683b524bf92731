//! Generator configuration.

use crate::model::types::TimezoneConversion;

/// Default for final getters on objects that do not override it.
pub const DEFAULT_FINAL_GETTERS: bool = false;

/// Lower bound on emission workers.
pub const MIN_EMISSION_WORKERS: usize = 1;

fn default_emission_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(4)
        .max(MIN_EMISSION_WORKERS)
}

/// Settings shared by every object of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Getters are final unless an object or attribute says otherwise.
    pub default_final_getters: bool,

    /// Timezone policy for as-of attributes that leave it unset.
    pub default_timezone_conversion: TimezoneConversion,

    /// Number of emission worker threads.
    pub emission_workers: usize,

    /// Treat validation warnings as errors.
    pub warnings_as_errors: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_final_getters: DEFAULT_FINAL_GETTERS,
            default_timezone_conversion: TimezoneConversion::None,
            emission_workers: default_emission_workers(),
            warnings_as_errors: false,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the final getter default.
    pub fn with_default_final_getters(mut self, final_getters: bool) -> Self {
        self.default_final_getters = final_getters;
        self
    }

    /// Set the default timezone policy.
    pub fn with_default_timezone_conversion(mut self, conversion: TimezoneConversion) -> Self {
        self.default_timezone_conversion = conversion;
        self
    }

    /// Set the number of emission workers.
    pub fn with_emission_workers(mut self, workers: usize) -> Self {
        self.emission_workers = workers.max(MIN_EMISSION_WORKERS);
        self
    }

    /// Escalate warnings to errors.
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }
}
