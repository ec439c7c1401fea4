//! Generation settings.

use std::num::NonZeroUsize;
use std::thread;

use accessors_jvm::DEFAULT_MODULE_NAME;

/// Settings for one generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Write workers. `0` uses the available parallelism.
    pub jobs: usize,
    /// Write requests that may be queued before emitters block.
    pub write_queue_capacity: usize,
    /// Module the binary accessors are registered under.
    pub module_name: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            jobs: 0,
            write_queue_capacity: 64,
            module_name: DEFAULT_MODULE_NAME.to_owned(),
        }
    }
}

impl GenerateConfig {
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub fn with_write_queue_capacity(mut self, capacity: usize) -> Self {
        self.write_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    /// Number of write workers to spawn, never zero.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.jobs
        }
    }

    /// Queue bound, never zero so a send can always make progress.
    pub fn effective_queue_capacity(&self) -> usize {
        self.write_queue_capacity.max(1)
    }
}
