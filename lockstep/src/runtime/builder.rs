use super::Runtime;
use crate::error::Result;

/// Default number of task polls between two timer sweeps.
const DEFAULT_TICK_BUDGET: usize = 61;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime. Currently, it supports configuring how many
/// tasks are polled before expired timers are checked again.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .tick_budget(32)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct RuntimeBuilder {
    /// Maximum number of polls between two timer sweeps.
    tick_budget: usize,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            tick_budget: DEFAULT_TICK_BUDGET,
        }
    }

    /// Sets how many tasks are polled before timers are swept again.
    ///
    /// A smaller budget makes timers fire closer to their deadline when
    /// many tasks are busy; a larger one favours throughput.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn tick_budget(mut self, n: usize) -> Self {
        assert!(n > 0, "tick_budget must be > 0");

        self.tick_budget = n;
        self
    }

    /// Builds the runtime, reporting OS setup failures.
    pub fn try_build(self) -> Result<Runtime> {
        Runtime::new(self.tick_budget)
    }

    /// Builds the runtime with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if the OS parking primitive cannot be created.
    pub fn build(self) -> Runtime {
        match self.try_build() {
            Ok(runtime) => runtime,
            Err(err) => panic!("failed to build the runtime: {err}"),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
