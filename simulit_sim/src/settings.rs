//! Worker settings, declared as ordinary variables.
//!
//! The host edits them through the same [`Inspector`](simulit_core::Inspector)
//! machinery as simulation properties, then reads them back into a
//! [`WorkerConfig`] when a run starts.

use simulit_core::{Variable, VariableError, VariableGroup, WatchList};

pub const GROUP: &str = "Run";
pub const ITERATIONS: &str = "Iterations";
pub const SEED: &str = "Seed";
pub const DELAY: &str = "Delay";

pub const MIN_ITERATIONS: i64 = 1;
pub const MAX_ITERATIONS: i64 = 10_000_000;
pub const MAX_DELAY_MS: i64 = 3000;

const DEFAULT_ITERATIONS: i64 = 1;
const DEFAULT_SEED: i64 = 0;
const DEFAULT_DELAY_MS: i64 = 20;

/// Declares the `Run` group.
pub fn worker_settings() -> VariableGroup {
    VariableGroup::new(GROUP)
        .describe("How the worker drives the simulation")
        .with(
            Variable::new(ITERATIONS, "Number of iterations to run", DEFAULT_ITERATIONS)
                .with_filter(|n: &i64| (MIN_ITERATIONS..=MAX_ITERATIONS).contains(n)),
        )
        .with(Variable::new(
            SEED,
            "Random seed, 0 picks a non-reproducible one",
            DEFAULT_SEED,
        ))
        .with(
            Variable::new(DELAY, "Pause between iterations in milliseconds", DEFAULT_DELAY_MS)
                .with_filter(|ms: &i64| (0..=MAX_DELAY_MS).contains(ms)),
        )
}

/// What the worker loop needs to know about a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Upper bound on `run()` calls
    pub iterations: u64,

    /// 0 selects a non-deterministic generator
    pub seed: u64,

    /// Delay between iterations in milliseconds
    pub delay_ms: u64,
}

impl WorkerConfig {
    /// Reads a watch of [`worker_settings`].
    ///
    /// A negative seed keeps its bit pattern, so every integer the user can
    /// enter names a distinct stream.
    pub fn from_watch(watch: &WatchList) -> Result<Self, VariableError> {
        let iterations = watch.get::<i64>(ITERATIONS)?.max(MIN_ITERATIONS);
        let seed = watch.get::<i64>(SEED)?;
        let delay_ms = watch.get::<i64>(DELAY)?.clamp(0, MAX_DELAY_MS);
        Ok(Self {
            iterations: iterations as u64,
            seed: seed as u64,
            delay_ms: delay_ms as u64,
        })
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS as u64,
            seed: DEFAULT_SEED as u64,
            delay_ms: DEFAULT_DELAY_MS as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulit_core::Inspector;

    #[test]
    fn test_defaults_match_config() {
        let inspector = Inspector::new(worker_settings()).unwrap();
        let config = WorkerConfig::from_watch(inspector.watch()).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.iterations, 1);
        assert_eq!(config.seed, 0);
        assert_eq!(config.delay_ms, 20);
    }

    #[test]
    fn test_bounds_are_enforced() {
        let mut inspector = Inspector::new(worker_settings()).unwrap();
        assert!(!inspector.set_value(ITERATIONS, 0i64).unwrap());
        assert!(!inspector.set_value(ITERATIONS, 10_000_001i64).unwrap());
        assert!(inspector.set_value(ITERATIONS, 10_000_000i64).unwrap());
        assert!(!inspector.set_value(DELAY, -1i64).unwrap());
        assert!(!inspector.set_value(DELAY, 3001i64).unwrap());
        assert!(inspector.set_value(DELAY, 0i64).unwrap());
        assert!(inspector.set_value(SEED, -5i64).unwrap());

        let config = WorkerConfig::from_watch(inspector.watch()).unwrap();
        assert_eq!(config.iterations, 10_000_000);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.seed, (-5i64) as u64);
    }

    #[test]
    fn test_full_names() {
        let inspector = Inspector::new(worker_settings()).unwrap();
        let names: Vec<&str> = inspector.watch().names().collect();
        assert_eq!(names, vec!["Run:Iterations", "Run:Seed", "Run:Delay"]);
    }

    #[test]
    fn test_builder() {
        let config = WorkerConfig::default()
            .with_iterations(5)
            .with_seed(42)
            .with_delay(0);
        assert_eq!(
            config,
            WorkerConfig {
                iterations: 5,
                seed: 42,
                delay_ms: 0
            }
        );
    }
}
