//! The plugin boundary: what a simulation module provides to the host.

use crate::error::SimulationError;
use simulit_core::{VariableGroup, VariableMap, WatchList};
use simulit_env::NumberGenerator;

/// One running instance of a simulation.
///
/// An instance lives entirely on the worker thread. The worker calls
/// [`setup`](Self::setup) once, [`run`](Self::run) once per iteration and,
/// if setup succeeded, [`teardown`](Self::teardown) exactly once.
/// Panics are caught by the worker and treated like returned errors.
pub trait Simulation: Send {
    /// Reads the configured properties and prepares the statistics map.
    fn setup(
        &mut self,
        properties: &WatchList,
        statistics: &mut VariableMap,
    ) -> Result<(), SimulationError>;

    /// Performs one iteration, writing results into `statistics`.
    fn run(
        &mut self,
        statistics: &mut VariableMap,
        generator: &mut dyn NumberGenerator,
    ) -> Result<(), SimulationError>;

    fn teardown(&mut self) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// A named factory of simulation instances and their declared trees.
///
/// The declared trees are built fresh on every call, so the owner thread
/// and the worker thread never share one.
pub trait SimulationModule: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn create_instance(&self) -> Box<dyn Simulation>;

    /// Configuration the user edits before a run.
    fn declared_properties(&self) -> VariableGroup;

    /// Results the simulation updates on every iteration.
    fn declared_statistics(&self) -> VariableGroup;
}
