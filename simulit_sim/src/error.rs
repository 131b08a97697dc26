//! Error types for simulations and the host that runs them.

use simulit_core::VariableError;
use thiserror::Error;

/// Failure raised by simulation code during setup, run or teardown.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Free-form failure reported by the simulation itself
    #[error("{0}")]
    Failed(String),

    /// A property holds a value the simulation cannot work with
    #[error("Invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error(transparent)]
    Variable(#[from] VariableError),
}

impl SimulationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors raised by the hosting side: registry, sessions, runners, export.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unknown simulation module '{0}'")]
    UnknownModule(String),

    #[error("Simulation module '{0}' is already registered")]
    DuplicateModule(String),

    /// A `key=value` assignment that could not be applied
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawn(std::io::Error),

    #[error("Worker thread panicked outside simulation code")]
    WorkerPanicked,

    #[error("Worker did not finish within {0:?}")]
    Unresponsive(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
