//! Simulit Simulation Host
//!
//! Runs independently authored simulation modules on a worker thread under
//! start/pause/stop control, and brings their statistics back to the owner
//! as immutable snapshots.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────── owner thread ─────────────────────┐
//! │  Session                                              │
//! │   ├─ properties  Inspector ──watch()──┐               │
//! │   ├─ settings    Inspector ──config────┤               │
//! │   └─ statistics  Inspector ◄──apply────┼──────┐        │
//! │                                       │      │        │
//! │  Runner ── Arc<Controller> ───────────┼──┐   │        │
//! └───────────────────────────────────────┼──┼───┼────────┘
//!                                         ▼  ▼   │ WorkerEvent
//! ┌──────────────────── worker thread ──────────┴─────────┐
//! │  Worker: setup ─► (run ─► publish ─► wait)* ─► teardown│
//! │          Simulation + VariableMap + NumberGenerator   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use simulit_sim::{ModuleRegistry, Session};
//! use std::time::Duration;
//!
//! let registry = ModuleRegistry::with_builtin();
//! let mut session = Session::new(registry.get("monte-carlo-pi")?)?;
//! session.assign("Iterations", "1000")?;
//! session.start()?;
//! let report = session.pump_blocking(Duration::from_secs(60));
//! ```

mod error;
mod exporter;
pub mod modules;
mod registry;
mod runner;
mod session;
pub mod settings;
mod simulation;
mod worker;

pub use error::{HostError, SimulationError};
pub use exporter::{RunExport, RunFrame};
pub use registry::{slug, ModuleRegistry};
pub use runner::Runner;
pub use session::Session;
pub use settings::WorkerConfig;
pub use simulation::{Simulation, SimulationModule};
pub use worker::{Stage, Worker, WorkerEvent, WorkerPhase, WorkerReport};
