//! The worker loop: setup, paced iterations, teardown.
//!
//! ```text
//! NotStarted ─► SettingUp ─► Running ─► TearingDown ─► Done
//!                   │           │            │
//!                   └───────────┴────────────┴──► Errored
//! ```
//!
//! Every iteration publishes a [`Snapshot`] of the statistics map over the
//! event channel. Simulation failures, whether returned or panicked, never
//! escape the worker: they are reported as [`WorkerEvent::Error`] and end
//! the run. Teardown runs exactly once whenever setup succeeded.

use crate::error::SimulationError;
use crate::settings::WorkerConfig;
use crate::simulation::Simulation;
use crossbeam::channel::Sender;
use serde::Serialize;
use simulit_core::{Snapshot, VariableMap, WatchList};
use simulit_env::{generator, Controller};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Lifecycle call a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Run,
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Run => "run",
            Stage::Teardown => "teardown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    NotStarted,
    SettingUp,
    Running,
    TearingDown,
    Done,
    Errored,
}

/// Outcome of one worker run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Successful `run()` calls
    pub iterations_completed: u64,

    /// `Done`, or `Errored` if any stage failed
    pub phase: WorkerPhase,

    /// The controller was stopped before the budget ran out
    pub stopped: bool,

    pub teardown_ran: bool,
}

/// Messages from the worker thread to its owner.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Statistics after the given (1-based) iteration
    Progress { iteration: u64, snapshot: Snapshot },

    Error { stage: Stage, message: String },

    /// Always the last event of a run
    Finished(WorkerReport),
}

/// Drives one simulation instance on the current thread.
pub struct Worker {
    simulation: Box<dyn Simulation>,
    controller: Arc<Controller>,
    properties: WatchList,
    statistics: VariableMap,
    config: WorkerConfig,
    events: Sender<WorkerEvent>,
    phase: WorkerPhase,
}

impl Worker {
    pub fn new(
        simulation: Box<dyn Simulation>,
        controller: Arc<Controller>,
        properties: WatchList,
        statistics: VariableMap,
        config: WorkerConfig,
        events: Sender<WorkerEvent>,
    ) -> Self {
        Self {
            simulation,
            controller,
            properties,
            statistics,
            config,
            events,
            phase: WorkerPhase::NotStarted,
        }
    }

    /// Runs to completion, blocking in the controller until started.
    pub fn run(mut self) -> WorkerReport {
        self.controller.set_wait_time(self.config.delay_ms);
        let mut generator = generator::for_seed(self.config.seed);
        let mut report = WorkerReport {
            iterations_completed: 0,
            phase: WorkerPhase::NotStarted,
            stopped: false,
            teardown_ran: false,
        };

        self.enter(WorkerPhase::SettingUp);
        let setup = guarded(|| {
            self.simulation
                .setup(&self.properties, &mut self.statistics)
        });
        if let Err(message) = setup {
            self.fail(Stage::Setup, message);
            return self.finish(report);
        }

        self.enter(WorkerPhase::Running);
        if self.controller.wait_for_start() {
            info!(
                "Worker: running up to {} iterations (seed {}, delay {}ms)",
                self.config.iterations,
                generator.seed(),
                self.config.delay_ms
            );
            while report.iterations_completed < self.config.iterations {
                let step = guarded(|| self.simulation.run(&mut self.statistics, &mut *generator));
                if let Err(message) = step {
                    self.fail(Stage::Run, message);
                    break;
                }
                report.iterations_completed += 1;
                let _ = self.events.send(WorkerEvent::Progress {
                    iteration: report.iterations_completed,
                    snapshot: self.statistics.snapshot(),
                });
                if !self.controller.wait() {
                    report.stopped = true;
                    break;
                }
            }
        } else {
            debug!("Worker: stopped before start");
            report.stopped = true;
        }

        self.enter(WorkerPhase::TearingDown);
        report.teardown_ran = true;
        if let Err(message) = guarded(|| self.simulation.teardown()) {
            self.fail(Stage::Teardown, message);
        }
        self.finish(report)
    }

    fn enter(&mut self, phase: WorkerPhase) {
        // Errored is absorbing
        if self.phase != WorkerPhase::Errored {
            debug!("Worker: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn fail(&mut self, stage: Stage, message: String) {
        error!("Worker: {} failed: {}", stage, message);
        self.phase = WorkerPhase::Errored;
        let _ = self.events.send(WorkerEvent::Error { stage, message });
    }

    fn finish(mut self, mut report: WorkerReport) -> WorkerReport {
        self.enter(WorkerPhase::Done);
        report.phase = self.phase;
        info!(
            "Worker: finished after {} iterations ({:?}{})",
            report.iterations_completed,
            report.phase,
            if report.stopped { ", stopped" } else { "" }
        );
        let _ = self.events.send(WorkerEvent::Finished(report.clone()));
        report
    }
}

/// Runs a lifecycle call, turning both errors and panics into a message.
fn guarded<F>(call: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), SimulationError>,
{
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
