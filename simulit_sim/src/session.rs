//! One module, its editable trees and at most one live run.
//!
//! A [`Session`] is what an interactive host drives: the user edits the
//! module's properties and the worker settings, then starts, pauses,
//! resumes, stops or restarts the simulation. Worker progress is pulled
//! in with [`pump`](Session::pump) and lands in the statistics
//! [`Inspector`], whose subscribers see every update.

use crate::error::HostError;
use crate::exporter::RunExport;
use crate::registry::slug;
use crate::runner::Runner;
use crate::settings::{worker_settings, WorkerConfig};
use crate::simulation::SimulationModule;
use crate::worker::{Stage, WorkerEvent, WorkerReport};
use simulit_core::{Inspector, ValueType, VariableError, VariableMap};
use simulit_env::RunState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct Session {
    module: Arc<dyn SimulationModule>,

    /// Module configuration, edited before a run
    properties: Inspector,

    /// Worker settings (`Run` group)
    settings: Inspector,

    /// Last published statistics of the current or previous run
    statistics: Inspector,

    runner: Option<Runner>,
    report: Option<WorkerReport>,
    errors: Vec<(Stage, String)>,

    recording: bool,
    export: Option<RunExport>,
}

impl Session {
    pub fn new(module: Arc<dyn SimulationModule>) -> Result<Self, HostError> {
        Ok(Self {
            properties: Inspector::new(module.declared_properties())?,
            settings: Inspector::new(worker_settings())?,
            statistics: Inspector::new(module.declared_statistics())?,
            module,
            runner: None,
            report: None,
            errors: Vec::new(),
            recording: false,
            export: None,
        })
    }

    pub fn module(&self) -> &Arc<dyn SimulationModule> {
        &self.module
    }

    pub fn properties(&self) -> &Inspector {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Inspector {
        &mut self.properties
    }

    pub fn settings(&self) -> &Inspector {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Inspector {
        &mut self.settings
    }

    pub fn statistics(&self) -> &Inspector {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut Inspector {
        &mut self.statistics
    }

    /// Worker settings as the next run would see them.
    pub fn config(&self) -> Result<WorkerConfig, HostError> {
        Ok(WorkerConfig::from_watch(self.settings.watch())?)
    }

    /// Applies a textual assignment to a property, or else a setting.
    ///
    /// `key` is resolved like any variable name (full path or unique
    /// suffix); `text` is parsed according to the leaf's declared type.
    pub fn assign(&mut self, key: &str, text: &str) -> Result<(), HostError> {
        let (value_type, inspector) = match value_type_of(&self.properties, key) {
            Ok(value_type) => (value_type, &mut self.properties),
            Err(err) if err.is_lookup() => match value_type_of(&self.settings, key) {
                Ok(value_type) => (value_type, &mut self.settings),
                Err(_) => {
                    return Err(HostError::InvalidSetting {
                        key: key.to_string(),
                        reason: err.to_string(),
                    })
                }
            },
            Err(err) => return Err(err.into()),
        };

        let value = value_type.parse(text).ok_or_else(|| HostError::InvalidSetting {
            key: key.to_string(),
            reason: format!("'{}' is not a valid {}", text, value_type),
        })?;
        if inspector.set_value(key, value)? {
            debug!("Session: {} = {}", key, text);
            Ok(())
        } else {
            Err(HostError::InvalidSetting {
                key: key.to_string(),
                reason: format!("value '{}' rejected", text),
            })
        }
    }

    /// Parses and applies `key=value`.
    pub fn assign_pair(&mut self, assignment: &str) -> Result<(), HostError> {
        let (key, text) = assignment
            .split_once('=')
            .ok_or_else(|| HostError::InvalidSetting {
                key: assignment.to_string(),
                reason: "expected key=value".to_string(),
            })?;
        self.assign(key.trim(), text)
    }

    /// Records every event of the following runs into an export.
    pub fn enable_recording(&mut self, enabled: bool) {
        self.recording = enabled;
    }

    /// Recording of the current or last run, if recording was enabled.
    pub fn export(&self) -> Option<&RunExport> {
        self.export.as_ref()
    }

    /// Starts a fresh run, or resumes a paused one.
    ///
    /// Returns false if a run is already going.
    pub fn start(&mut self) -> Result<bool, HostError> {
        if let Some(runner) = self.live_runner() {
            if !runner.controller().is_stopped() {
                let resumed = runner.controller().start();
                if resumed {
                    info!("Session: resumed {}", self.module.name());
                }
                return Ok(resumed);
            }
        }
        self.retire_runner();

        let config = self.config()?;
        let statistics = VariableMap::new(self.module.declared_statistics())?;
        self.export = self.recording.then(|| {
            let columns = statistics.full_names().map(str::to_string).collect();
            RunExport::new(self.module.name(), config.seed, columns)
        });
        self.statistics.reset();
        self.report = None;
        self.errors.clear();

        let runner = Runner::spawn(
            &slug(self.module.name()),
            self.module.create_instance(),
            self.properties.watch().clone(),
            statistics,
            config,
        )?;
        runner.controller().start();
        info!(
            "Session: started {} ({} iterations, seed {}, delay {}ms)",
            self.module.name(),
            config.iterations,
            config.seed,
            config.delay_ms
        );
        self.runner = Some(runner);
        Ok(true)
    }

    pub fn pause(&mut self) -> bool {
        let paused = self
            .live_runner()
            .map_or(false, |runner| runner.controller().pause());
        if paused {
            info!("Session: paused {}", self.module.name());
        }
        paused
    }

    /// Stops the current run; the worker still tears down.
    pub fn stop(&mut self) -> bool {
        let stopped = self
            .live_runner()
            .map_or(false, |runner| runner.controller().stop());
        if stopped {
            info!("Session: stopped {}", self.module.name());
        }
        stopped
    }

    /// Stops the current run, if any, and starts a fresh one.
    pub fn restart(&mut self) -> Result<bool, HostError> {
        self.stop();
        self.start()
    }

    /// Applies every pending worker event; returns how many there were.
    pub fn pump(&mut self) -> usize {
        let Some(events) = self.runner.as_ref().map(|runner| runner.events().clone()) else {
            return 0;
        };
        let mut handled = 0;
        for event in events.try_iter() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Applies events until the run finishes or `timeout` elapses.
    ///
    /// Returns the final report, or `None` on timeout.
    pub fn pump_blocking(&mut self, timeout: Duration) -> Option<WorkerReport> {
        let events = self.runner.as_ref()?.events().clone();
        let deadline = Instant::now() + timeout;
        while self.report.is_none() {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match events.recv_timeout(remaining) {
                Ok(event) => self.handle(event),
                Err(_) => return None,
            }
        }
        self.report.clone()
    }

    /// Run state as a user sees it: a finished worker reads as `Ready`.
    pub fn state(&self) -> RunState {
        match self.live_runner() {
            Some(runner) => runner.controller().state(),
            None => RunState::Ready,
        }
    }

    /// Report of the last finished run, once pumped.
    pub fn report(&self) -> Option<&WorkerReport> {
        self.report.as_ref()
    }

    pub fn last_error(&self) -> Option<(Stage, &str)> {
        self.errors
            .last()
            .map(|(stage, message)| (*stage, message.as_str()))
    }

    pub fn errors(&self) -> &[(Stage, String)] {
        &self.errors
    }

    /// The runner, unless its worker has finished.
    fn live_runner(&self) -> Option<&Runner> {
        if self.report.is_some() {
            return None;
        }
        self.runner.as_ref().filter(|runner| !runner.is_finished())
    }

    /// Joins the previous worker and applies whatever it left in the channel.
    fn retire_runner(&mut self) {
        if let Some(runner) = self.runner.take() {
            let events = runner.events().clone();
            drop(runner);
            for event in events.try_iter() {
                self.handle(event);
            }
        }
    }

    fn handle(&mut self, event: WorkerEvent) {
        if let Some(export) = self.export.as_mut() {
            export.record(&event);
        }
        match event {
            WorkerEvent::Progress { snapshot, .. } => self.statistics.apply(&snapshot),
            WorkerEvent::Error { stage, message } => {
                error!("Session: {} {} failed: {}", self.module.name(), stage, message);
                self.errors.push((stage, message));
            }
            WorkerEvent::Finished(report) => {
                info!(
                    "Session: {} finished after {} iterations",
                    self.module.name(),
                    report.iterations_completed
                );
                self.report = Some(report);
            }
        }
    }
}

fn value_type_of(inspector: &Inspector, key: &str) -> Result<ValueType, VariableError> {
    Ok(inspector.map().leaf_by_name(key)?.value_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{BusStop, MonteCarloPi};
    use crate::worker::WorkerPhase;
    use simulit_core::{InspectorEvent, Value};
    use std::collections::BTreeMap;
    use std::thread;

    const WAIT: Duration = Duration::from_secs(10);

    fn session(module: Arc<dyn SimulationModule>) -> Session {
        Session::new(module).unwrap()
    }

    #[test]
    fn test_run_to_completion() {
        let mut session = session(Arc::new(MonteCarloPi));
        session.assign("Iterations", "5").unwrap();
        session.assign("Seed", "42").unwrap();
        session.assign("Delay", "0").unwrap();
        session.assign("Points per iteration", "100").unwrap();
        let updates = session.statistics_mut().subscribe();

        assert!(session.start().unwrap());
        let report = session.pump_blocking(WAIT).unwrap();

        assert_eq!(report.iterations_completed, 5);
        assert_eq!(report.phase, WorkerPhase::Done);
        assert_eq!(session.statistics().watch().get::<i64>("Trials").unwrap(), 500);
        assert!(updates
            .try_iter()
            .any(|event| matches!(event, InspectorEvent::Changed { .. })));

        assert_eq!(session.state(), RunState::Ready);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_pause_resume_stop() {
        let mut session = session(Arc::new(BusStop));
        session.assign("Iterations", "1000000").unwrap();
        session.assign("Delay", "5").unwrap();

        assert!(!session.pause());
        session.start().unwrap();
        assert_eq!(session.state(), RunState::Running);
        assert!(!session.start().unwrap());

        thread::sleep(Duration::from_millis(30));
        assert!(session.pause());
        assert_eq!(session.state(), RunState::Paused);
        assert!(session.start().unwrap());
        assert_eq!(session.state(), RunState::Running);

        assert!(session.stop());
        let report = session.pump_blocking(WAIT).unwrap();
        assert!(report.stopped);
        assert!(report.teardown_ran);
        assert!(report.iterations_completed < 1_000_000);
        let trials = session.statistics().watch().get::<i64>("Trials").unwrap();
        assert_eq!(trials as u64, report.iterations_completed);
    }

    #[test]
    fn test_restart_resets_statistics() {
        let mut session = session(Arc::new(BusStop));
        session.assign("Iterations", "1000000").unwrap();
        session.assign("Delay", "5").unwrap();
        session.start().unwrap();
        thread::sleep(Duration::from_millis(30));

        assert!(session.restart().unwrap());
        assert!(session.report().is_none());
        assert_eq!(session.state(), RunState::Running);
        session.stop();
        assert!(session.pump_blocking(WAIT).unwrap().stopped);
    }

    #[test]
    fn test_setup_failure_is_reported() {
        let mut session = session(Arc::new(BusStop));
        session.assign("Bus:Earliest", "08:10").unwrap();
        session.assign("Delay", "0").unwrap();
        session.start().unwrap();

        let report = session.pump_blocking(WAIT).unwrap();
        assert_eq!(report.phase, WorkerPhase::Errored);
        assert!(!report.teardown_ran);
        let (stage, message) = session.last_error().unwrap();
        assert_eq!(stage, Stage::Setup);
        assert!(message.contains("08:10 > 08:02"));
    }

    #[test]
    fn test_assign_errors() {
        let mut session = session(Arc::new(BusStop));
        assert!(matches!(
            session.assign("Iterations", "many"),
            Err(HostError::InvalidSetting { .. })
        ));
        assert!(matches!(
            session.assign("Iterations", "0"),
            Err(HostError::InvalidSetting { .. })
        ));
        assert!(matches!(
            session.assign("Nope", "1"),
            Err(HostError::InvalidSetting { .. })
        ));
        assert!(matches!(
            session.assign("Earliest", "08:00"),
            Err(HostError::InvalidSetting { .. })
        ));
        assert!(matches!(
            session.assign_pair("Iterations"),
            Err(HostError::InvalidSetting { .. })
        ));
        session.assign_pair("Boy:Latest=08:00:30").unwrap();
        assert_eq!(
            session
                .properties()
                .watch()
                .get::<String>("Boy:Latest")
                .unwrap(),
            "08:00:30"
        );
    }

    #[test]
    fn test_partial_settings_cannot_break_config() {
        let mut session = session(Arc::new(MonteCarloPi));
        let mut changes = BTreeMap::new();
        changes.insert("Iterations".to_string(), Value::Int(0));
        changes.insert("Delay".to_string(), Value::Text("soon".into()));
        session.settings_mut().apply_changes(&changes);

        let config = session.config().unwrap();
        assert_eq!(config.iterations, 1);
        assert_eq!(config.delay_ms, 20);
        assert_eq!(session.settings().map().get::<i64>("Iterations").unwrap(), 1);
    }

    #[test]
    fn test_recording() {
        let mut session = session(Arc::new(MonteCarloPi));
        session.enable_recording(true);
        session.assign("Iterations", "3").unwrap();
        session.assign("Seed", "7").unwrap();
        session.assign("Delay", "0").unwrap();
        session.start().unwrap();
        session.pump_blocking(WAIT).unwrap();

        let export = session.export().unwrap();
        assert_eq!(export.seed, 7);
        assert_eq!(export.columns.len(), 4);
        assert_eq!(export.frames.len(), 3);
        assert_eq!(export.completed, 3);
    }
}
