//! Runs a [`Worker`] on its own named thread.

use crate::error::HostError;
use crate::settings::WorkerConfig;
use crate::simulation::Simulation;
use crate::worker::{Worker, WorkerEvent, WorkerReport};
use crossbeam::channel::{unbounded, Receiver};
use simulit_core::{VariableMap, WatchList};
use simulit_env::Controller;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Owner-side handle of one worker thread.
///
/// The worker starts parked in `wait_for_start()`; call
/// `controller().start()` to let it run. Dropping the runner shuts the
/// controller down and joins the thread, so a worker never outlives its
/// owner. A new run needs a new runner.
pub struct Runner {
    controller: Arc<Controller>,
    events: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<WorkerReport>>,
}

impl Runner {
    pub fn spawn(
        label: &str,
        simulation: Box<dyn Simulation>,
        properties: WatchList,
        statistics: VariableMap,
        config: WorkerConfig,
    ) -> Result<Self, HostError> {
        let controller = Controller::shared();
        let (tx, rx) = unbounded();
        let worker = Worker::new(
            simulation,
            Arc::clone(&controller),
            properties,
            statistics,
            config,
            tx,
        );
        let handle = thread::Builder::new()
            .name(format!("simulit-{}", label))
            .spawn(move || worker.run())
            .map_err(HostError::ThreadSpawn)?;
        debug!("Runner: spawned worker for {}", label);

        Ok(Self {
            controller,
            events: rx,
            handle: Some(handle),
        })
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Progress, errors and the final report, in the order produced.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// True once the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the worker to return on its own.
    ///
    /// Does not stop the controller: joining a runner that was never
    /// started, or is paused, blocks until another handle moves it on.
    pub fn join(mut self) -> Result<WorkerReport, HostError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| HostError::WorkerPanicked),
            None => Err(HostError::WorkerPanicked),
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.controller.shutdown();
            if handle.join().is_err() {
                warn!("Runner: worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use simulit_core::{Variable, VariableGroup};
    use simulit_env::NumberGenerator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Tick {
        teardowns: Arc<AtomicUsize>,
    }

    impl Simulation for Tick {
        fn setup(&mut self, _: &WatchList, _: &mut VariableMap) -> Result<(), SimulationError> {
            Ok(())
        }

        fn run(
            &mut self,
            statistics: &mut VariableMap,
            _: &mut dyn NumberGenerator,
        ) -> Result<(), SimulationError> {
            let ticks = statistics.get::<i64>("Ticks")?;
            statistics.set("Ticks", ticks + 1)?;
            Ok(())
        }

        fn teardown(&mut self) -> Result<(), SimulationError> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn spawn(config: WorkerConfig, teardowns: &Arc<AtomicUsize>) -> Runner {
        let properties = VariableMap::new(VariableGroup::anonymous()).unwrap().watch();
        let statistics =
            VariableMap::new(VariableGroup::anonymous().with(Variable::new("Ticks", "", 0i64)))
                .unwrap();
        let simulation = Box::new(Tick {
            teardowns: Arc::clone(teardowns),
        });
        Runner::spawn("tick", simulation, properties, statistics, config).unwrap()
    }

    #[test]
    fn test_started_runner_completes() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let config = WorkerConfig::default().with_iterations(3).with_delay(0);
        let runner = spawn(config, &teardowns);
        runner.controller().start();
        let events = runner.events().clone();

        let report = runner.join().unwrap();
        assert_eq!(report.iterations_completed, 3);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);

        let progress = events
            .try_iter()
            .filter(|event| matches!(event, WorkerEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 3);
    }

    #[test]
    fn test_drop_unstarted_runner_joins() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let runner = spawn(WorkerConfig::default(), &teardowns);
        thread::sleep(Duration::from_millis(10));
        assert!(!runner.is_finished());
        drop(runner);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_paused_runner_joins() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let config = WorkerConfig::default()
            .with_iterations(1_000_000)
            .with_delay(5);
        let runner = spawn(config, &teardowns);
        runner.controller().start();
        thread::sleep(Duration::from_millis(20));
        runner.controller().pause();
        drop(runner);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }
}
