//! Run control shared between the owner thread and a worker thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Lifecycle of a single run.
///
/// ```text
/// Ready ──start──► Running ──stop──► Stopped
///                   │   ▲               ▲
///              pause│   │start          │
///                   ▼   │               │
///                  Paused ─────stop─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Ready,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Ready => "ready",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mutex/condition-variable guarded run state plus iteration pacing.
///
/// The owner thread calls [`start`](Self::start), [`pause`](Self::pause)
/// and [`stop`](Self::stop); the worker thread blocks only in
/// [`wait_for_start`](Self::wait_for_start) and [`wait`](Self::wait).
/// Every effective transition wakes all waiters. `Stopped` is terminal and
/// `Ready` is never re-entered: a new run needs a new controller.
#[derive(Debug)]
pub struct Controller {
    state: Mutex<RunState>,
    changed: Condvar,

    /// Delay between iterations in milliseconds (last writer wins)
    wait_time_ms: AtomicU64,
}

impl Controller {
    /// Creates a controller in `Ready` with no inter-iteration delay.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Ready),
            changed: Condvar::new(),
            wait_time_ms: AtomicU64::new(0),
        }
    }

    /// Creates an Arc-wrapped controller for sharing with a worker.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Ready or Paused -> Running. Returns whether the state changed.
    pub fn start(&self) -> bool {
        self.transition(&[RunState::Ready, RunState::Paused], RunState::Running)
    }

    /// Running -> Paused. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.transition(&[RunState::Running], RunState::Paused)
    }

    /// Running or Paused -> Stopped. Returns whether the state changed.
    pub fn stop(&self) -> bool {
        self.transition(&[RunState::Running, RunState::Paused], RunState::Stopped)
    }

    /// Any non-terminal state -> Stopped.
    ///
    /// Unlike `stop()` this also leaves `Ready`, releasing a worker parked
    /// in `wait_for_start()` so an owner can join a run it never started.
    pub fn shutdown(&self) -> bool {
        self.transition(
            &[RunState::Ready, RunState::Running, RunState::Paused],
            RunState::Stopped,
        )
    }

    pub fn state(&self) -> RunState {
        *self.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == RunState::Ready
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == RunState::Stopped
    }

    /// Blocks until the controller leaves `Ready`.
    ///
    /// Returns true iff the state reached is `Running`. Through the regular
    /// transitions `Ready` is only left by `start()`; false means the owner
    /// called `shutdown()` before the run began.
    pub fn wait_for_start(&self) -> bool {
        let guard = self.lock();
        let guard = self
            .changed
            .wait_while(guard, |state| *state == RunState::Ready)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == RunState::Running
    }

    /// Per-iteration pacing and cancellation point.
    ///
    /// Sleeps for the configured delay, waking early if the state leaves
    /// `Running`. If the state is then `Paused`, keeps blocking until it
    /// leaves `Paused`. Returns false iff the run is `Stopped`.
    pub fn wait(&self) -> bool {
        let delay = self.wait_time();
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, delay, |state| *state == RunState::Running)
            .unwrap_or_else(PoisonError::into_inner);
        let guard = self
            .changed
            .wait_while(guard, |state| *state == RunState::Paused)
            .unwrap_or_else(PoisonError::into_inner);
        *guard != RunState::Stopped
    }

    /// Sets the delay `wait()` sleeps between iterations.
    pub fn set_wait_time(&self, milliseconds: u64) {
        self.wait_time_ms.store(milliseconds, Ordering::Relaxed);
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms.load(Ordering::Relaxed))
    }

    fn transition(&self, allowed: &[RunState], to: RunState) -> bool {
        let mut state = self.lock();
        if !allowed.contains(&state) {
            debug!("Controller: ignoring {} while {}", to, *state);
            return false;
        }
        debug!("Controller: {} -> {}", *state, to);
        *state = to;
        self.changed.notify_all();
        true
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // The guarded value is a plain enum, so a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_transition_table() {
        let ctrl = Controller::new();
        assert_eq!(ctrl.state(), RunState::Ready);

        assert!(!ctrl.pause());
        assert_eq!(ctrl.state(), RunState::Ready);
        assert!(!ctrl.stop());
        assert_eq!(ctrl.state(), RunState::Ready);

        assert!(ctrl.start());
        assert_eq!(ctrl.state(), RunState::Running);
        assert!(!ctrl.start());

        assert!(ctrl.pause());
        assert_eq!(ctrl.state(), RunState::Paused);
        assert!(!ctrl.pause());

        assert!(ctrl.start());
        assert_eq!(ctrl.state(), RunState::Running);

        assert!(ctrl.stop());
        assert_eq!(ctrl.state(), RunState::Stopped);

        assert!(!ctrl.start());
        assert!(!ctrl.pause());
        assert!(!ctrl.stop());
        assert!(ctrl.is_stopped());
    }

    #[test]
    fn test_stop_from_paused() {
        let ctrl = Controller::new();
        ctrl.start();
        ctrl.pause();
        assert!(ctrl.stop());
        assert!(ctrl.is_stopped());
    }

    #[test]
    fn test_wait_for_start_blocks_until_start() {
        let ctrl = Controller::shared();
        let worker = {
            let ctrl = Arc::clone(&ctrl);
            thread::spawn(move || ctrl.wait_for_start())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!worker.is_finished());
        ctrl.start();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_shutdown_releases_unstarted_worker() {
        let ctrl = Controller::shared();
        let worker = {
            let ctrl = Arc::clone(&ctrl);
            thread::spawn(move || ctrl.wait_for_start())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(ctrl.shutdown());
        assert!(!worker.join().unwrap());
        assert!(ctrl.is_stopped());
        assert!(!ctrl.shutdown());
    }

    #[test]
    fn test_wait_times_out_while_running() {
        let ctrl = Controller::new();
        ctrl.set_wait_time(30);
        ctrl.start();

        let begin = Instant::now();
        assert!(ctrl.wait());
        assert!(begin.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_zero_delay_does_not_block() {
        let ctrl = Controller::new();
        ctrl.start();
        let begin = Instant::now();
        for _ in 0..100 {
            assert!(ctrl.wait());
        }
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_interrupts_wait() {
        let ctrl = Controller::shared();
        ctrl.set_wait_time(60_000);
        ctrl.start();

        let worker = {
            let ctrl = Arc::clone(&ctrl);
            thread::spawn(move || {
                let begin = Instant::now();
                (ctrl.wait(), begin.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));
        ctrl.stop();

        let (keep_going, elapsed) = worker.join().unwrap();
        assert!(!keep_going);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_holds_while_paused_then_resumes() {
        let ctrl = Controller::shared();
        ctrl.set_wait_time(0);
        ctrl.start();
        ctrl.pause();

        let worker = {
            let ctrl = Arc::clone(&ctrl);
            thread::spawn(move || ctrl.wait())
        };
        thread::sleep(Duration::from_millis(30));
        assert!(!worker.is_finished());

        ctrl.start();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_wait_paused_then_stopped_returns_false() {
        let ctrl = Controller::shared();
        ctrl.start();
        ctrl.pause();

        let worker = {
            let ctrl = Arc::clone(&ctrl);
            thread::spawn(move || ctrl.wait())
        };
        thread::sleep(Duration::from_millis(20));
        ctrl.stop();
        assert!(!worker.join().unwrap());
    }

    #[test]
    fn test_wait_time_last_writer_wins() {
        let ctrl = Controller::new();
        ctrl.set_wait_time(10);
        ctrl.set_wait_time(25);
        assert_eq!(ctrl.wait_time(), Duration::from_millis(25));
    }
}
