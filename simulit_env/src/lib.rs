//! Simulit Environment Layer
//!
//! Everything a worker loop needs from the outside world, behind small
//! interfaces so the same simulation code runs reproducibly in tests and
//! non-deterministically in production:
//!
//! - **Run control**: [`Controller`] - Ready/Running/Paused/Stopped state
//!   machine with timed iteration pacing, shared by owner and worker
//! - **Randomness**: [`NumberGenerator`] - all entropy comes from a single
//!   64-bit seed, or from the OS when the seed is 0
//!
//! # Example
//!
//! ```ignore
//! use simulit_env::{Controller, generator};
//!
//! let ctrl = Controller::shared();
//! ctrl.set_wait_time(20);
//! let mut rng = generator::for_seed(42);
//!
//! if ctrl.wait_for_start() {
//!     loop {
//!         step(&mut *rng);
//!         if !ctrl.wait() {
//!             break;
//!         }
//!     }
//! }
//! ```

mod controller;
mod entropy;
pub mod generator;
mod seeded;

pub use controller::{Controller, RunState};
pub use entropy::EntropyGenerator;
pub use generator::NumberGenerator;
pub use seeded::SeededGenerator;
