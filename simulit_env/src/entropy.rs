//! Non-deterministic number generator for unseeded runs.

use crate::generator::{int_between, real_between, NumberGenerator};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Generator seeded from operating-system entropy.
///
/// Used when a run is configured with seed 0; two runs will not match.
#[derive(Debug)]
pub struct EntropyGenerator {
    rng: StdRng,
}

impl EntropyGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberGenerator for EntropyGenerator {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn int_in(&mut self, from: i64, to: i64) -> i64 {
        int_between(&mut self.rng, from, to)
    }

    fn real(&mut self, from: f64, to: f64) -> f64 {
        real_between(&mut self.rng, from, to)
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}
