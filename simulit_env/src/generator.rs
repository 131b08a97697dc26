//! Randomness interface handed to simulations.

use rand::Rng;

/// Source of random numbers for a simulation run.
///
/// Simulations never reach for a global RNG: the worker hands them one of
/// these, so a run configured with a non-zero seed is reproducible.
///
/// # Implementations
///
/// - **Reproducible**: [`SeededGenerator`](crate::SeededGenerator) - ChaCha8 from a 64-bit seed
/// - **Non-deterministic**: [`EntropyGenerator`](crate::EntropyGenerator) - seeded from the OS
pub trait NumberGenerator: Send {
    /// Returns a raw random integer.
    fn next_u32(&mut self) -> u32;

    /// Returns an integer in `[from, to]`; bounds may be given in either order.
    fn int_in(&mut self, from: i64, to: i64) -> i64;

    /// Returns an integer in `[0, to]`; a negative `to` yields 0.
    fn below(&mut self, to: i64) -> i64 {
        self.int_in(0, to.max(0))
    }

    /// Returns a float in the half-open range from the lower to the upper
    /// bound; bounds may be given in either order. Returns `from` when the
    /// range is empty.
    fn real(&mut self, from: f64, to: f64) -> f64;

    /// Seed this generator was built from; 0 when non-deterministic.
    fn seed(&self) -> u64;
}

pub(crate) fn int_between<R: Rng>(rng: &mut R, from: i64, to: i64) -> i64 {
    let (low, high) = if from <= to { (from, to) } else { (to, from) };
    rng.gen_range(low..=high)
}

pub(crate) fn real_between<R: Rng>(rng: &mut R, from: f64, to: f64) -> f64 {
    let (low, high) = if from <= to { (from, to) } else { (to, from) };
    if low < high {
        rng.gen_range(low..high)
    } else {
        from
    }
}

/// Builds the generator for a configured seed.
///
/// Seed 0 means "use a non-deterministic source"; any other value yields
/// a deterministic generator.
pub fn for_seed(seed: u64) -> Box<dyn NumberGenerator> {
    if seed == 0 {
        Box::new(crate::EntropyGenerator::new())
    } else {
        Box::new(crate::SeededGenerator::new(seed))
    }
}
