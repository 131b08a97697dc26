//! Simulation modules that ship with the host.

mod bus_stop;
mod monte_carlo;

pub use bus_stop::{format_clock, parse_clock, BusStop};
pub use monte_carlo::MonteCarloPi;

use crate::simulation::SimulationModule;
use std::sync::Arc;

/// Every built-in module, in listing order.
pub fn builtin() -> Vec<Arc<dyn SimulationModule>> {
    vec![Arc::new(MonteCarloPi), Arc::new(BusStop)]
}
