//! Estimating π by sampling the unit square.
//!
//! A point `(x, y)` drawn uniformly from `[0, 1)²` lands inside the quarter
//! circle of radius 1 with probability π/4, so `4 · hits / trials`
//! converges to π.

use crate::error::SimulationError;
use crate::simulation::{Simulation, SimulationModule};
use simulit_core::{Variable, VariableGroup, VariableMap, WatchList};
use simulit_env::NumberGenerator;
use std::f64::consts::PI;

const POINTS: &str = "Points per iteration";
const MAX_POINTS: i64 = 1_000_000;

const TRIALS: &str = "Trials";
const HITS: &str = "Hits";
const ESTIMATE: &str = "Pi estimate";
const ERROR: &str = "Error";

#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloPi;

impl SimulationModule for MonteCarloPi {
    fn name(&self) -> &str {
        "Monte Carlo Pi"
    }

    fn description(&self) -> &str {
        "Estimates π by drawing random points in the unit square and counting \
         how many fall inside the quarter circle of radius 1: \
         π ≈ 4 × (points inside / all points)."
    }

    fn create_instance(&self) -> Box<dyn Simulation> {
        Box::new(PiEstimate::default())
    }

    fn declared_properties(&self) -> VariableGroup {
        VariableGroup::new("Simulation").with(
            Variable::new(POINTS, "Points drawn on every iteration", 1i64)
                .with_filter(|n: &i64| (1..=MAX_POINTS).contains(n)),
        )
    }

    fn declared_statistics(&self) -> VariableGroup {
        VariableGroup::anonymous()
            .with(Variable::new(TRIALS, "Total number of points drawn", 0i64))
            .with(Variable::new(HITS, "Points inside the quarter circle", 0i64))
            .with(Variable::new(ESTIMATE, "Current estimate of π", 0.0f64))
            .with(Variable::new(ERROR, "Absolute error against π", 0.0f64))
    }
}

#[derive(Debug, Default)]
struct PiEstimate {
    points: u64,
    trials: i64,
    hits: i64,

    /// Statistic ids, resolved in setup
    ids: [usize; 4],
}

impl Simulation for PiEstimate {
    fn setup(
        &mut self,
        properties: &WatchList,
        statistics: &mut VariableMap,
    ) -> Result<(), SimulationError> {
        let points = properties.get::<i64>(POINTS)?;
        if points < 1 {
            return Err(SimulationError::InvalidProperty {
                name: POINTS.to_string(),
                reason: format!("expected at least one point, got {}", points),
            });
        }
        self.points = points as u64;
        self.trials = statistics.get::<i64>(TRIALS)?;
        self.hits = statistics.get::<i64>(HITS)?;
        self.ids = [
            statistics.id_of(TRIALS)?,
            statistics.id_of(HITS)?,
            statistics.id_of(ESTIMATE)?,
            statistics.id_of(ERROR)?,
        ];
        Ok(())
    }

    fn run(
        &mut self,
        statistics: &mut VariableMap,
        generator: &mut dyn NumberGenerator,
    ) -> Result<(), SimulationError> {
        for _ in 0..self.points {
            let x = generator.real(0.0, 1.0);
            let y = generator.real(0.0, 1.0);
            self.trials += 1;
            if x * x + y * y <= 1.0 {
                self.hits += 1;
            }
        }

        let estimate = 4.0 * self.hits as f64 / self.trials as f64;
        let [trials, hits, estimate_id, error] = self.ids;
        statistics.set_id(trials, self.trials)?;
        statistics.set_id(hits, self.hits)?;
        statistics.set_id(estimate_id, estimate)?;
        statistics.set_id(error, (estimate - PI).abs())?;
        Ok(())
    }
}
