//! Registering a custom module and driving it through a Session.
//!
//! Run with: cargo run -p simulit_sim --example random_walk

use simulit_core::{InspectorEvent, Variable, VariableGroup, VariableMap, WatchList};
use simulit_env::NumberGenerator;
use simulit_sim::{ModuleRegistry, Session, Simulation, SimulationError, SimulationModule};
use std::sync::Arc;
use std::time::Duration;

struct RandomWalk;

impl SimulationModule for RandomWalk {
    fn name(&self) -> &str {
        "Random Walk"
    }

    fn description(&self) -> &str {
        "A walker takes unit steps left or right"
    }

    fn create_instance(&self) -> Box<dyn Simulation> {
        Box::new(Walker { step: 1 })
    }

    fn declared_properties(&self) -> VariableGroup {
        VariableGroup::new("Simulation").with(
            Variable::new("Step", "Length of one step", 1i64).with_filter(|step: &i64| *step > 0),
        )
    }

    fn declared_statistics(&self) -> VariableGroup {
        VariableGroup::anonymous()
            .with(Variable::new("Position", "Current position", 0i64))
            .with(Variable::new("Farthest", "Largest distance from the origin", 0i64))
    }
}

struct Walker {
    step: i64,
}

impl Simulation for Walker {
    fn setup(
        &mut self,
        properties: &WatchList,
        _statistics: &mut VariableMap,
    ) -> Result<(), SimulationError> {
        self.step = properties.get::<i64>("Step")?;
        Ok(())
    }

    fn run(
        &mut self,
        statistics: &mut VariableMap,
        generator: &mut dyn NumberGenerator,
    ) -> Result<(), SimulationError> {
        let direction = if generator.below(1) == 0 { -1 } else { 1 };
        let position = statistics.get::<i64>("Position")? + direction * self.step;
        let farthest = statistics.get::<i64>("Farthest")?.max(position.abs());
        statistics.set("Position", position)?;
        statistics.set("Farthest", farthest)?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = ModuleRegistry::with_builtin();
    registry.register(Arc::new(RandomWalk))?;

    let mut session = Session::new(registry.get("random-walk")?)?;
    session.assign("Step", "2")?;
    session.assign("Iterations", "50")?;
    session.assign("Seed", "7")?;
    session.assign("Delay", "0")?;

    let updates = session.statistics_mut().subscribe();
    session.start()?;
    let report = session
        .pump_blocking(Duration::from_secs(10))
        .ok_or("walk did not finish")?;

    let refreshes = updates
        .try_iter()
        .filter(|event| matches!(event, InspectorEvent::Changed { .. }))
        .count();
    println!(
        "{} steps, {} view refreshes",
        report.iterations_completed, refreshes
    );
    for view in session.statistics().views() {
        println!("{}", serde_json::to_string(&view)?);
    }
    Ok(())
}
