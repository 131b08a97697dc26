//! "Too late or too soon": a boy trying to catch a school bus.
//!
//! The bus arrives at a uniformly random second inside its window and
//! leaves at once; the boy reaches the stop at a uniformly random second
//! inside his. He makes it when he arrives no later than the bus. Windows
//! are given as wall-clock times (`hh:mm` or `hh:mm:ss`).

use crate::error::SimulationError;
use crate::simulation::{Simulation, SimulationModule};
use simulit_core::{Variable, VariableGroup, VariableMap, WatchList};
use simulit_env::NumberGenerator;

const BUS: &str = "Bus";
const BOY: &str = "Boy";
const EARLIEST: &str = "Earliest";
const LATEST: &str = "Latest";

const TRIALS: &str = "Trials";
const ON_TIME: &str = "On time";
const ON_TIME_STREAK: &str = "Longest on-time streak";
const AVERAGE_WAIT: &str = "Average waiting time";
const LATE: &str = "Late";
const AVERAGE_DELAY: &str = "Average delay";
const LATE_STREAK: &str = "Longest late streak";

const ZERO_CLOCK: &str = "00:00:00";

/// Parses `h:mm`, `hh:mm` or `hh:mm:ss` into seconds since midnight.
pub fn parse_clock(text: &str) -> Option<i64> {
    let mut parts = text.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let hours = match hours.len() {
        1 | 2 => digits(hours).filter(|h| *h <= 23)?,
        _ => return None,
    };
    let minutes = sexagesimal(minutes)?;
    let seconds = match seconds {
        Some(seconds) => sexagesimal(seconds)?,
        None => 0,
    };
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Formats seconds as `hh:mm:ss`.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

fn digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Exactly two digits, 00-59.
fn sexagesimal(text: &str) -> Option<i64> {
    if text.len() != 2 {
        return None;
    }
    digits(text).filter(|value| *value < 60)
}

fn clock(name: &str, description: &str, default: &str) -> Variable {
    Variable::text(name, description, default).with_filter(|text: &String| parse_clock(text).is_some())
}

fn window(name: &str, who: &str, earliest: &str, latest: &str) -> VariableGroup {
    VariableGroup::new(name)
        .with(clock(
            EARLIEST,
            &format!("Earliest arrival of the {} (hh:mm or hh:mm:ss)", who),
            earliest,
        ))
        .with(clock(
            LATEST,
            &format!("Latest arrival of the {} (hh:mm or hh:mm:ss)", who),
            latest,
        ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BusStop;

impl SimulationModule for BusStop {
    fn name(&self) -> &str {
        "Too Late Or Too Soon"
    }

    fn description(&self) -> &str {
        "A boy is regularly late for school although he tries to be on time. \
         Every morning his father drives him to the bus stop. The bus is due \
         around 8:00 but may come at any moment between 7:58 and 8:02 and \
         leaves immediately; depending on traffic, father and son reach the \
         stop between 7:55 and 8:01. The simulation shows how often the boy \
         misses the bus."
    }

    fn create_instance(&self) -> Box<dyn Simulation> {
        Box::new(Commute::default())
    }

    fn declared_properties(&self) -> VariableGroup {
        VariableGroup::new("Simulation")
            .with(window(BUS, "bus", "07:58", "08:02"))
            .with(window(BOY, "boy", "07:55", "08:01"))
    }

    fn declared_statistics(&self) -> VariableGroup {
        VariableGroup::anonymous()
            .with(Variable::new(TRIALS, "Number of mornings", 0i64))
            .with(Variable::new(ON_TIME, "Mornings the boy caught the bus", 0i64))
            .with(Variable::new(
                ON_TIME_STREAK,
                "Longest run of consecutive mornings on time",
                0i64,
            ))
            .with(Variable::text(
                AVERAGE_WAIT,
                "Average wait for the bus on mornings the boy was on time",
                ZERO_CLOCK,
            ))
            .with(Variable::new(LATE, "Mornings the boy missed the bus", 0i64))
            .with(Variable::text(
                AVERAGE_DELAY,
                "Average time the bus had already been gone on mornings the boy was late",
                ZERO_CLOCK,
            ))
            .with(Variable::new(
                LATE_STREAK,
                "Longest run of consecutive late mornings",
                0i64,
            ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Window {
    from: i64,
    to: i64,
}

#[derive(Debug, Default)]
struct Commute {
    bus: Window,
    boy: Window,

    trials: i64,
    on_time: i64,
    late: i64,
    total_wait: i64,
    total_delay: i64,

    /// Positive while on time, negative while late
    streak: i64,
    longest_on_time: i64,
    longest_late: i64,
}

impl Commute {
    fn read_window(properties: &WatchList, group: &str) -> Result<Window, SimulationError> {
        let read = |leaf: &str| -> Result<(String, i64), SimulationError> {
            let name = format!("{}:{}", group, leaf);
            let text = properties.get::<String>(&name)?;
            let seconds = parse_clock(&text).ok_or_else(|| SimulationError::InvalidProperty {
                name: name.clone(),
                reason: format!("'{}' is not a time of day", text),
            })?;
            Ok((text, seconds))
        };
        let (from_text, from) = read(EARLIEST)?;
        let (to_text, to) = read(LATEST)?;
        if from > to {
            return Err(SimulationError::failed(format!(
                "{}: earliest arrival comes after the latest ({} > {})",
                group, from_text, to_text
            )));
        }
        Ok(Window { from, to })
    }
}

impl Simulation for Commute {
    fn setup(
        &mut self,
        properties: &WatchList,
        statistics: &mut VariableMap,
    ) -> Result<(), SimulationError> {
        *self = Commute {
            bus: Self::read_window(properties, BUS)?,
            boy: Self::read_window(properties, BOY)?,
            ..Commute::default()
        };
        statistics.reset();
        Ok(())
    }

    fn run(
        &mut self,
        statistics: &mut VariableMap,
        generator: &mut dyn NumberGenerator,
    ) -> Result<(), SimulationError> {
        let bus = generator.int_in(self.bus.from, self.bus.to);
        let boy = generator.int_in(self.boy.from, self.boy.to);
        self.trials += 1;

        if boy <= bus {
            self.on_time += 1;
            self.total_wait += bus - boy;
            self.streak = (self.streak + 1).max(1);
            self.longest_on_time = self.longest_on_time.max(self.streak);
        } else {
            self.late += 1;
            self.total_delay += boy - bus;
            self.streak = (self.streak - 1).min(-1);
            self.longest_late = self.longest_late.max(-self.streak);
        }

        statistics.set(TRIALS, self.trials)?;
        statistics.set(ON_TIME, self.on_time)?;
        statistics.set(ON_TIME_STREAK, self.longest_on_time)?;
        statistics.set(LATE, self.late)?;
        statistics.set(LATE_STREAK, self.longest_late)?;
        if self.on_time > 0 {
            statistics.set(AVERAGE_WAIT, format_clock(self.total_wait / self.on_time))?;
        }
        if self.late > 0 {
            statistics.set(AVERAGE_DELAY, format_clock(self.total_delay / self.late))?;
        }
        Ok(())
    }
}
