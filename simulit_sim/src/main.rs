//! Simulit CLI
//!
//! Run a simulation module headlessly and print its final statistics.

use clap::Parser;
use simulit_core::Value;
use simulit_sim::{HostError, ModuleRegistry, Session, WorkerPhase};
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Grace period for teardown after a timeout stop
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Simulit simulation runner
#[derive(Parser, Debug)]
#[command(name = "simulit")]
#[command(about = "Run simulation modules from the command line", long_about = None)]
struct Args {
    /// Module to run, by name or slug (e.g. monte-carlo-pi)
    #[arg(short, long, default_value = "monte-carlo-pi")]
    module: String,

    /// List available modules and exit
    #[arg(long)]
    list: bool,

    /// Number of iterations (overrides Run:Iterations)
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Random seed (0 = non-reproducible)
    #[arg(short, long, allow_hyphen_values = true)]
    seed: Option<i64>,

    /// Delay between iterations in milliseconds
    #[arg(short, long)]
    delay: Option<u64>,

    /// Assign a property or setting, e.g. --set "Bus:Earliest=07:50"
    #[arg(long = "set", value_name = "KEY=VALUE")]
    assignments: Vec<String>,

    /// Stop the run after this many seconds
    #[arg(long, default_value = "600")]
    timeout: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export every iteration's statistics to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", err);
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run finished without errors.
fn run(args: &Args) -> Result<bool, HostError> {
    let registry = ModuleRegistry::with_builtin();

    if args.list {
        list_modules(&registry, args.json)?;
        return Ok(true);
    }

    let module = registry.get(&args.module)?;
    let mut session = Session::new(module)?;

    if let Some(iterations) = args.iterations {
        session.assign("Run:Iterations", &iterations.to_string())?;
    }
    if let Some(seed) = args.seed {
        session.assign("Run:Seed", &seed.to_string())?;
    }
    if let Some(delay) = args.delay {
        session.assign("Run:Delay", &delay.to_string())?;
    }
    for assignment in &args.assignments {
        session.assign_pair(assignment)?;
    }
    session.enable_recording(args.export.is_some());

    if !args.json {
        info!("Simulit v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("Module: {}", session.module().name());
        for (name, value) in session.properties().watch().iter() {
            info!("  {} = {}", name, value);
        }
    }

    session.start()?;
    let report = match session.pump_blocking(Duration::from_secs(args.timeout)) {
        Some(report) => report,
        None => {
            warn!("Timed out after {}s, stopping", args.timeout);
            session.stop();
            session
                .pump_blocking(STOP_GRACE)
                .ok_or(HostError::Unresponsive(STOP_GRACE))?
        }
    };

    if let (Some(path), Some(export)) = (&args.export, session.export()) {
        export.write_to_file(path)?;
        info!("Exported {} frames to {}", export.frames.len(), path);
    }

    let succeeded = report.phase == WorkerPhase::Done;
    if args.json {
        let statistics: BTreeMap<&str, &Value> = session.statistics().watch().iter().collect();
        let summary = serde_json::json!({
            "module": session.module().name(),
            "seed": session.config()?.seed,
            "report": report,
            "statistics": statistics,
            "errors": session
                .errors()
                .iter()
                .map(|(stage, message)| format!("{}: {}", stage, message))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (name, value) in session.statistics().watch().iter() {
            info!("  {} = {}", name, value);
        }
        if succeeded {
            info!(
                "✓ {} iterations{}",
                report.iterations_completed,
                if report.stopped { " (stopped)" } else { "" }
            );
        } else {
            for (stage, message) in session.errors() {
                error!("✗ {} failed: {}", stage, message);
            }
        }
    }

    Ok(succeeded)
}

fn list_modules(registry: &ModuleRegistry, json: bool) -> Result<(), HostError> {
    if json {
        let modules: Vec<_> = registry
            .iter()
            .map(|module| {
                serde_json::json!({
                    "name": module.name(),
                    "slug": simulit_sim::slug(module.name()),
                    "description": module.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&modules)?);
    } else {
        for module in registry.iter() {
            println!("{:<24} {}", simulit_sim::slug(module.name()), module.name());
        }
    }
    Ok(())
}
