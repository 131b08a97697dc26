//! JSON exporter for recorded runs.
//!
//! Stores the statistics snapshot of every iteration next to the column
//! names, so a run can be plotted or diffed offline.

use crate::worker::{WorkerEvent, WorkerReport};
use serde::{Deserialize, Serialize};
use simulit_core::Snapshot;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Statistics after one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFrame {
    /// 1-based iteration number
    pub iteration: u64,

    /// Values in column order
    pub values: Snapshot,
}

/// A complete recorded run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    /// Module display name
    pub module: String,

    /// Seed used; 0 when the run was not reproducible
    pub seed: u64,

    /// Statistic full names, aligned with every frame's values
    pub columns: Vec<String>,

    pub frames: Vec<RunFrame>,

    /// Iterations the worker completed
    pub completed: u64,

    pub stopped: bool,

    /// Failures reported by the worker, as `stage: message`
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

impl RunExport {
    /// Creates a new export container.
    pub fn new(module: &str, seed: u64, columns: Vec<String>) -> Self {
        Self {
            module: module.to_string(),
            seed,
            columns,
            frames: Vec::new(),
            completed: 0,
            stopped: false,
            errors: Vec::new(),
        }
    }

    pub fn add_frame(&mut self, iteration: u64, values: Snapshot) {
        self.frames.push(RunFrame { iteration, values });
    }

    /// Records whatever the event contributes to the export.
    pub fn record(&mut self, event: &WorkerEvent) {
        match event {
            WorkerEvent::Progress {
                iteration,
                snapshot,
            } => self.add_frame(*iteration, snapshot.clone()),
            WorkerEvent::Error { stage, message } => {
                self.errors.push(format!("{}: {}", stage, message))
            }
            WorkerEvent::Finished(report) => self.finalize(report),
        }
    }

    pub fn finalize(&mut self, report: &WorkerReport) {
        self.completed = report.iterations_completed;
        self.stopped = report.stopped;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{Stage, WorkerPhase};
    use simulit_core::Value;

    fn export() -> RunExport {
        let mut export = RunExport::new("Demo", 42, vec!["Count".into(), "Mean".into()]);
        export.record(&WorkerEvent::Progress {
            iteration: 1,
            snapshot: Snapshot::from(vec![Value::Int(1), Value::Float(0.5)]),
        });
        export.record(&WorkerEvent::Error {
            stage: Stage::Run,
            message: "boom".into(),
        });
        export.record(&WorkerEvent::Finished(WorkerReport {
            iterations_completed: 1,
            phase: WorkerPhase::Errored,
            stopped: false,
            teardown_ran: true,
        }));
        export
    }

    #[test]
    fn test_record_events() {
        let export = export();
        assert_eq!(export.frames.len(), 1);
        assert_eq!(export.frames[0].iteration, 1);
        assert_eq!(export.completed, 1);
        assert_eq!(export.errors, vec!["run: boom".to_string()]);
    }

    #[test]
    fn test_json_layout() {
        let json = serde_json::to_value(export()).unwrap();
        assert_eq!(json["module"], "Demo");
        assert_eq!(json["columns"][1], "Mean");
        assert_eq!(json["frames"][0]["values"], serde_json::json!([1, 0.5]));
        assert_eq!(json["errors"][0], "run: boom");
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("simulit-export-{}.json", std::process::id()));
        export().write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let back: RunExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.frames, export().frames);
        assert_eq!(back.seed, 42);
    }
}
