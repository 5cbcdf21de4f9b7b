use crate::error::{ExperimentError, Result};
use crate::settings::Settings;
use audmem_core::TrialResult;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Who, where and with what hardware a run was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub date: String,
    /// Viewing distance in centimetres.
    pub distance_cm: f64,
    pub monitor: String,
    pub ttl: String,
    pub eyetracker_hz: Option<u32>,
    pub version: String,
}

impl RunInfo {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            date: chrono::Local::now().format("%Y-%m-%d_%Hh%M.%S").to_string(),
            distance_cm: 60.0,
            monitor: String::new(),
            ttl: "None".into(),
            eyetracker_hz: None,
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Everything about a run in one JSON document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub info: RunInfo,
    pub settings: Settings,
    pub aborted: bool,
    pub results: Vec<TrialResult>,
}

/// The per-run output directory `<logs>/<run id>/`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    dir: PathBuf,
    run_id: String,
}

impl RunOutput {
    /// Creates the run directory, refusing to reuse an existing run id.
    pub fn create(logs_dir: impl AsRef<Path>, run_id: &str) -> Result<Self> {
        if run_id.trim().is_empty() || run_id.contains(['/', '\\']) {
            return Err(ExperimentError::InvalidSettings(format!(
                "run id {run_id:?} cannot name a directory"
            )));
        }
        let dir = logs_dir.as_ref().join(run_id);
        if dir.exists() {
            return Err(ExperimentError::RunExists(dir));
        }
        std::fs::create_dir_all(logs_dir.as_ref())?;
        std::fs::create_dir(&dir)?;
        log::info!("Writing run output to {}", dir.display());
        Ok(Self {
            dir,
            run_id: run_id.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.run_id))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.run_id))
    }

    pub fn gaze_path(&self) -> PathBuf {
        self.dir.join(format!("{}_gaze.csv", self.run_id))
    }

    /// Wide results table, one row per completed trial.
    pub fn write_results(&self, results: &[TrialResult]) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.results_path())?;
        for result in results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let file = std::fs::File::create(self.snapshot_path())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads a results table back, used by analysis tooling and tests.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<TrialResult>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize() {
        out.push(row?);
    }
    Ok(out)
}
