use audmem_audio::AudioError;
use audmem_gaze::GazeError;
use audmem_ttl::TtlError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Ttl(#[from] TtlError),

    #[error(transparent)]
    Gaze(#[from] GazeError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid trial list, row {row}: {reason}")]
    InvalidTrialList { row: usize, reason: String },

    #[error("Run directory {0} already exists, choose another run id")]
    RunExists(PathBuf),

    #[error("Gaze responses need an eye tracker")]
    NoEyeTracker,
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
