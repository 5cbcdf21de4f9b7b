use thiserror::Error;

#[derive(Debug, Error)]
pub enum GazeError {
    #[error("Gaze log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gaze CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Gaze source already subscribed")]
    AlreadySubscribed,

    #[error("Unsupported tracker sample rate {0} Hz")]
    UnsupportedRate(u32),
}
