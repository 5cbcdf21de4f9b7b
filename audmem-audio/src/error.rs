use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Invalid stream timing: {0}")]
    InvalidTiming(String),

    /// A segment would not fit into the destination buffer.
    #[error("Segment of {len} frames at offset {offset} exceeds buffer of {capacity} frames")]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Output device does not support {0} Hz stereo f32 output")]
    UnsupportedRate(u32),

    #[error("Audio backend error: {0}")]
    Backend(String),
}
