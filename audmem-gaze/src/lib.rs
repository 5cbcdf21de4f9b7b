//! Eye-tracker gaze samples: ingestion, per-trial buffering, fixation
//! classification and the raw gaze log.

pub mod buffer;
pub mod csv_log;
pub mod error;
pub mod region;
pub mod sample;
pub mod source;

pub use buffer::GazeBuffer;
pub use csv_log::{read_gaze_csv, GazeLog, GAZE_COLUMNS};
pub use error::GazeError;
pub use region::{classify, fixation_window_len, mean_gaze, EyeMeans, GazeRegion, Region};
pub use sample::{EyeSample, GazeSample};
pub use source::{gaze_channel, GazeFeed, GazeSender, GazeSource, ReplaySource};
