//! Session orchestration for the auditory memory task: settings, trial
//! lists, response detection, the per-trial state machine and result
//! persistence.

pub mod detector;
pub mod error;
pub mod persist;
pub mod runner;
pub mod session;
pub mod settings;
pub mod stimuli;
pub mod trial_list;

pub use detector::{
    build_detector, FrameInput, GazeDetector, KeyboardDetector, MouseDetector, ResponseDetector,
};
pub use error::{ExperimentError, Result};
pub use persist::{read_results, RunInfo, RunOutput, Snapshot};
pub use runner::{TrialEvent, TrialOutcome, TrialRunner};
pub use session::{Devices, GazeLink, Session, SessionConfig, SessionStatus};
pub use settings::{Button, MonitorProfile, ResponseMode, Settings, TrialOrder};
pub use stimuli::StimulusBank;
pub use trial_list::{ScheduledTrial, TrialList};
