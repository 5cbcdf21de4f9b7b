pub mod phase;
pub mod response;
pub mod screen;
pub mod stimulus;
pub mod trial;

pub use phase::SessionPhase;
pub use response::{Feedback, Response};
pub use screen::Screen;
pub use stimulus::StimulusId;
pub use trial::{TrialDefinition, TrialResult, TrialState};
