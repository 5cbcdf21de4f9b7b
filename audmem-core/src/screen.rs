use crate::response::Feedback;

/// What the participant should see on the coming refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Screen {
    pub fixation: bool,
    pub targets: bool,
    pub feedback: Option<Feedback>,
    pub calibrating: bool,
}

impl Screen {
    pub fn fixation() -> Self {
        Self {
            fixation: true,
            ..Self::default()
        }
    }

    pub fn with_targets() -> Self {
        Self {
            fixation: true,
            targets: true,
            ..Self::default()
        }
    }

    pub fn feedback(feedback: Feedback) -> Self {
        Self {
            feedback: Some(feedback),
            ..Self::default()
        }
    }
}
