use crate::response::{Feedback, Response};
use crate::stimulus::StimulusId;
use serde::{Deserialize, Serialize};

/// Per-trial polling state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    WaitingToStartAudio,
    /// Audio is playing but responses are not yet accepted.
    AudioPlaying,
    ResponseWindowOpen,
    Ended,
}

impl TrialState {
    pub fn accepts_response(&self) -> bool {
        matches!(self, TrialState::ResponseWindowOpen)
    }
}

/// One row of the trial list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialDefinition {
    pub index: usize,
    pub cue: StimulusId,
    pub choice: StimulusId,
    /// Whether the click train surrounds the sounds on this trial.
    pub clicks: bool,
    /// Delay condition: overrides the configured cue-to-choice filler, in seconds.
    pub isi_s: Option<f64>,
}

impl TrialDefinition {
    pub fn expected_response(&self) -> Response {
        if self.cue == self.choice {
            Response::Same
        } else {
            Response::Different
        }
    }
}

/// Recorded result per trial. Timestamps are seconds on the session clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    pub repetition: usize,
    pub cue: String,
    pub choice: String,
    pub clicks: bool,
    pub iti: f64,
    pub correct_response: Response,
    pub response: Response,
    /// Session time of the response; 0 when no response was given.
    pub response_time: f64,
    /// Response time relative to the response window onset.
    pub reaction_time: Option<f64>,
    pub audio_onset: f64,
    pub audio_offset: f64,
    pub response_window_onset: Option<f64>,
    pub feedback: Feedback,
    pub feedback_onset: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(cue: StimulusId, choice: StimulusId) -> TrialDefinition {
        TrialDefinition {
            index: 0,
            cue,
            choice,
            clicks: true,
            isi_s: None,
        }
    }

    #[test]
    fn identical_tone_identities_expect_same() {
        let trial = definition(StimulusId::tone(400.0, 42), StimulusId::tone(400.0, 42));
        assert_eq!(trial.expected_response(), Response::Same);
    }

    #[test]
    fn differing_seeds_expect_diff() {
        let trial = definition(StimulusId::tone(400.0, 42), StimulusId::tone(400.0, 56));
        assert_eq!(trial.expected_response(), Response::Different);
        assert_eq!(trial.expected_response().label(), "diff");
    }

    #[test]
    fn file_identities_compare_by_name() {
        let same = definition(StimulusId::file("a.wav"), StimulusId::file("a.wav"));
        let diff = definition(StimulusId::file("a.wav"), StimulusId::file("b.wav"));
        assert_eq!(same.expected_response(), Response::Same);
        assert_eq!(diff.expected_response(), Response::Different);
    }

    #[test]
    fn only_open_window_accepts_responses() {
        assert!(TrialState::ResponseWindowOpen.accepts_response());
        assert!(!TrialState::AudioPlaying.accepts_response());
        assert!(!TrialState::WaitingToStartAudio.accepts_response());
        assert!(!TrialState::Ended.accepts_response());
    }
}
