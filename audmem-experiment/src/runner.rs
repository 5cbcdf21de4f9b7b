use audmem_core::{Response, TrialState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialEvent {
    /// Start playback now; the coming refresh is the audio onset.
    StartAudio,
    /// The response window opens on the coming refresh.
    ShowTargets,
    Ended(TrialOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    pub response: Response,
    /// `None` when the audio ran out first.
    pub response_ns: Option<u64>,
}

/// Per-trial state machine, advanced once per frame.
///
/// Transitions are decided against the predicted time of the next display
/// refresh so that playback and targets line up with what is on screen.
#[derive(Debug, Clone)]
pub struct TrialRunner {
    state: TrialState,
    audio_start_ns: u64,
    response_offset_ns: u64,
    audio_onset_ns: Option<u64>,
    window_onset_ns: Option<u64>,
}

impl TrialRunner {
    /// `audio_start_ns` is trial start plus ITI; `response_offset_ns` is the
    /// stream's eligibility offset after audio onset.
    pub fn new(audio_start_ns: u64, response_offset_ns: u64) -> Self {
        Self {
            state: TrialState::WaitingToStartAudio,
            audio_start_ns,
            response_offset_ns,
            audio_onset_ns: None,
            window_onset_ns: None,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn audio_onset(&self) -> Option<u64> {
        self.audio_onset_ns
    }

    pub fn window_onset(&self) -> Option<u64> {
        self.window_onset_ns
    }

    /// Records the refresh on which playback actually started.
    pub fn mark_audio_onset(&mut self, flip_ns: u64) {
        if self.state == TrialState::AudioPlaying && self.audio_onset_ns.is_none() {
            self.audio_onset_ns = Some(flip_ns);
        }
    }

    pub fn update(
        &mut self,
        now_ns: u64,
        next_flip_ns: u64,
        audio_playing: bool,
        response: Option<Response>,
    ) -> Vec<TrialEvent> {
        let mut events = Vec::new();
        match self.state {
            TrialState::WaitingToStartAudio => {
                if next_flip_ns >= self.audio_start_ns {
                    self.state = TrialState::AudioPlaying;
                    events.push(TrialEvent::StartAudio);
                }
            }
            TrialState::AudioPlaying => {
                // onset lands with the next flip
                let Some(onset) = self.audio_onset_ns else {
                    return events;
                };
                if !audio_playing {
                    self.end_without_response(&mut events);
                } else if next_flip_ns >= onset + self.response_offset_ns {
                    self.state = TrialState::ResponseWindowOpen;
                    self.window_onset_ns = Some(next_flip_ns);
                    log::debug!("Response window opens at {next_flip_ns} ns");
                    events.push(TrialEvent::ShowTargets);
                }
            }
            TrialState::ResponseWindowOpen => {
                if let Some(response) = response {
                    self.state = TrialState::Ended;
                    events.push(TrialEvent::Ended(TrialOutcome {
                        response,
                        response_ns: Some(now_ns),
                    }));
                } else if !audio_playing {
                    self.end_without_response(&mut events);
                }
            }
            TrialState::Ended => {}
        }
        events
    }

    fn end_without_response(&mut self, events: &mut Vec<TrialEvent>) {
        self.state = TrialState::Ended;
        events.push(TrialEvent::Ended(TrialOutcome {
            response: Response::NoResponse,
            response_ns: None,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: u64 = 10;

    #[test]
    fn audio_starts_on_the_first_frame_reaching_the_iti() {
        let mut runner = TrialRunner::new(100, 50);
        assert!(runner.update(80, 90, false, None).is_empty());
        assert_eq!(runner.update(90, 100, false, None), vec![TrialEvent::StartAudio]);
        assert_eq!(runner.state(), TrialState::AudioPlaying);
    }

    #[test]
    fn nothing_happens_until_onset_is_marked() {
        let mut runner = TrialRunner::new(0, 50);
        runner.update(0, 0, false, None);
        // player not yet reporting, no onset yet: no spurious timeout
        assert!(runner.update(5, 10, false, None).is_empty());
        runner.mark_audio_onset(10);
        assert_eq!(runner.audio_onset(), Some(10));
        assert!(runner.update(15, 20, true, None).is_empty());
    }

    #[test]
    fn window_opens_at_onset_plus_offset() {
        let mut runner = TrialRunner::new(0, 50);
        runner.update(0, 0, false, None);
        runner.mark_audio_onset(0);
        let mut t = 0;
        let mut opened_at = None;
        while opened_at.is_none() {
            let events = runner.update(t, t + FRAME, true, None);
            if events.contains(&TrialEvent::ShowTargets) {
                opened_at = Some(t + FRAME);
            }
            t += FRAME;
        }
        assert_eq!(opened_at, Some(50));
        assert_eq!(runner.window_onset(), Some(50));
    }

    #[test]
    fn responses_before_the_window_are_ignored() {
        let mut runner = TrialRunner::new(0, 1_000);
        runner.update(0, 0, false, None);
        runner.mark_audio_onset(0);
        assert!(runner.update(10, 20, true, Some(Response::Same)).is_empty());
        assert_eq!(runner.state(), TrialState::AudioPlaying);
    }

    #[test]
    fn response_in_window_ends_the_trial() {
        let mut runner = TrialRunner::new(0, 0);
        runner.update(0, 0, false, None);
        runner.mark_audio_onset(0);
        runner.update(1, 10, true, None);
        let events = runner.update(12, 20, true, Some(Response::Different));
        assert_eq!(
            events,
            vec![TrialEvent::Ended(TrialOutcome {
                response: Response::Different,
                response_ns: Some(12),
            })]
        );
        assert!(runner.update(20, 30, true, Some(Response::Same)).is_empty());
    }

    #[test]
    fn audio_running_out_ends_with_no_response() {
        let mut runner = TrialRunner::new(0, 0);
        runner.update(0, 0, false, None);
        runner.mark_audio_onset(0);
        runner.update(1, 10, true, None);
        let events = runner.update(500, 510, false, None);
        assert_eq!(
            events,
            vec![TrialEvent::Ended(TrialOutcome {
                response: Response::NoResponse,
                response_ns: None,
            })]
        );
    }

    #[test]
    fn audio_ending_before_the_window_still_ends_the_trial() {
        let mut runner = TrialRunner::new(0, 1_000);
        runner.update(0, 0, false, None);
        runner.mark_audio_onset(0);
        let events = runner.update(100, 110, false, None);
        assert!(matches!(
            events.as_slice(),
            [TrialEvent::Ended(TrialOutcome {
                response: Response::NoResponse,
                ..
            })]
        ));
    }
}
