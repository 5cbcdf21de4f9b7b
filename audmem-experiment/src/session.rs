use crate::detector::{FrameInput, ResponseDetector};
use crate::error::Result;
use crate::persist::{RunInfo, RunOutput, Snapshot};
use crate::runner::{TrialEvent, TrialOutcome, TrialRunner};
use crate::settings::Settings;
use crate::stimuli::StimulusBank;
use crate::trial_list::{ScheduledTrial, TrialList};
use audmem_audio::{assemble_stream, AssembledStream, AudioPlayer};
use audmem_core::{Feedback, Screen, SessionPhase, TrialResult, TrialState};
use audmem_gaze::{gaze_channel, GazeBuffer, GazeFeed, GazeLog, GazeSource};
use audmem_timing::{ns_to_secs, secs_to_ns, FrameClock, Timer};
use audmem_ttl::TtlPort;
use rand::Rng;
use std::path::PathBuf;

/// Eye tracker wired to the session: the source, its channel and the log
/// its samples end up in.
pub struct GazeLink {
    source: Box<dyn GazeSource>,
    feed: GazeFeed,
    log: GazeLog,
}

impl GazeLink {
    pub fn connect(mut source: Box<dyn GazeSource>, log: GazeLog) -> Result<Self> {
        let (tx, feed) = gaze_channel();
        source.subscribe(tx)?;
        log::info!("Eye tracker subscribed at {} Hz", source.sample_rate_hz());
        Ok(Self { source, feed, log })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.source.sample_rate_hz()
    }
}

/// Hardware the session drives.
pub struct Devices {
    pub player: Box<dyn AudioPlayer>,
    pub ttl: Box<dyn TtlPort>,
    pub detector: Box<dyn ResponseDetector>,
    pub gaze: Option<GazeLink>,
}

pub struct SessionConfig {
    pub settings: Settings,
    pub info: RunInfo,
    pub stimuli_dir: PathBuf,
    /// Nominal monitor refresh rate, used until calibration completes.
    pub refresh_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finished,
    Aborted,
}

struct ActiveTrial {
    number: usize,
    scheduled: ScheduledTrial,
    runner: TrialRunner,
    stream: AssembledStream,
    iti_s: f64,
    gaze: Option<GazeBuffer>,
}

struct FeedbackPeriod {
    result: TrialResult,
    onset_ns: Option<u64>,
    gaze: Option<GazeBuffer>,
}

/// Drives a whole run, one call to [`Session::update`] and one to
/// [`Session::on_flip`] per display refresh.
///
/// The window loop calls `update` with the input gathered since the previous
/// frame, draws [`Session::screen`], then reports the flip timestamp through
/// `on_flip`. Trigger codes and onsets are tied to that timestamp.
pub struct Session<T: Timer, R: Rng> {
    settings: Settings,
    info: RunInfo,
    timer: T,
    rng: R,
    clock: FrameClock,
    phase: SessionPhase,
    schedule: Vec<ScheduledTrial>,
    next: usize,
    stimuli: StimulusBank,
    devices: Devices,
    output: RunOutput,
    current: Option<ActiveTrial>,
    feedback: Option<FeedbackPeriod>,
    results: Vec<TrialResult>,
    onset_pending: bool,
    status: SessionStatus,
}

impl<T: Timer, R: Rng> Session<T, R> {
    pub fn new(
        config: SessionConfig,
        trials: &TrialList,
        devices: Devices,
        output: RunOutput,
        timer: T,
        mut rng: R,
    ) -> Self {
        let settings = config.settings;
        let schedule = trials.schedule(settings.n_reps, settings.order, &mut rng);
        let stimuli = StimulusBank::new(config.stimuli_dir, settings.tone_params(), settings.sound_fs);
        log::info!(
            "Session {}: {} trials ({} x {}), {:?} responses via {}",
            config.info.run_id,
            schedule.len(),
            trials.len(),
            settings.n_reps,
            settings.order,
            devices.detector.name()
        );
        Self {
            clock: FrameClock::new(config.refresh_hz),
            info: config.info,
            settings,
            timer,
            rng,
            phase: SessionPhase::default(),
            schedule,
            next: 0,
            stimuli,
            devices,
            output,
            current: None,
            feedback: None,
            results: Vec::new(),
            onset_pending: false,
            status: SessionStatus::Running,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn output(&self) -> &RunOutput {
        &self.output
    }

    pub fn scheduled_trials(&self) -> usize {
        self.schedule.len()
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current.as_ref().map(|t| t.runner.state())
    }

    /// Advances the session for the coming refresh.
    pub fn update(&mut self, input: &FrameInput) -> Result<SessionStatus> {
        if self.status != SessionStatus::Running {
            return Ok(self.status);
        }
        if input.escape() {
            log::warn!("Escape pressed, aborting run");
            self.close(true)?;
            return Ok(self.status);
        }

        let now = self.timer.now();
        match self.phase {
            SessionPhase::Calibration => {
                // nothing recorded before the first trial belongs to it
                self.drain_gaze();
                if self.clock.flip_count() >= self.settings.calibration_frames {
                    self.clock.apply_calibration();
                    if let Some(next) = self.phase.next() {
                        self.phase = next;
                    }
                    self.start_next_trial(now)?;
                }
            }
            SessionPhase::Trials => {
                self.drain_gaze();
                if self.feedback.is_some() {
                    self.poll_detector(input);
                    self.update_feedback(now)?;
                } else {
                    let next_flip = self.clock.next_flip(now);
                    self.update_trial(now, next_flip, input)?;
                }
            }
            SessionPhase::Finished => {}
        }
        Ok(self.status)
    }

    /// Reports that the frame drawn after the last `update` hit the screen.
    pub fn on_flip(&mut self, flip_ns: u64) {
        self.clock.record_flip(flip_ns);

        if self.onset_pending {
            self.onset_pending = false;
            if let Some(trial) = self.current.as_mut() {
                trial.runner.mark_audio_onset(flip_ns);
            }
            if let Err(e) = self.devices.ttl.send(self.settings.ttl_code) {
                log::warn!("TTL code {} not sent: {e}", self.settings.ttl_code);
            }
            log::debug!("Audio onset and TTL at {flip_ns} ns");
        }

        if let Some(period) = self.feedback.as_mut() {
            if period.onset_ns.is_none() {
                period.onset_ns = Some(flip_ns);
            }
        }
    }

    pub fn screen(&self) -> Screen {
        match self.phase {
            SessionPhase::Calibration => Screen {
                calibrating: true,
                ..Screen::fixation()
            },
            SessionPhase::Trials => {
                if let Some(period) = &self.feedback {
                    Screen::feedback(period.result.feedback)
                } else if self
                    .current
                    .as_ref()
                    .is_some_and(|t| t.runner.state() == TrialState::ResponseWindowOpen)
                {
                    Screen::with_targets()
                } else {
                    Screen::fixation()
                }
            }
            SessionPhase::Finished => Screen::default(),
        }
    }

    /// Ends the run early, writing everything collected so far.
    pub fn abort(&mut self) -> Result<()> {
        self.close(true)
    }

    fn drain_gaze(&mut self) {
        let Some(link) = self.devices.gaze.as_ref() else {
            return;
        };
        let buffer = match (self.current.as_mut(), self.feedback.as_mut()) {
            (Some(trial), _) => trial.gaze.as_mut(),
            (None, Some(period)) => period.gaze.as_mut(),
            (None, None) => None,
        };
        match buffer {
            Some(buffer) => {
                link.feed.drain_into(buffer);
            }
            None => {
                link.feed.discard();
            }
        }
    }

    fn poll_detector(&mut self, input: &FrameInput) {
        // keeps edge state current; nothing is accepted here
        let _ = self.devices.detector.poll(input, None);
    }

    fn update_trial(&mut self, now: u64, next_flip: u64, input: &FrameInput) -> Result<()> {
        let Some(trial) = self.current.as_mut() else {
            return Ok(());
        };
        let playing = self.devices.player.is_playing();
        let response = self
            .devices
            .detector
            .poll(input, trial.gaze.as_ref())
            .filter(|_| trial.runner.state().accepts_response());

        let mut ended = None;
        for event in trial.runner.update(now, next_flip, playing, response) {
            match event {
                TrialEvent::StartAudio => {
                    self.devices.player.play(&trial.stream.buffer)?;
                    self.onset_pending = true;
                    log::debug!("Trial {} audio scheduled for {next_flip} ns", trial.number);
                }
                TrialEvent::ShowTargets => {
                    log::debug!("Trial {} response window open", trial.number);
                }
                TrialEvent::Ended(outcome) => ended = Some(outcome),
            }
        }
        if let Some(outcome) = ended {
            self.devices.player.stop();
            self.end_trial(outcome, now);
        }
        Ok(())
    }

    fn end_trial(&mut self, outcome: TrialOutcome, now: u64) {
        let Some(trial) = self.current.take() else {
            return;
        };
        let definition = &trial.scheduled.definition;
        let expected = definition.expected_response();
        let response_time = outcome.response_ns.map(ns_to_secs).unwrap_or(0.0);
        let feedback = Feedback::evaluate(outcome.response, expected, response_time);
        let window_onset = trial.runner.window_onset();

        let result = TrialResult {
            trial: trial.number,
            repetition: trial.scheduled.repetition,
            cue: definition.cue.label(),
            choice: definition.choice.label(),
            clicks: definition.clicks,
            iti: trial.iti_s,
            correct_response: expected,
            response: outcome.response,
            response_time,
            reaction_time: outcome
                .response_ns
                .zip(window_onset)
                .map(|(r, w)| ns_to_secs(r.saturating_sub(w))),
            audio_onset: trial.runner.audio_onset().map(ns_to_secs).unwrap_or(0.0),
            audio_offset: ns_to_secs(now),
            response_window_onset: window_onset.map(ns_to_secs),
            feedback,
            feedback_onset: 0.0,
        };
        log::info!(
            "Trial {} ended: {} (expected {}), {}",
            trial.number,
            result.response,
            expected,
            feedback.message()
        );
        self.feedback = Some(FeedbackPeriod {
            result,
            onset_ns: None,
            gaze: trial.gaze,
        });
    }

    fn update_feedback(&mut self, now: u64) -> Result<()> {
        let done = match &self.feedback {
            Some(FeedbackPeriod {
                onset_ns: Some(onset),
                ..
            }) => now >= onset + secs_to_ns(self.settings.feedback_duration),
            _ => false,
        };
        if !done {
            return Ok(());
        }
        if let Some(mut period) = self.feedback.take() {
            period.result.feedback_onset = period.onset_ns.map(ns_to_secs).unwrap_or(0.0);
            self.results.push(period.result);
            self.flush_gaze(period.gaze)?;
        }
        self.start_next_trial(now)
    }

    fn start_next_trial(&mut self, now: u64) -> Result<()> {
        let Some(scheduled) = self.schedule.get(self.next).cloned() else {
            log::info!("All {} trials done", self.schedule.len());
            return self.close(false);
        };
        let number = self.next;
        self.next += 1;

        let definition = &scheduled.definition;
        let cue = self.stimuli.get(&definition.cue)?.clone();
        let choice = self.stimuli.get(&definition.choice)?.clone();
        let stream = assemble_stream(
            &cue,
            &choice,
            &self.settings.stream_timing(definition.isi_s),
            &self.settings.click_train(),
            self.settings.sound_fs,
            definition.clicks,
        )?;
        let iti_s = self.draw_iti();
        let runner = TrialRunner::new(
            now + secs_to_ns(iti_s),
            secs_to_ns(stream.layout.response_offset_s()),
        );
        self.devices.detector.reset();

        log::info!(
            "Trial {}/{}: cue {} choice {} (expect {}), ITI {:.3} s, {:.3} s of audio",
            number + 1,
            self.schedule.len(),
            definition.cue,
            definition.choice,
            definition.expected_response(),
            iti_s,
            stream.layout.duration_s()
        );
        let gaze = self.devices.gaze.as_ref().map(|_| GazeBuffer::new(number));
        self.current = Some(ActiveTrial {
            number,
            scheduled,
            runner,
            stream,
            iti_s,
            gaze,
        });
        Ok(())
    }

    /// Uniform ITI in whole milliseconds, upper bound exclusive.
    fn draw_iti(&mut self) -> f64 {
        let lo = (self.settings.iti.0 * 1000.0).round() as u64;
        let hi = (self.settings.iti.1 * 1000.0).round() as u64;
        let ms = if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        };
        ms as f64 / 1000.0
    }

    fn flush_gaze(&mut self, buffer: Option<GazeBuffer>) -> Result<()> {
        if let (Some(buffer), Some(link)) = (buffer, self.devices.gaze.as_mut()) {
            buffer.flush(&mut link.log)?;
        }
        Ok(())
    }

    fn close(&mut self, aborted: bool) -> Result<()> {
        if self.status != SessionStatus::Running {
            return Ok(());
        }
        self.status = if aborted {
            SessionStatus::Aborted
        } else {
            SessionStatus::Finished
        };
        self.drain_gaze();
        self.phase = SessionPhase::Finished;
        self.devices.player.stop();

        // an interrupted trial keeps its gaze samples but gets no result row
        let pending = self
            .current
            .take()
            .and_then(|t| t.gaze)
            .or_else(|| self.feedback.take().and_then(|p| p.gaze));
        self.feedback = None;
        if let Some(link) = self.devices.gaze.as_mut() {
            link.source.unsubscribe();
        }
        self.flush_gaze(pending)?;

        self.output.write_results(&self.results)?;
        self.output.write_snapshot(&Snapshot {
            info: self.info.clone(),
            settings: self.settings.clone(),
            aborted,
            results: self.results.clone(),
        })?;
        if let Err(e) = self.devices.ttl.close() {
            log::warn!("Closing TTL port failed: {e}");
        }
        log::info!(
            "Run {} {}: {} results written to {}",
            self.info.run_id,
            if aborted { "aborted" } else { "finished" },
            self.results.len(),
            self.output.dir().display()
        );
        Ok(())
    }
}
