use audmem_audio::SimulatedPlayer;
use audmem_core::{Feedback, Response, SessionPhase, TrialState};
use audmem_experiment::{
    build_detector, read_results, Devices, FrameInput, GazeLink, ResponseMode, RunInfo, RunOutput,
    Session, SessionConfig, SessionStatus, Settings, Snapshot, TrialList,
};
use audmem_gaze::{
    read_gaze_csv, EyeSample, GazeError, GazeLog, GazeSample, GazeSender, GazeSource,
};
use audmem_timing::{ManualTimer, Timer};
use audmem_ttl::{TtlError, TtlPort};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(10);
const MAX_FRAMES: usize = 5_000;

#[derive(Clone, Default)]
struct RecordingTtl(Arc<Mutex<Vec<u8>>>);

impl TtlPort for RecordingTtl {
    fn send(&mut self, code: u8) -> Result<(), TtlError> {
        self.0.lock().unwrap().push(code);
        Ok(())
    }
}

/// Gaze source the test pushes samples into by hand.
#[derive(Clone, Default)]
struct ManualGaze(Arc<Mutex<Option<GazeSender>>>);

impl ManualGaze {
    fn look_at(&self, x: f64, y: f64, n: usize) {
        let guard = self.0.lock().unwrap();
        let tx = guard.as_ref().unwrap();
        for i in 0..n {
            tx.send(GazeSample::binocular(
                i as i64,
                EyeSample::looking_at(x, y),
                EyeSample::looking_at(x, y),
            ))
            .unwrap();
        }
    }
}

impl GazeSource for ManualGaze {
    fn sample_rate_hz(&self) -> u32 {
        100
    }

    fn subscribe(&mut self, sender: GazeSender) -> Result<(), GazeError> {
        *self.0.lock().unwrap() = Some(sender);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.0.lock().unwrap().take();
    }
}

fn fast_settings(mode: ResponseMode) -> Settings {
    Settings {
        iti: (0.0, 0.0),
        pre_time: 0.0,
        trial_time: 0.1,
        wait_time: 0.2,
        click_soa: 0.05,
        click_dur: 0.01,
        sequence_duration: 0.1,
        feedback_duration: 0.05,
        response_fixation_time: 0.05,
        sound_fs: 8_000,
        ttl_code: 7,
        calibration_frames: 3,
        response_mode: mode,
        ..Settings::default()
    }
}

struct Rig {
    session: Session<ManualTimer, StdRng>,
    timer: ManualTimer,
    ttl: RecordingTtl,
    gaze: ManualGaze,
    _logs: tempfile::TempDir,
}

impl Rig {
    fn new(settings: Settings, trials: TrialList, with_gaze: bool) -> Self {
        let logs = tempfile::tempdir().unwrap();
        let output = RunOutput::create(logs.path(), "test").unwrap();
        let timer = ManualTimer::new();
        let ttl = RecordingTtl::default();
        let gaze = ManualGaze::default();

        let link = with_gaze.then(|| {
            let log = GazeLog::create(output.gaze_path()).unwrap();
            GazeLink::connect(Box::new(gaze.clone()), log).unwrap()
        });
        let detector = build_detector(&settings, link.as_ref().map(|l| l.sample_rate_hz())).unwrap();
        let devices = Devices {
            player: Box::new(SimulatedPlayer::new(timer.clone(), settings.sound_fs)),
            ttl: Box::new(ttl.clone()),
            detector,
            gaze: link,
        };
        let config = SessionConfig {
            settings,
            info: RunInfo::new("test"),
            stimuli_dir: logs.path().to_path_buf(),
            refresh_hz: 100.0,
        };
        let session = Session::new(
            config,
            &trials,
            devices,
            output,
            timer.clone(),
            StdRng::seed_from_u64(1),
        );
        Self {
            session,
            timer,
            ttl,
            gaze,
            _logs: logs,
        }
    }

    /// update, draw, flip
    fn step(&mut self, input: &FrameInput) -> SessionStatus {
        let status = self.session.update(input).unwrap();
        self.timer.advance(FRAME);
        self.session.on_flip(self.timer.now());
        status
    }

    fn idle_until(&mut self, done: impl Fn(&Session<ManualTimer, StdRng>) -> bool) {
        for _ in 0..MAX_FRAMES {
            if done(&self.session) {
                return;
            }
            self.step(&FrameInput::default());
        }
        panic!("condition not reached within {MAX_FRAMES} frames");
    }

    fn wait_for_targets(&mut self) {
        self.idle_until(|s| s.screen().targets);
    }

    fn run_to_end(&mut self) {
        self.idle_until(|s| s.status() != SessionStatus::Running);
    }
}

fn click(x: f64, y: f64, down: bool) -> FrameInput {
    FrameInput {
        keys: vec![],
        pointer: Some((x, y)),
        pointer_down: down,
    }
}

fn key(name: &str) -> FrameInput {
    FrameInput {
        keys: vec![name.to_string()],
        ..FrameInput::default()
    }
}

fn same_trial() -> TrialList {
    TrialList::from_seeds(&[42], &[], 400.0)
}

#[test]
fn audio_running_out_records_na_with_zero_time() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    rig.run_to_end();

    assert_eq!(rig.session.status(), SessionStatus::Finished);
    let results = rig.session.results();
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.response, Response::NoResponse);
    assert_eq!(r.response_time, 0.0);
    assert_eq!(r.reaction_time, None);
    assert_eq!(r.feedback, Feedback::NoResponse);
    assert_eq!(r.correct_response, Response::Same);
    assert!(r.response_window_onset.is_some());
    assert!(r.audio_offset > r.audio_onset);
    assert!(r.feedback_onset >= r.audio_offset);

    let written = read_results(rig.session.output().results_path()).unwrap();
    assert_eq!(written, results);
}

#[test]
fn click_in_window_records_response_and_feedback() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    rig.wait_for_targets();
    rig.step(&click(-0.5, 0.0, true));
    rig.run_to_end();

    let r = &rig.session.results()[0];
    assert_eq!(r.response, Response::Same);
    assert_eq!(r.feedback, Feedback::Correct);
    assert!(r.response_time > 0.0);
    let rt = r.reaction_time.unwrap();
    assert!((0.0..0.05).contains(&rt), "reaction time {rt}");
}

#[test]
fn button_held_into_the_window_does_not_respond() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    rig.idle_until(|s| s.current_trial_state() == Some(TrialState::AudioPlaying));

    // pressed before targets appear and held until the audio runs out
    let held = click(-0.5, 0.0, true);
    for _ in 0..MAX_FRAMES {
        if rig.session.status() != SessionStatus::Running {
            break;
        }
        rig.step(&held);
    }
    let r = &rig.session.results()[0];
    assert_eq!(r.response, Response::NoResponse);
    assert_eq!(r.response_time, 0.0);
}

#[test]
fn expected_response_follows_stimulus_identity() {
    let trials = TrialList::from_seeds(&[42], &[56], 400.0);
    let mut rig = Rig::new(fast_settings(ResponseMode::Keyboard), trials, false);

    rig.wait_for_targets();
    rig.step(&key("d"));
    rig.wait_for_targets();
    rig.step(&key("d"));
    rig.run_to_end();

    let results = rig.session.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].correct_response, Response::Same);
    assert_eq!(results[0].response, Response::Different);
    assert_eq!(results[0].feedback, Feedback::Incorrect);
    assert_eq!(results[1].correct_response, Response::Different);
    assert_eq!(results[1].feedback, Feedback::Correct);
    assert_eq!(results[1].cue, "400Hz/seed42");
    assert_eq!(results[1].choice, "400Hz/seed56");
}

#[test]
fn one_trigger_per_trial_at_audio_onset() {
    let trials = TrialList::from_seeds(&[1, 2], &[3], 400.0);
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), trials, false);
    rig.run_to_end();

    assert_eq!(rig.session.results().len(), 4);
    assert_eq!(*rig.ttl.0.lock().unwrap(), vec![7, 7, 7, 7]);
    let period = rig.session.clock().period_ns();
    assert_eq!(period, 10_000_000);
    for r in rig.session.results() {
        // onsets land on refresh boundaries
        let onset_ns = (r.audio_onset * 1e9).round() as u64;
        assert_eq!(onset_ns % period, 0);
    }
}

#[test]
fn escape_mid_trial_writes_completed_rows_only() {
    let trials = TrialList::from_seeds(&[42], &[56], 400.0);
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), trials, false);

    rig.idle_until(|s| s.results().len() == 1);
    rig.idle_until(|s| s.current_trial_state() == Some(TrialState::AudioPlaying));
    assert_eq!(rig.step(&key("escape")), SessionStatus::Aborted);
    assert_eq!(rig.session.phase(), SessionPhase::Finished);

    let output = rig.session.output();
    let rows = read_results(output.results_path()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trial, 0);

    let text = std::fs::read_to_string(output.snapshot_path()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&text).unwrap();
    assert!(snapshot.aborted);
    assert_eq!(snapshot.results.len(), 1);

    // further frames change nothing
    assert_eq!(rig.step(&key("s")), SessionStatus::Aborted);
    assert_eq!(rig.session.results().len(), 1);
}

#[test]
fn escape_during_feedback_drops_that_trial() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    rig.idle_until(|s| s.screen().feedback.is_some());
    rig.step(&key("escape"));
    assert_eq!(rig.session.status(), SessionStatus::Aborted);
    assert!(read_results(rig.session.output().results_path())
        .unwrap()
        .is_empty());
}

#[test]
fn fixation_on_a_target_responds_and_gaze_is_logged_per_trial() {
    let trials = TrialList::from_seeds(&[42], &[56], 400.0);
    let mut rig = Rig::new(fast_settings(ResponseMode::Gaze), trials, true);

    rig.wait_for_targets();
    // diff target is right of centre: display-area x 0.75
    rig.gaze.look_at(0.75, 0.5, 5);
    rig.step(&FrameInput::default());
    rig.step(&FrameInput::default());
    rig.wait_for_targets();
    // a window too short to register
    rig.gaze.look_at(0.75, 0.5, 4);
    rig.run_to_end();

    let results = rig.session.results();
    assert_eq!(results[0].response, Response::Different);
    assert_eq!(results[0].feedback, Feedback::Incorrect);
    assert_eq!(results[1].response, Response::NoResponse);

    let samples = read_gaze_csv(rig.session.output().gaze_path()).unwrap();
    assert_eq!(samples.len(), 9);
}

#[test]
fn calibration_measures_the_refresh_before_trials() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    assert!(rig.session.screen().calibrating);
    rig.idle_until(|s| s.phase() == SessionPhase::Trials);
    assert!(rig.session.clock().flip_count() >= 3);
    assert_eq!(rig.session.clock().period_ns(), 10_000_000);
    assert!(!rig.session.screen().calibrating);
}

#[test]
fn gaze_during_calibration_is_not_attributed_to_the_first_trial() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Gaze), same_trial(), true);
    assert!(rig.session.screen().calibrating);
    // long fixation on the diff target before any trial exists
    rig.gaze.look_at(0.75, 0.5, 50);
    rig.run_to_end();

    let r = &rig.session.results()[0];
    assert_eq!(r.response, Response::NoResponse);
    assert_eq!(r.feedback, Feedback::NoResponse);
    let samples = read_gaze_csv(rig.session.output().gaze_path()).unwrap();
    assert!(samples.is_empty(), "{} calibration samples logged", samples.len());
}

#[test]
fn escape_during_the_iti_aborts_before_any_trigger() {
    let settings = Settings {
        iti: (0.2, 0.2),
        ..fast_settings(ResponseMode::Mouse)
    };
    let mut rig = Rig::new(settings, same_trial(), false);
    rig.idle_until(|s| s.current_trial_state() == Some(TrialState::WaitingToStartAudio));
    assert_eq!(rig.step(&key("escape")), SessionStatus::Aborted);

    assert!(rig.ttl.0.lock().unwrap().is_empty());
    let output = rig.session.output();
    assert!(read_results(output.results_path()).unwrap().is_empty());
    let text = std::fs::read_to_string(output.snapshot_path()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&text).unwrap();
    assert!(snapshot.aborted);
    assert!(snapshot.results.is_empty());
}

#[test]
fn escape_with_targets_shown_drops_the_open_trial() {
    let mut rig = Rig::new(fast_settings(ResponseMode::Mouse), same_trial(), false);
    rig.wait_for_targets();
    assert_eq!(rig.session.current_trial_state(), Some(TrialState::ResponseWindowOpen));
    assert_eq!(rig.step(&key("escape")), SessionStatus::Aborted);

    assert!(rig.session.results().is_empty());
    assert!(read_results(rig.session.output().results_path())
        .unwrap()
        .is_empty());
    assert_eq!(rig.session.screen(), audmem_core::Screen::default());
}
