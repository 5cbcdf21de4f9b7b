use crate::cli::Args;
use anyhow::{Context, Result};
use audmem_audio::{AudioPlayer, SimulatedPlayer};
use audmem_experiment::{
    build_detector, Devices, GazeLink, MonitorProfile, RunInfo, RunOutput, Session, SessionConfig,
    Settings, TrialList,
};
use audmem_gaze::{GazeLog, ReplaySource};
use audmem_render::{NormRect, TargetLayout};
use audmem_timing::HighPrecisionTimer;
use audmem_ttl::TtlBackend;
use rand::rngs::ThreadRng;

pub type AppSession = Session<HighPrecisionTimer, ThreadRng>;

/// Everything the window loop needs, built before any window exists.
pub struct Experiment {
    pub session: AppSession,
    pub timer: HighPrecisionTimer,
    pub profile: MonitorProfile,
    pub layout: TargetLayout,
}

pub fn build(args: &Args) -> Result<Experiment> {
    let profile = match &args.monitor {
        Some(path) => MonitorProfile::load(path)
            .with_context(|| format!("Failed to read monitor profile {}", path.display()))?,
        None => MonitorProfile::default(),
    };

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?,
        None => Settings::default(),
    };
    if args.monitor.is_some() {
        settings = settings
            .with_profile(&profile)
            .context("Monitor profile task settings are invalid")?;
    }
    if let Some(mode) = args.response_mode {
        settings.response_mode = mode.into();
    }
    settings.validate().context("Invalid task settings")?;

    let trials = match &args.trials {
        Some(path) => TrialList::load_csv(path, settings.frequency)
            .with_context(|| format!("Failed to read trial list {}", path.display()))?,
        None => TrialList::from_seeds(&settings.cue_seeds, &settings.target_seeds, settings.frequency),
    };
    anyhow::ensure!(!trials.is_empty(), "Trial list is empty");

    let output = RunOutput::create(&args.logs_dir, &args.run_id)
        .context("Cannot create run output directory")?;

    let address = args
        .ttl_address
        .as_deref()
        .or_else(|| profile.ttl_address(&args.ttl));
    let backend = TtlBackend::parse(&args.ttl, address).context("Invalid TTL configuration")?;
    let ttl = audmem_ttl::open(&backend)
        .with_context(|| format!("Cannot open TTL device {backend}"))?;

    let timer = HighPrecisionTimer::new();
    let player = open_player(args, &timer, settings.sound_fs)?;

    let gaze = match &args.gaze_replay {
        Some(path) => {
            let source = ReplaySource::from_csv(path, args.eyetracker_hz)
                .with_context(|| format!("Failed to read gaze replay {}", path.display()))?;
            let log = GazeLog::create(output.gaze_path()).context("Cannot create gaze log")?;
            Some(GazeLink::connect(Box::new(source), log).context("Eye tracker subscription failed")?)
        }
        None => None,
    };
    let detector = build_detector(&settings, gaze.as_ref().map(GazeLink::sample_rate_hz))
        .context("Cannot set up response detection")?;

    let mut info = RunInfo::new(&args.run_id);
    info.distance_cm = args.distance;
    info.monitor = args
        .monitor
        .as_ref()
        .and_then(|p| p.file_stem())
        .map_or_else(|| "default".to_string(), |s| s.to_string_lossy().into_owned());
    info.ttl = backend.to_string();
    info.eyetracker_hz = gaze.as_ref().map(GazeLink::sample_rate_hz);

    let layout = TargetLayout {
        same: norm_rect(settings.same_button.center, settings.same_button.size),
        diff: norm_rect(settings.diff_button.center, settings.diff_button.size),
    };

    let config = SessionConfig {
        settings,
        info,
        stimuli_dir: args.stimuli.clone(),
        refresh_hz: profile.refresh_rate,
    };
    let devices = Devices {
        player,
        ttl,
        detector,
        gaze,
    };
    let session = Session::new(config, &trials, devices, output, timer.clone(), rand::rng());

    Ok(Experiment {
        session,
        timer,
        profile,
        layout,
    })
}

#[cfg(feature = "playback")]
fn open_player(args: &Args, timer: &HighPrecisionTimer, fs: u32) -> Result<Box<dyn AudioPlayer>> {
    if args.simulate_audio {
        log::warn!("Simulated audio: no sound will be played");
        return Ok(Box::new(SimulatedPlayer::new(timer.clone(), fs)));
    }
    let player = audmem_audio::CpalPlayer::new(fs).context("Cannot open audio output")?;
    Ok(Box::new(player))
}

#[cfg(not(feature = "playback"))]
fn open_player(_args: &Args, timer: &HighPrecisionTimer, fs: u32) -> Result<Box<dyn AudioPlayer>> {
    log::warn!("Built without playback: no sound will be played");
    Ok(Box::new(SimulatedPlayer::new(timer.clone(), fs)))
}

fn norm_rect(center: (f64, f64), size: (f64, f64)) -> NormRect {
    NormRect {
        center: (center.0 as f32, center.1 as f32),
        size: (size.0 as f32, size.1 as f32),
    }
}
