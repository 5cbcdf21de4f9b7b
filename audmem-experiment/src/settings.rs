use crate::error::{ExperimentError, Result};
use audmem_audio::{ClickTrain, StreamTiming, ToneSequenceParams};
use audmem_gaze::Region;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrialOrder {
    #[default]
    Sequential,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Keyboard,
    #[default]
    Mouse,
    Gaze,
}

/// A response target in normalized window units (-1..1, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub center: (f64, f64),
    pub size: (f64, f64),
}

impl Button {
    pub fn region(&self) -> Region {
        Region::centered(self.center, self.size)
    }
}

/// Task parameters. Field names follow the lab's settings table so existing
/// `task_settings` overrides keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Inter-trial interval range in seconds, drawn per trial.
    pub iti: (f64, f64),
    #[serde(alias = "nTrials")]
    pub n_reps: usize,
    pub order: TrialOrder,
    /// Silence/clicks before cue onset, seconds.
    pub pre_time: f64,
    /// Cue offset to choice onset, seconds.
    pub trial_time: f64,
    /// Time left to respond after choice offset, seconds.
    pub wait_time: f64,
    pub click_soa: f64,
    pub click_dur: f64,
    pub click_scale: f32,
    pub response_fixation_time: f64,
    pub sequence_duration: f64,
    pub tone_duration: f64,
    pub ramp_duration: f64,
    pub feedback_duration: f64,
    pub frequency: f64,
    pub frequency_range: f64,
    pub coherence: f64,
    pub cue_seeds: Vec<u64>,
    pub target_seeds: Vec<u64>,
    pub sound_fs: u32,
    pub ttl_code: u8,
    /// Refreshes measured before the first trial.
    pub calibration_frames: usize,
    pub response_mode: ResponseMode,
    pub same_key: String,
    pub diff_key: String,
    pub same_button: Button,
    pub diff_button: Button,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iti: (0.0, 1.0),
            n_reps: 1,
            order: TrialOrder::Sequential,
            pre_time: 0.624,
            trial_time: 0.624 * 8.0,
            wait_time: 0.624 * 8.0,
            click_soa: 0.624,
            click_dur: 0.01,
            click_scale: 0.25,
            response_fixation_time: 0.5,
            sequence_duration: 0.5,
            tone_duration: 0.025,
            ramp_duration: 0.005,
            feedback_duration: 1.0,
            frequency: 400.0,
            frequency_range: 0.1,
            coherence: 0.5,
            cue_seeds: vec![42, 56],
            target_seeds: vec![33, 102],
            sound_fs: 48_000,
            ttl_code: 1,
            calibration_frames: 60,
            response_mode: ResponseMode::Mouse,
            same_key: "s".into(),
            diff_key: "d".into(),
            same_button: Button {
                center: (-0.5, 0.0),
                size: (0.3, 0.3),
            },
            diff_button: Button {
                center: (0.5, 0.0),
                size: (0.3, 0.3),
            },
        }
    }
}

impl Settings {
    /// Reads a settings file; absent keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies a monitor profile: its `task_settings` overrides first, then
    /// the hardware fields it always carries.
    pub fn with_profile(&self, profile: &MonitorProfile) -> Result<Self> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(overrides) = &profile.task_settings {
            for (key, value) in overrides {
                if key == "nTrials" {
                    merged.insert("n_reps".into(), value.clone());
                } else {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        let mut settings: Settings = serde_json::from_value(Value::Object(merged))?;
        if let Some(fs) = profile.sound_fs {
            settings.sound_fs = fs;
        }
        if let Some(code) = profile.ttl_code {
            settings.ttl_code = code;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ExperimentError::InvalidSettings(msg));
        let times = [
            ("pre_time", self.pre_time),
            ("trial_time", self.trial_time),
            ("wait_time", self.wait_time),
            ("feedback_duration", self.feedback_duration),
            ("iti", self.iti.0),
        ];
        for (name, value) in times {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{name} must be >= 0, got {value}"));
            }
        }
        if self.iti.1 < self.iti.0 {
            return fail(format!("iti range {:?} is reversed", self.iti));
        }
        if self.click_dur <= 0.0 || self.click_soa < self.click_dur {
            return fail(format!(
                "click_soa ({}) must be at least click_dur ({})",
                self.click_soa, self.click_dur
            ));
        }
        if self.sound_fs == 0 {
            return fail("sound_fs must be positive".into());
        }
        if self.n_reps == 0 {
            return fail("n_reps must be at least 1".into());
        }
        if self.response_fixation_time <= 0.0 {
            return fail("response_fixation_time must be positive".into());
        }
        if self.tone_duration <= 0.0 || self.sequence_duration < self.tone_duration {
            return fail("sequence_duration must hold at least one tone".into());
        }
        if self.same_key == self.diff_key {
            return fail(format!("same and diff keys are both {:?}", self.same_key));
        }
        Ok(())
    }

    pub fn stream_timing(&self, isi_override: Option<f64>) -> StreamTiming {
        StreamTiming {
            pre_time_s: self.pre_time,
            isi_s: isi_override.unwrap_or(self.trial_time),
            post_time_s: self.wait_time,
        }
    }

    pub fn click_train(&self) -> ClickTrain {
        ClickTrain {
            click_duration_s: self.click_dur,
            soa_s: self.click_soa,
            scale: self.click_scale,
        }
    }

    pub fn tone_params(&self) -> ToneSequenceParams {
        ToneSequenceParams {
            coherence: self.coherence,
            frequency_range_octaves: self.frequency_range,
            tone_duration_s: self.tone_duration,
            sequence_duration_s: self.sequence_duration,
            ramp_duration_s: self.ramp_duration,
            ..ToneSequenceParams::default()
        }
    }
}

/// Per-rig monitor and hardware description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorProfile {
    pub screen_resolution: (u32, u32),
    /// Physical width in centimetres.
    pub monitor_width: f64,
    #[serde(default)]
    pub full_screen: bool,
    #[serde(default = "default_refresh")]
    pub refresh_rate: f64,
    #[serde(default)]
    pub sound_fs: Option<u32>,
    #[serde(default)]
    pub ttl_code: Option<u8>,
    #[serde(default)]
    pub pport_port_code: Option<String>,
    #[serde(default)]
    pub mmb_port_code: Option<String>,
    #[serde(default)]
    pub usb_port_code: Option<String>,
    #[serde(default)]
    pub task_settings: Option<Map<String, Value>>,
}

fn default_refresh() -> f64 {
    60.0
}

impl Default for MonitorProfile {
    fn default() -> Self {
        Self {
            screen_resolution: (1920, 1080),
            monitor_width: 53.0,
            full_screen: true,
            refresh_rate: default_refresh(),
            sound_fs: None,
            ttl_code: None,
            pport_port_code: None,
            mmb_port_code: None,
            usb_port_code: None,
            task_settings: None,
        }
    }
}

impl MonitorProfile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Port string for a TTL backend name, as stored in the profile.
    pub fn ttl_address(&self, backend: &str) -> Option<&str> {
        match backend.to_ascii_lowercase().as_str() {
            "parallelport" | "parallel" => self.pport_port_code.as_deref(),
            "mmb" => self.mmb_port_code.as_deref(),
            "usb" | "usb_ttl" => self.usb_port_code.as_deref(),
            _ => None,
        }
    }
}
