use audmem_experiment::ResponseMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "audmem")]
#[command(about = "Auditory memory same/different task")]
pub struct Args {
    /// Run identifier, also the output directory name
    #[arg(long)]
    pub run_id: String,

    /// Viewing distance in centimetres
    #[arg(long, default_value = "60")]
    pub distance: f64,

    /// TTL backend: None, USB, MMB or ParallelPort
    #[arg(long, default_value = "None")]
    pub ttl: String,

    /// TTL port or address; taken from the monitor profile when omitted
    #[arg(long)]
    pub ttl_address: Option<String>,

    /// Monitor profile JSON
    #[arg(long)]
    pub monitor: Option<PathBuf>,

    /// Eye tracker sampling rate in Hz
    #[arg(long, default_value = "600")]
    pub eyetracker_hz: u32,

    /// Gaze CSV to replay as the eye tracker feed
    #[arg(long)]
    pub gaze_replay: Option<PathBuf>,

    /// Trial list CSV; built from the seed sets when omitted
    #[arg(long)]
    pub trials: Option<PathBuf>,

    /// Directory holding WAV stimuli named in the trial list
    #[arg(long, default_value = "stimuli")]
    pub stimuli: PathBuf,

    /// Task settings JSON
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Overrides the response mode from the settings
    #[arg(long, value_enum)]
    pub response_mode: Option<Mode>,

    #[arg(long, default_value = "logs")]
    pub logs_dir: PathBuf,

    /// TrueType font for on-screen text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Run in a window instead of full screen
    #[arg(long)]
    pub windowed: bool,

    /// Play no sound; time the streams from the clock
    #[arg(long)]
    pub simulate_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Keyboard,
    Mouse,
    Gaze,
}

impl From<Mode> for ResponseMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Keyboard => ResponseMode::Keyboard,
            Mode::Mouse => ResponseMode::Mouse,
            Mode::Gaze => ResponseMode::Gaze,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_command_line_uses_defaults() {
        let args = Args::try_parse_from(["audmem", "--run-id", "sub01"]).unwrap();
        assert_eq!(args.run_id, "sub01");
        assert_eq!(args.ttl, "None");
        assert_eq!(args.eyetracker_hz, 600);
        assert!(args.response_mode.is_none());
        assert!(!args.windowed);
    }

    #[test]
    fn response_mode_parses() {
        let args = Args::try_parse_from([
            "audmem",
            "--run-id",
            "x",
            "--response-mode",
            "gaze",
            "--simulate-audio",
        ])
        .unwrap();
        assert_eq!(args.response_mode.map(ResponseMode::from), Some(ResponseMode::Gaze));
        assert!(args.simulate_audio);
    }

    #[test]
    fn run_id_is_required() {
        assert!(Args::try_parse_from(["audmem"]).is_err());
    }
}
