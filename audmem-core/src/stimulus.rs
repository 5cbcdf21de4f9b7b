use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a cue or choice sound.
///
/// Two trials play the same waveform exactly when their identities are equal:
/// tone sequences are fully determined by centre frequency and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StimulusId {
    Tone { frequency_hz: f64, seed: u64 },
    File { name: String },
}

impl StimulusId {
    pub fn tone(frequency_hz: f64, seed: u64) -> Self {
        StimulusId::Tone { frequency_hz, seed }
    }

    pub fn file(name: impl Into<String>) -> Self {
        StimulusId::File { name: name.into() }
    }

    /// Short label used in the result table.
    pub fn label(&self) -> String {
        match self {
            StimulusId::Tone { frequency_hz, seed } => format!("{frequency_hz}Hz/seed{seed}"),
            StimulusId::File { name } => name.clone(),
        }
    }
}

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
