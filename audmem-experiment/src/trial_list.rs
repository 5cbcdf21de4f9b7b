use crate::error::{ExperimentError, Result};
use crate::settings::TrialOrder;
use audmem_core::{StimulusId, TrialDefinition};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TrialRow {
    #[serde(default)]
    cuesound: Option<String>,
    #[serde(default)]
    choicesound: Option<String>,
    #[serde(default)]
    cue_seed: Option<u64>,
    #[serde(default)]
    choice_seed: Option<u64>,
    #[serde(default)]
    cue_frequency: Option<f64>,
    #[serde(default)]
    choice_frequency: Option<f64>,
    #[serde(default)]
    clicks: Option<String>,
    #[serde(default)]
    isi: Option<f64>,
}

impl TrialRow {
    fn into_definition(self, index: usize, frequency: f64) -> Result<TrialDefinition> {
        let invalid = |reason: &str| ExperimentError::InvalidTrialList {
            row: index + 1,
            reason: reason.to_string(),
        };
        let (cue, choice) = match (self.cuesound, self.choicesound, self.cue_seed, self.choice_seed) {
            (Some(cue), Some(choice), _, _) => (StimulusId::file(cue), StimulusId::file(choice)),
            (None, None, Some(cue), Some(choice)) => (
                StimulusId::tone(self.cue_frequency.unwrap_or(frequency), cue),
                StimulusId::tone(self.choice_frequency.unwrap_or(frequency), choice),
            ),
            _ => {
                return Err(invalid(
                    "needs cuesound/choicesound or cue_seed/choice_seed",
                ))
            }
        };
        let clicks = match self.clicks.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(v) if ["1", "true", "yes", "True", "TRUE"].contains(&v) => true,
            Some(v) if ["0", "false", "no", "False", "FALSE"].contains(&v) => false,
            Some(v) => return Err(invalid(&format!("clicks value {v:?} is not a boolean"))),
        };
        if let Some(isi) = self.isi {
            if !isi.is_finite() || isi < 0.0 {
                return Err(invalid(&format!("isi {isi} must be >= 0")));
            }
        }
        Ok(TrialDefinition {
            index,
            cue,
            choice,
            clicks,
            isi_s: self.isi,
        })
    }
}

/// One trial as it will be run: the definition plus its repetition number.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTrial {
    pub definition: TrialDefinition,
    pub repetition: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialList {
    pub definitions: Vec<TrialDefinition>,
}

impl TrialList {
    /// Reads a trial list CSV. Seed rows without a frequency use `frequency`.
    pub fn load_csv(path: impl AsRef<Path>, frequency: f64) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut definitions = Vec::new();
        for (index, row) in reader.deserialize::<TrialRow>().enumerate() {
            definitions.push(row?.into_definition(index, frequency)?);
        }
        if definitions.is_empty() {
            return Err(ExperimentError::InvalidTrialList {
                row: 0,
                reason: "no trials".into(),
            });
        }
        log::info!(
            "Loaded {} trials from {}",
            definitions.len(),
            path.as_ref().display()
        );
        Ok(Self { definitions })
    }

    /// One `same` trial per cue seed, then one `diff` trial per cue/target pair.
    pub fn from_seeds(cue_seeds: &[u64], target_seeds: &[u64], frequency: f64) -> Self {
        let mut definitions = Vec::new();
        for &cue in cue_seeds {
            definitions.push(TrialDefinition {
                index: definitions.len(),
                cue: StimulusId::tone(frequency, cue),
                choice: StimulusId::tone(frequency, cue),
                clicks: true,
                isi_s: None,
            });
        }
        for &cue in cue_seeds {
            for &target in target_seeds {
                definitions.push(TrialDefinition {
                    index: definitions.len(),
                    cue: StimulusId::tone(frequency, cue),
                    choice: StimulusId::tone(frequency, target),
                    clicks: true,
                    isi_s: None,
                });
            }
        }
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Expands the list into `n_reps` passes, shuffling each pass for
    /// random order.
    pub fn schedule<R: Rng>(&self, n_reps: usize, order: TrialOrder, rng: &mut R) -> Vec<ScheduledTrial> {
        let mut out = Vec::with_capacity(self.len() * n_reps);
        for repetition in 0..n_reps {
            let mut pass: Vec<&TrialDefinition> = self.definitions.iter().collect();
            if order == TrialOrder::Random {
                pass.shuffle(rng);
            }
            out.extend(pass.into_iter().map(|definition| ScheduledTrial {
                definition: definition.clone(),
                repetition,
            }));
        }
        out
    }
}
