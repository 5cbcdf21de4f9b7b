use crate::error::Result;
use audmem_audio::{generate_tone_sequence, read_wav, StereoBuffer, ToneSequenceParams};
use audmem_core::StimulusId;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolves stimulus identities to waveforms at the session rate.
///
/// Each identity is synthesised or read once; trials that reuse a cue or a
/// choice get the cached buffer.
pub struct StimulusBank {
    dir: PathBuf,
    params: ToneSequenceParams,
    sample_rate: u32,
    cache: HashMap<String, StereoBuffer>,
}

impl StimulusBank {
    pub fn new(dir: impl Into<PathBuf>, params: ToneSequenceParams, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            params,
            sample_rate,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: &StimulusId) -> Result<&StereoBuffer> {
        let key = id.label();
        if !self.cache.contains_key(&key) {
            let buffer = match id {
                StimulusId::Tone { frequency_hz, seed } => {
                    generate_tone_sequence(*frequency_hz, *seed, &self.params, self.sample_rate)
                }
                StimulusId::File { name } => read_wav(self.dir.join(name), self.sample_rate)?,
            };
            log::debug!("Prepared stimulus {key}: {} frames", buffer.len());
            self.cache.insert(key.clone(), buffer);
        }
        Ok(&self.cache[&key])
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
