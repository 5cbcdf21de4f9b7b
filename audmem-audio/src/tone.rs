use crate::buffer::StereoBuffer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Shape of a cue/choice "sound cloud".
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSequenceParams {
    /// Fraction of tones played at the centre frequency.
    pub coherence: f64,
    /// Maximum deviation of the incoherent tones, in octaves.
    pub frequency_range_octaves: f64,
    pub tone_duration_s: f64,
    pub sequence_duration_s: f64,
    pub ramp_duration_s: f64,
    pub amplitude: f32,
}

impl Default for ToneSequenceParams {
    fn default() -> Self {
        Self {
            coherence: 0.5,
            frequency_range_octaves: 0.1,
            tone_duration_s: 0.025,
            sequence_duration_s: 0.5,
            ramp_duration_s: 0.005,
            amplitude: 1.0,
        }
    }
}

impl ToneSequenceParams {
    pub fn tone_count(&self) -> usize {
        if self.tone_duration_s <= 0.0 {
            return 0;
        }
        (self.sequence_duration_s / self.tone_duration_s + 1e-9).floor() as usize
    }
}

/// Synthesises a shuffled tone sequence around `frequency_hz`.
///
/// The output depends only on the arguments: the same frequency and seed
/// always produce the same waveform.
pub fn generate_tone_sequence(
    frequency_hz: f64,
    seed: u64,
    params: &ToneSequenceParams,
    sample_rate: u32,
) -> StereoBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let num_tones = params.tone_count();
    let num_coherent = (num_tones as f64 * params.coherence.clamp(0.0, 1.0)).floor() as usize;

    let mut frequencies: Vec<f64> = (0..num_tones)
        .map(|i| {
            if i < num_coherent {
                frequency_hz
            } else {
                let shift: f64 = rng.random_range(-1.0..1.0);
                frequency_hz * 2f64.powf(shift * params.frequency_range_octaves)
            }
        })
        .collect();
    frequencies.shuffle(&mut rng);

    let tone_len = (params.tone_duration_s * sample_rate as f64).round() as usize;
    let ramp_len = ((params.ramp_duration_s * sample_rate as f64).round() as usize).min(tone_len / 2);

    let mut samples = Vec::with_capacity(tone_len * num_tones);
    for freq in frequencies {
        for n in 0..tone_len {
            let t = n as f64 / sample_rate as f64;
            let value = (2.0 * PI * freq * t).sin() * ramp_gain(n, tone_len, ramp_len);
            samples.push(value as f32 * params.amplitude);
        }
    }
    StereoBuffer::from_mono(&samples)
}

// raised-cosine onset/offset envelope
fn ramp_gain(n: usize, len: usize, ramp: usize) -> f64 {
    if ramp == 0 {
        return 1.0;
    }
    let edge = n.min(len - 1 - n);
    if edge >= ramp {
        1.0
    } else {
        0.5 * (1.0 - (PI * edge as f64 / ramp as f64).cos())
    }
}
