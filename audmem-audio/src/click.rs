use crate::buffer::StereoBuffer;

/// Periodic click train settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickTrain {
    pub click_duration_s: f64,
    /// Click onset asynchrony.
    pub soa_s: f64,
    pub scale: f32,
}

impl ClickTrain {
    pub fn single_click(&self, sample_rate: u32) -> Vec<f32> {
        let len = (self.click_duration_s * sample_rate as f64).round() as usize;
        vec![self.scale; len]
    }

    pub fn soa_frames(&self, sample_rate: u32) -> usize {
        (self.soa_s * sample_rate as f64).round() as usize
    }

    /// A click train cut to exactly `len` frames.
    pub fn frames(&self, sample_rate: u32, len: usize) -> StereoBuffer {
        let soa = self.soa_frames(sample_rate).max(1);
        let reps = len.div_ceil(soa);
        let mut train = create_audio_stream(
            &self.single_click(sample_rate),
            self.soa_s,
            sample_rate,
            reps,
            &[],
        );
        train.resize(len);
        train
    }
}

/// Repeats `unit` every `soa_s` seconds, `reps` times.
///
/// Repetitions listed in `blanks` (1-based) are replaced by silence of the
/// same length, keeping the timing of the rest intact.
pub fn create_audio_stream(
    unit: &[f32],
    soa_s: f64,
    sample_rate: u32,
    reps: usize,
    blanks: &[usize],
) -> StereoBuffer {
    let unit_dur = unit.len() as f64 / sample_rate as f64;
    let padding = ((soa_s - unit_dur) * sample_rate as f64).round().max(0.0) as usize;
    let blank = vec![0.0f32; unit.len()];

    let mut samples = Vec::with_capacity(reps * (unit.len() + padding));
    for rep in 1..=reps {
        if blanks.contains(&rep) {
            samples.extend_from_slice(&blank);
        } else {
            samples.extend_from_slice(unit);
        }
        samples.resize(samples.len() + padding, 0.0);
    }
    StereoBuffer::from_mono(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicks_repeat_every_soa() {
        let stream = create_audio_stream(&[1.0, 1.0], 0.005, 1_000, 3, &[]);
        let left = stream.channel(0);
        assert_eq!(
            left,
            vec![1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn blank_repetitions_stay_silent_but_keep_length() {
        let full = create_audio_stream(&[1.0, 1.0], 0.004, 1_000, 3, &[]);
        let blanked = create_audio_stream(&[1.0, 1.0], 0.004, 1_000, 3, &[2]);
        assert_eq!(full.len(), blanked.len());
        assert_eq!(
            blanked.channel(0),
            vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn train_is_cut_to_requested_length() {
        let train = ClickTrain {
            click_duration_s: 0.01,
            soa_s: 0.624,
            scale: 0.25,
        };
        let frames = train.frames(48_000, 100_000);
        assert_eq!(frames.len(), 100_000);
        assert_eq!(train.soa_frames(48_000), 29_952);
        let left = frames.channel(0);
        assert_eq!(left[0], 0.25);
        assert_eq!(left[479], 0.25);
        assert_eq!(left[480], 0.0);
        assert_eq!(left[29_952], 0.25);
    }
}
