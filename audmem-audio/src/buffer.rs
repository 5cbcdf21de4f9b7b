use crate::error::AudioError;

/// Dual-channel waveform stored as `[left, right]` frames.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StereoBuffer {
    frames: Vec<[f32; 2]>,
}

impl StereoBuffer {
    pub fn new(frames: Vec<[f32; 2]>) -> Self {
        Self { frames }
    }

    pub fn silence(len: usize) -> Self {
        Self {
            frames: vec![[0.0; 2]; len],
        }
    }

    /// Duplicates a mono signal onto both channels.
    pub fn from_mono(samples: &[f32]) -> Self {
        Self {
            frames: samples.iter().map(|&s| [s, s]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[[f32; 2]] {
        &self.frames
    }

    pub fn duration_s(&self, sample_rate: u32) -> f64 {
        self.frames.len() as f64 / sample_rate as f64
    }

    /// Pads with silence or truncates to exactly `len` frames.
    pub fn resize(&mut self, len: usize) {
        self.frames.resize(len, [0.0; 2]);
    }

    /// Replaces the frames starting at `offset` with `segment`.
    pub fn overwrite_at(&mut self, offset: usize, segment: &StereoBuffer) -> Result<(), AudioError> {
        let end = offset + segment.len();
        if end > self.frames.len() {
            return Err(AudioError::OutOfRange {
                offset,
                len: segment.len(),
                capacity: self.frames.len(),
            });
        }
        self.frames[offset..end].copy_from_slice(&segment.frames);
        Ok(())
    }

    /// Left/right interleaved samples, the layout output devices expect.
    pub fn interleaved(&self) -> Vec<f32> {
        self.frames.iter().flat_map(|f| f.iter().copied()).collect()
    }

    pub fn channel(&self, index: usize) -> Vec<f32> {
        self.frames.iter().map(|f| f[index]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_replaces_instead_of_mixing() {
        let mut base = StereoBuffer::from_mono(&[1.0; 6]);
        let seg = StereoBuffer::from_mono(&[0.25, 0.5]);
        base.overwrite_at(2, &seg).unwrap();
        assert_eq!(base.channel(0), vec![1.0, 1.0, 0.25, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn overwrite_past_the_end_is_rejected() {
        let mut base = StereoBuffer::silence(4);
        let seg = StereoBuffer::silence(3);
        assert!(matches!(
            base.overwrite_at(2, &seg),
            Err(AudioError::OutOfRange { offset: 2, len: 3, capacity: 4 })
        ));
    }

    #[test]
    fn interleaves_left_then_right() {
        let buf = StereoBuffer::new(vec![[1.0, -1.0], [0.5, -0.5]]);
        assert_eq!(buf.interleaved(), vec![1.0, -1.0, 0.5, -0.5]);
    }
}
