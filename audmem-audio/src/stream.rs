use crate::buffer::StereoBuffer;
use crate::click::ClickTrain;
use crate::error::AudioError;

/// Silence/click padding around the cue and choice, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTiming {
    /// Before cue onset.
    pub pre_time_s: f64,
    /// Between cue offset and choice onset.
    pub isi_s: f64,
    /// After choice offset; the time left to respond.
    pub post_time_s: f64,
}

/// Frame offsets of one assembled trial stream.
///
/// Computed once per trial; playback and the response window both read
/// from the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    pub sample_rate: u32,
    pub cue_onset: usize,
    pub cue_len: usize,
    pub choice_onset: usize,
    pub choice_len: usize,
    pub total: usize,
}

impl StreamLayout {
    pub fn compute(
        cue_len: usize,
        choice_len: usize,
        timing: &StreamTiming,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        let to_frames = |name: &str, secs: f64| {
            if !secs.is_finite() || secs < 0.0 {
                return Err(AudioError::InvalidTiming(format!(
                    "{name} must be a non-negative number of seconds, got {secs}"
                )));
            }
            Ok((secs * sample_rate as f64).round() as usize)
        };
        let pre = to_frames("pre_time", timing.pre_time_s)?;
        let isi = to_frames("isi", timing.isi_s)?;
        let post = to_frames("post_time", timing.post_time_s)?;

        let cue_onset = pre;
        let choice_onset = cue_onset + cue_len + isi;
        let total = choice_onset + choice_len + post;
        Ok(Self {
            sample_rate,
            cue_onset,
            cue_len,
            choice_onset,
            choice_len,
            total,
        })
    }

    pub fn choice_end(&self) -> usize {
        self.choice_onset + self.choice_len
    }

    /// Frames from stream start until responses become eligible.
    pub fn response_offset_frames(&self) -> usize {
        self.choice_end()
    }

    pub fn response_offset_s(&self) -> f64 {
        self.response_offset_frames() as f64 / self.sample_rate as f64
    }

    pub fn duration_s(&self) -> f64 {
        self.total as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Clone)]
pub struct AssembledStream {
    pub buffer: StereoBuffer,
    pub layout: StreamLayout,
}

/// Builds the combined trial waveform: cue and choice written over a click
/// train (or over silence of the same length when clicks are disabled).
pub fn assemble_stream(
    cue: &StereoBuffer,
    choice: &StereoBuffer,
    timing: &StreamTiming,
    clicks: &ClickTrain,
    sample_rate: u32,
    click_train_enabled: bool,
) -> Result<AssembledStream, AudioError> {
    let layout = StreamLayout::compute(cue.len(), choice.len(), timing, sample_rate)?;

    let mut buffer = if click_train_enabled {
        clicks.frames(sample_rate, layout.total)
    } else {
        StereoBuffer::silence(layout.total)
    };
    buffer.overwrite_at(layout.cue_onset, cue)?;
    buffer.overwrite_at(layout.choice_onset, choice)?;

    log::debug!(
        "Assembled stream: {} frames, cue at {}, choice at {}",
        layout.total,
        layout.cue_onset,
        layout.choice_onset
    );
    Ok(AssembledStream { buffer, layout })
}
