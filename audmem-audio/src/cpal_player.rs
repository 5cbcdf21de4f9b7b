use crate::buffer::StereoBuffer;
use crate::error::AudioError;
use crate::player::AudioPlayer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Playback {
    frames: Vec<[f32; 2]>,
    cursor: usize,
    active: bool,
}

impl Playback {
    fn is_playing(&self) -> bool {
        self.active && self.cursor < self.frames.len()
    }

    /// Starts `frames` from the top and hands back the previous buffer so
    /// the caller frees it after releasing the lock.
    fn load(&mut self, mut frames: Vec<[f32; 2]>) -> Vec<[f32; 2]> {
        std::mem::swap(&mut self.frames, &mut frames);
        self.cursor = 0;
        self.active = true;
        frames
    }
}

/// Plays trial streams on the default output device.
///
/// The output stream runs for the lifetime of the player and outputs
/// silence between trials, so starting a trial only swaps the buffer.
pub struct CpalPlayer {
    playback: Arc<Mutex<Playback>>,
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl CpalPlayer {
    pub fn new(sample_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::Backend(e.to_string()))?
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32 && c.channels() >= 2)
            .find(|c| c.min_sample_rate().0 <= sample_rate && c.max_sample_rate().0 >= sample_rate)
            .ok_or(AudioError::UnsupportedRate(sample_rate))?
            .with_sample_rate(cpal::SampleRate(sample_rate));
        let channels = supported.channels() as usize;

        log::info!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );

        let playback = Arc::new(Mutex::new(Playback::default()));
        let playback_cb = Arc::clone(&playback);

        let stream = device
            .build_output_stream(
                &supported.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut state = lock(&playback_cb);
                    for frame in data.chunks_mut(channels) {
                        let sample = if state.is_playing() {
                            let s = state.frames[state.cursor];
                            state.cursor += 1;
                            s
                        } else {
                            state.active = false;
                            [0.0; 2]
                        };
                        frame[0] = sample[0];
                        frame[1] = sample[1];
                        for extra in frame.iter_mut().skip(2) {
                            *extra = 0.0;
                        }
                    }
                },
                |err| log::error!("Audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        Ok(Self {
            playback,
            _stream: stream,
            sample_rate,
        })
    }
}

fn lock(playback: &Mutex<Playback>) -> MutexGuard<'_, Playback> {
    playback.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AudioPlayer for CpalPlayer {
    fn play(&mut self, stream: &StereoBuffer) -> Result<(), AudioError> {
        // copy and free outside the lock the audio callback contends on
        let frames = stream.frames().to_vec();
        let previous = lock(&self.playback).load(frames);
        drop(previous);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        lock(&self.playback).is_playing()
    }

    fn stop(&mut self) {
        let mut state = lock(&self.playback);
        state.active = false;
        state.cursor = state.frames.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_restarts_and_returns_the_old_buffer() {
        let mut playback = Playback::default();
        assert!(playback.load(vec![[0.5; 2]; 4]).is_empty());
        playback.cursor = 4;
        assert!(!playback.is_playing());

        let previous = playback.load(vec![[0.25; 2]; 2]);
        assert_eq!(previous, vec![[0.5; 2]; 4]);
        assert_eq!(playback.cursor, 0);
        assert!(playback.is_playing());
    }
}
