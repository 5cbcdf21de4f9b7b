use crate::buffer::StereoBuffer;
use crate::error::AudioError;
use audmem_timing::Timer;

/// Something that can play one trial stream at a time.
pub trait AudioPlayer {
    /// Starts playing `stream` from its first frame, replacing anything
    /// currently playing.
    fn play(&mut self, stream: &StereoBuffer) -> Result<(), AudioError>;
    fn is_playing(&self) -> bool;
    fn stop(&mut self);
}

/// Player that produces no sound and reports playback purely from the clock.
///
/// Used for dry runs without an output device and for driving the trial loop
/// in tests.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer<T: Timer> {
    timer: T,
    sample_rate: u32,
    started_ns: Option<u64>,
    duration_ns: u64,
}

impl<T: Timer> SimulatedPlayer<T> {
    pub fn new(timer: T, sample_rate: u32) -> Self {
        Self {
            timer,
            sample_rate,
            started_ns: None,
            duration_ns: 0,
        }
    }
}

impl<T: Timer> AudioPlayer for SimulatedPlayer<T> {
    fn play(&mut self, stream: &StereoBuffer) -> Result<(), AudioError> {
        self.started_ns = Some(self.timer.now());
        self.duration_ns = (stream.duration_s(self.sample_rate) * 1e9).round() as u64;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.started_ns {
            Some(start) => self.timer.now() < start + self.duration_ns,
            None => false,
        }
    }

    fn stop(&mut self) {
        self.started_ns = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audmem_timing::ManualTimer;
    use std::time::Duration;

    #[test]
    fn plays_for_the_stream_duration() {
        let timer = ManualTimer::new();
        let mut player = SimulatedPlayer::new(timer.clone(), 1_000);
        assert!(!player.is_playing());

        player.play(&StereoBuffer::silence(500)).unwrap();
        assert!(player.is_playing());
        timer.advance(Duration::from_millis(499));
        assert!(player.is_playing());
        timer.advance(Duration::from_millis(1));
        assert!(!player.is_playing());
    }

    #[test]
    fn stop_ends_playback_immediately() {
        let timer = ManualTimer::new();
        let mut player = SimulatedPlayer::new(timer, 1_000);
        player.play(&StereoBuffer::silence(500)).unwrap();
        player.stop();
        assert!(!player.is_playing());
    }
}
