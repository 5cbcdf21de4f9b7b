use crate::buffer::GazeBuffer;
use crate::csv_log::read_gaze_csv;
use crate::error::GazeError;
use crate::sample::GazeSample;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub type GazeSender = Sender<GazeSample>;

/// A tracker that pushes samples from its own thread.
pub trait GazeSource {
    fn sample_rate_hz(&self) -> u32;
    fn subscribe(&mut self, sender: GazeSender) -> Result<(), GazeError>;
    fn unsubscribe(&mut self);
}

/// Single-producer single-consumer link between a source and the frame loop.
pub fn gaze_channel() -> (GazeSender, GazeFeed) {
    let (tx, rx) = mpsc::channel();
    (tx, GazeFeed { rx })
}

pub struct GazeFeed {
    rx: Receiver<GazeSample>,
}

impl GazeFeed {
    /// Moves every pending sample into `buffer` without blocking.
    pub fn drain_into(&self, buffer: &mut GazeBuffer) -> usize {
        let mut n = 0;
        for sample in self.rx.try_iter() {
            buffer.push(sample);
            n += 1;
        }
        n
    }

    /// Drops pending samples, used between trials.
    pub fn discard(&self) -> usize {
        self.rx.try_iter().count()
    }
}

/// Replays a recorded gaze log at a fixed rate.
pub struct ReplaySource {
    samples: Arc<Vec<GazeSample>>,
    rate_hz: u32,
    looped: bool,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(samples: Vec<GazeSample>, rate_hz: u32) -> Result<Self, GazeError> {
        if rate_hz == 0 {
            return Err(GazeError::UnsupportedRate(rate_hz));
        }
        Ok(Self {
            samples: Arc::new(samples),
            rate_hz,
            looped: true,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn from_csv(path: impl AsRef<Path>, rate_hz: u32) -> Result<Self, GazeError> {
        let samples = read_gaze_csv(path.as_ref())?;
        log::info!(
            "Loaded {} gaze samples for replay from {}",
            samples.len(),
            path.as_ref().display()
        );
        Self::new(samples, rate_hz)
    }

    /// Stop after one pass instead of wrapping around.
    pub fn once(mut self) -> Self {
        self.looped = false;
        self
    }

    pub fn is_subscribed(&self) -> bool {
        self.worker.is_some()
    }
}

impl GazeSource for ReplaySource {
    fn sample_rate_hz(&self) -> u32 {
        self.rate_hz
    }

    fn subscribe(&mut self, sender: GazeSender) -> Result<(), GazeError> {
        if self.worker.is_some() {
            return Err(GazeError::AlreadySubscribed);
        }
        self.stop.store(false, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let stop = Arc::clone(&self.stop);
        let period = Duration::from_secs_f64(1.0 / self.rate_hz as f64);
        let looped = self.looped;

        self.worker = Some(std::thread::spawn(move || {
            if samples.is_empty() {
                return;
            }
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                if i == samples.len() {
                    if !looped {
                        break;
                    }
                    i = 0;
                }
                // receiver gone means the session is over
                if sender.send(samples[i]).is_err() {
                    break;
                }
                i += 1;
                std::thread::sleep(period);
            }
        }));
        log::debug!("Gaze replay subscribed at {} Hz", self.rate_hz);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Gaze replay thread panicked");
            }
        }
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
