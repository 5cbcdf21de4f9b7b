use crate::csv_log::GazeLog;
use crate::error::GazeError;
use crate::sample::GazeSample;

/// Gaze samples collected during one trial.
///
/// A buffer is only ever discarded through [`GazeBuffer::flush`], which
/// consumes it, so samples never leak into the next trial and never vanish
/// unwritten.
#[derive(Debug, Clone, Default)]
pub struct GazeBuffer {
    trial: usize,
    samples: Vec<GazeSample>,
}

impl GazeBuffer {
    pub fn new(trial: usize) -> Self {
        Self {
            trial,
            samples: Vec::new(),
        }
    }

    pub fn trial(&self) -> usize {
        self.trial
    }

    pub fn push(&mut self, sample: GazeSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[GazeSample] {
        &self.samples
    }

    /// The most recent `n` samples, or `None` while fewer have arrived.
    pub fn latest(&self, n: usize) -> Option<&[GazeSample]> {
        if n == 0 || self.samples.len() < n {
            None
        } else {
            Some(&self.samples[self.samples.len() - n..])
        }
    }

    /// Writes the samples to `log` and drops the buffer.
    pub fn flush(self, log: &mut GazeLog) -> Result<usize, GazeError> {
        log.write_trial(self.trial, &self.samples)?;
        log::debug!("Flushed {} gaze samples for trial {}", self.samples.len(), self.trial);
        Ok(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_log::read_gaze_csv;
    use crate::sample::EyeSample;

    fn sample(t: i64) -> GazeSample {
        GazeSample::binocular(t, EyeSample::looking_at(0.5, 0.5), EyeSample::looking_at(0.5, 0.5))
    }

    #[test]
    fn latest_needs_a_full_window() {
        let mut buffer = GazeBuffer::new(3);
        buffer.push(sample(1));
        buffer.push(sample(2));
        assert!(buffer.latest(3).is_none());
        buffer.push(sample(3));
        buffer.push(sample(4));
        let window = buffer.latest(3).unwrap();
        assert_eq!(
            window.iter().map(|s| s.system_time_us).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert!(buffer.latest(0).is_none());
    }

    #[test]
    fn flush_writes_every_sample_under_its_trial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaze.csv");
        let mut log = GazeLog::create(&path).unwrap();

        let mut buffer = GazeBuffer::new(7);
        buffer.push(sample(1));
        buffer.push(sample(2));
        assert_eq!(buffer.flush(&mut log).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let trials: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(trials, vec!["7", "7"]);
        assert_eq!(read_gaze_csv(&path).unwrap().len(), 2);
    }
}
