use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Tracks display refresh timestamps and predicts the next one.
///
/// Until calibrated the prediction uses the nominal refresh period reported
/// by the monitor; afterwards it uses the measured mean interval.
#[derive(Debug, Clone)]
pub struct FrameClock {
    nominal_period_ns: u64,
    measured_period_ns: Option<u64>,
    last_flip_ns: Option<u64>,
    flip_count: usize,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameClock {
    pub fn new(refresh_hz: f64) -> Self {
        let hz = if refresh_hz > 0.0 { refresh_hz } else { 60.0 };
        Self {
            nominal_period_ns: (1e9 / hz).round() as u64,
            measured_period_ns: None,
            last_flip_ns: None,
            flip_count: 0,
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    pub fn record_flip(&mut self, flip_ns: u64) {
        if let Some(last) = self.last_flip_ns {
            if self.frame_times.len() >= self.max_samples {
                self.frame_times.pop_front();
            }
            self.frame_times
                .push_back(Duration::from_nanos(flip_ns.saturating_sub(last)));
        }
        self.last_flip_ns = Some(flip_ns);
        self.flip_count += 1;
    }

    pub fn flip_count(&self) -> usize {
        self.flip_count
    }

    pub fn last_flip(&self) -> Option<u64> {
        self.last_flip_ns
    }

    pub fn period_ns(&self) -> u64 {
        self.measured_period_ns.unwrap_or(self.nominal_period_ns)
    }

    /// Predicted timestamp of the next refresh that is not in the past.
    pub fn next_flip(&self, now_ns: u64) -> u64 {
        let period = self.period_ns().max(1);
        match self.last_flip_ns {
            Some(last) if last + period >= now_ns => last + period,
            Some(last) => {
                let missed = (now_ns - last) / period;
                let next = last + missed * period;
                if next >= now_ns {
                    next
                } else {
                    next + period
                }
            }
            None => now_ns,
        }
    }

    pub fn calibration_stats(&self) -> CalibrationStats {
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return CalibrationStats {
                average_frame_time_ns: 0.0,
                jitter_ns: 0.0,
                min_frame_time_ns: 0.0,
                max_frame_time_ns: 0.0,
                effective_fps: 0.0,
            };
        }
        let sum: f64 = times.iter().sum();
        let avg = sum / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        CalibrationStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }

    /// Switches predictions to the measured mean refresh interval.
    pub fn apply_calibration(&mut self) -> CalibrationStats {
        let stats = self.calibration_stats();
        if stats.average_frame_time_ns > 0.0 {
            self.measured_period_ns = Some(stats.average_frame_time_ns.round() as u64);
        }
        log::info!(
            "Calibration: {:.3} ms/frame, {:.1} Hz, jitter {:.3} ms",
            stats.average_frame_time_ns / 1_000_000.0,
            stats.effective_fps,
            stats.jitter_ns / 1_000_000.0,
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u64 = 16_666_667;

    #[test]
    fn predicts_now_before_any_flip() {
        let clock = FrameClock::new(60.0);
        assert_eq!(clock.next_flip(1234), 1234);
    }

    #[test]
    fn predicts_one_period_after_last_flip() {
        let mut clock = FrameClock::new(60.0);
        clock.record_flip(1_000_000);
        assert_eq!(clock.next_flip(2_000_000), 1_000_000 + PERIOD);
    }

    #[test]
    fn skips_refreshes_that_already_passed() {
        let mut clock = FrameClock::new(60.0);
        clock.record_flip(0);
        let now = 2 * PERIOD + 10;
        assert_eq!(clock.next_flip(now), 3 * PERIOD);
    }

    #[test]
    fn calibration_uses_measured_interval() {
        let mut clock = FrameClock::new(60.0);
        for i in 0..11u64 {
            clock.record_flip(i * 10_000_000);
        }
        let stats = clock.apply_calibration();
        assert_eq!(stats.average_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.jitter_ns, 0.0);
        assert!((stats.effective_fps - 100.0).abs() < 1e-9);
        assert_eq!(clock.period_ns(), 10_000_000);
        assert_eq!(clock.flip_count(), 11);
    }

    #[test]
    fn calibration_only_sees_the_most_recent_intervals() {
        let mut clock = FrameClock::new(60.0);
        // one long stall, then more steady intervals than the window holds
        clock.record_flip(0);
        let mut t = 500_000_000;
        for _ in 0..1_000 {
            clock.record_flip(t);
            t += 10_000_000;
        }
        clock.record_flip(t);
        let stats = clock.calibration_stats();
        assert_eq!(stats.max_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.average_frame_time_ns, 10_000_000.0);
    }

    #[test]
    fn empty_calibration_keeps_nominal_period() {
        let mut clock = FrameClock::new(120.0);
        clock.apply_calibration();
        assert_eq!(clock.period_ns(), 8_333_333);
    }
}
