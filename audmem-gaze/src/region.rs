use crate::sample::GazeSample;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Region {
    /// Box of `size` centred on `center`, in the same units as both.
    pub fn centered(center: (f64, f64), size: (f64, f64)) -> Self {
        Self {
            x_min: center.0 - size.0 / 2.0,
            x_max: center.0 + size.0 / 2.0,
            y_min: center.1 - size.1 / 2.0,
            y_max: center.1 + size.1 / 2.0,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Converts a box in normalized window units (-1..1, y up) to tracker
    /// display-area units (0..1, y down).
    pub fn norm_to_display_area(&self) -> Self {
        Self {
            x_min: (self.x_min + 1.0) / 2.0,
            x_max: (self.x_max + 1.0) / 2.0,
            y_min: (1.0 - self.y_max) / 2.0,
            y_max: (1.0 - self.y_min) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeRegion {
    Same,
    Different,
    Neither,
}

/// Mean display-area gaze position per eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeMeans {
    pub left: (f64, f64),
    pub right: (f64, f64),
}

impl EyeMeans {
    /// Every one of the four coordinates must fall inside the region.
    pub fn inside(&self, region: &Region) -> bool {
        region.contains(self.left.0, self.left.1) && region.contains(self.right.0, self.right.1)
    }
}

pub fn mean_gaze(window: &[GazeSample]) -> Option<EyeMeans> {
    if window.is_empty() {
        return None;
    }
    let n = window.len() as f64;
    let mut sums = [0.0f64; 4];
    for s in window {
        sums[0] += s.left.gaze_point_display[0];
        sums[1] += s.left.gaze_point_display[1];
        sums[2] += s.right.gaze_point_display[0];
        sums[3] += s.right.gaze_point_display[1];
    }
    Some(EyeMeans {
        left: (sums[0] / n, sums[1] / n),
        right: (sums[2] / n, sums[3] / n),
    })
}

/// Classifies a fixation window against the two response regions.
///
/// NaN from invalid samples propagates into the mean and fails every bound
/// check, so a blink inside the window yields `Neither`.
pub fn classify(window: &[GazeSample], same: &Region, different: &Region) -> GazeRegion {
    match mean_gaze(window) {
        Some(means) if means.inside(same) => GazeRegion::Same,
        Some(means) if means.inside(different) => GazeRegion::Different,
        _ => GazeRegion::Neither,
    }
}

/// Samples a fixation of `fixation_s` spans at `rate_hz`.
pub fn fixation_window_len(fixation_s: f64, rate_hz: u32) -> usize {
    ((fixation_s * rate_hz as f64).round() as usize).max(1)
}
