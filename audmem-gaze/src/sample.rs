/// One eye's part of a gaze sample.
///
/// Display-area coordinates are normalized with the origin at the top-left
/// corner of the screen. Invalid readings carry NaN coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSample {
    pub gaze_point_display: [f64; 2],
    pub gaze_point_user: [f64; 3],
    pub gaze_point_valid: bool,
    pub pupil_diameter: f64,
    pub pupil_valid: bool,
    pub gaze_origin_user: [f64; 3],
    pub gaze_origin_trackbox: [f64; 3],
    pub gaze_origin_valid: bool,
}

impl EyeSample {
    /// A valid reading looking at `(x, y)` on the display area.
    pub fn looking_at(x: f64, y: f64) -> Self {
        Self {
            gaze_point_display: [x, y],
            gaze_point_user: [0.0; 3],
            gaze_point_valid: true,
            pupil_diameter: 3.0,
            pupil_valid: true,
            gaze_origin_user: [0.0; 3],
            gaze_origin_trackbox: [0.5; 3],
            gaze_origin_valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            gaze_point_display: [f64::NAN; 2],
            gaze_point_user: [f64::NAN; 3],
            gaze_point_valid: false,
            pupil_diameter: f64::NAN,
            pupil_valid: false,
            gaze_origin_user: [f64::NAN; 3],
            gaze_origin_trackbox: [f64::NAN; 3],
            gaze_origin_valid: false,
        }
    }
}

/// One binocular reading as delivered by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Tracker clock, microseconds.
    pub device_time_us: i64,
    /// Host clock, microseconds.
    pub system_time_us: i64,
    pub left: EyeSample,
    pub right: EyeSample,
}

impl GazeSample {
    pub fn binocular(system_time_us: i64, left: EyeSample, right: EyeSample) -> Self {
        Self {
            device_time_us: system_time_us,
            system_time_us,
            left,
            right,
        }
    }
}
