use crate::error::{ExperimentError, Result};
use crate::settings::{ResponseMode, Settings};
use audmem_core::Response;
use audmem_gaze::{classify, fixation_window_len, GazeBuffer, GazeRegion, Region};

/// Input gathered by the window loop since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Keys pressed this frame, lower-case names (`"s"`, `"escape"`).
    pub keys: Vec<String>,
    /// Pointer position in normalized window units, if inside the window.
    pub pointer: Option<(f64, f64)>,
    /// Whether any pointer button is currently held.
    pub pointer_down: bool,
}

impl FrameInput {
    pub fn escape(&self) -> bool {
        self.keys.iter().any(|k| k == "escape")
    }

    pub fn pressed(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// One response modality, polled once per frame for the whole trial.
///
/// Detectors are polled even while the response window is closed so they
/// can track input state; anything they report then is discarded.
pub trait ResponseDetector {
    fn poll(&mut self, input: &FrameInput, gaze: Option<&GazeBuffer>) -> Option<Response>;

    /// Called at trial start.
    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}

pub struct KeyboardDetector {
    same_key: String,
    diff_key: String,
}

impl KeyboardDetector {
    pub fn new(same_key: impl Into<String>, diff_key: impl Into<String>) -> Self {
        Self {
            same_key: same_key.into(),
            diff_key: diff_key.into(),
        }
    }
}

impl ResponseDetector for KeyboardDetector {
    fn poll(&mut self, input: &FrameInput, _gaze: Option<&GazeBuffer>) -> Option<Response> {
        if input.pressed(&self.same_key) {
            Some(Response::Same)
        } else if input.pressed(&self.diff_key) {
            Some(Response::Different)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "keyboard"
    }
}

/// Pointer press inside a target box, edge-triggered.
pub struct MouseDetector {
    same: Region,
    diff: Region,
    was_down: bool,
}

impl MouseDetector {
    pub fn new(same: Region, diff: Region) -> Self {
        Self {
            same,
            diff,
            was_down: false,
        }
    }
}

impl ResponseDetector for MouseDetector {
    fn poll(&mut self, input: &FrameInput, _gaze: Option<&GazeBuffer>) -> Option<Response> {
        let pressed = input.pointer_down && !self.was_down;
        self.was_down = input.pointer_down;
        if !pressed {
            return None;
        }
        let (x, y) = input.pointer?;
        if self.same.contains(x, y) {
            Some(Response::Same)
        } else if self.diff.contains(x, y) {
            Some(Response::Different)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "mouse"
    }
}

/// Fixation on a target for the configured dwell time.
pub struct GazeDetector {
    same: Region,
    diff: Region,
    window: usize,
}

impl GazeDetector {
    /// `same` and `diff` are in tracker display-area units.
    pub fn new(same: Region, diff: Region, window: usize) -> Self {
        Self { same, diff, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ResponseDetector for GazeDetector {
    fn poll(&mut self, _input: &FrameInput, gaze: Option<&GazeBuffer>) -> Option<Response> {
        let samples = gaze?.latest(self.window)?;
        match classify(samples, &self.same, &self.diff) {
            GazeRegion::Same => Some(Response::Same),
            GazeRegion::Different => Some(Response::Different),
            GazeRegion::Neither => None,
        }
    }

    fn name(&self) -> &'static str {
        "gaze"
    }
}

/// Builds the detector for the configured modality.
pub fn build_detector(
    settings: &Settings,
    tracker_rate_hz: Option<u32>,
) -> Result<Box<dyn ResponseDetector>> {
    let same = settings.same_button.region();
    let diff = settings.diff_button.region();
    Ok(match settings.response_mode {
        ResponseMode::Keyboard => Box::new(KeyboardDetector::new(
            settings.same_key.clone(),
            settings.diff_key.clone(),
        )),
        ResponseMode::Mouse => Box::new(MouseDetector::new(same, diff)),
        ResponseMode::Gaze => {
            let rate = tracker_rate_hz.ok_or(ExperimentError::NoEyeTracker)?;
            Box::new(GazeDetector::new(
                same.norm_to_display_area(),
                diff.norm_to_display_area(),
                fixation_window_len(settings.response_fixation_time, rate),
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use audmem_gaze::{EyeSample, GazeSample};

    fn pointer(x: f64, y: f64, down: bool) -> FrameInput {
        FrameInput {
            keys: vec![],
            pointer: Some((x, y)),
            pointer_down: down,
        }
    }

    fn mouse() -> MouseDetector {
        let s = Settings::default();
        MouseDetector::new(s.same_button.region(), s.diff_button.region())
    }

    #[test]
    fn held_button_reports_once() {
        let mut detector = mouse();
        assert_eq!(detector.poll(&pointer(-0.5, 0.0, true), None), Some(Response::Same));
        assert_eq!(detector.poll(&pointer(-0.5, 0.0, true), None), None);
        assert_eq!(detector.poll(&pointer(-0.5, 0.0, false), None), None);
        assert_eq!(detector.poll(&pointer(0.5, 0.0, true), None), Some(Response::Different));
    }

    #[test]
    fn press_outside_targets_is_consumed() {
        let mut detector = mouse();
        assert_eq!(detector.poll(&pointer(0.0, 0.9, true), None), None);
        // dragging onto a target while held is not a new press
        assert_eq!(detector.poll(&pointer(-0.5, 0.0, true), None), None);
    }

    #[test]
    fn keys_map_to_responses() {
        let mut detector = KeyboardDetector::new("s", "d");
        let input = |k: &str| FrameInput {
            keys: vec![k.to_string()],
            ..FrameInput::default()
        };
        assert_eq!(detector.poll(&input("s"), None), Some(Response::Same));
        assert_eq!(detector.poll(&input("d"), None), Some(Response::Different));
        assert_eq!(detector.poll(&input("x"), None), None);
        assert!(input("escape").escape());
    }

    #[test]
    fn gaze_needs_a_full_window_from_this_trial() {
        let s = Settings::default();
        let mut detector = GazeDetector::new(
            s.same_button.region().norm_to_display_area(),
            s.diff_button.region().norm_to_display_area(),
            4,
        );
        let mut buffer = GazeBuffer::new(0);
        let look = |t| {
            GazeSample::binocular(t, EyeSample::looking_at(0.75, 0.5), EyeSample::looking_at(0.75, 0.5))
        };
        for t in 0..3 {
            buffer.push(look(t));
        }
        assert_eq!(detector.poll(&FrameInput::default(), Some(&buffer)), None);
        buffer.push(look(3));
        assert_eq!(
            detector.poll(&FrameInput::default(), Some(&buffer)),
            Some(Response::Different)
        );
        assert_eq!(detector.poll(&FrameInput::default(), None), None);
    }

    #[test]
    fn gaze_mode_requires_a_tracker() {
        let s = Settings {
            response_mode: ResponseMode::Gaze,
            ..Settings::default()
        };
        assert!(matches!(build_detector(&s, None), Err(ExperimentError::NoEyeTracker)));
        let detector = build_detector(&s, Some(600)).unwrap();
        assert_eq!(detector.name(), "gaze");
    }
}
