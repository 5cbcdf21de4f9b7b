use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use anyhow::{bail, Result};
use audmem_core::{Feedback, Screen};
use audmem_timing::{HighPrecisionTimer, Timer};
use bytemuck::{cast_slice, cast_slice_mut};
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Box in normalized window units: centre and full size, -1..1 with y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRect {
    pub center: (f32, f32),
    pub size: (f32, f32),
}

/// Where the response targets sit on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetLayout {
    pub same: NormRect,
    pub diff: NormRect,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            same: NormRect {
                center: (-0.5, 0.0),
                size: (0.3, 0.3),
            },
            diff: NormRect {
                center: (0.5, 0.0),
                size: (0.3, 0.3),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    /// False when the screen content was unchanged and only copied.
    pub redrawn: bool,
}

/// Software renderer for the task display: fixation cross, the two
/// response targets and the feedback message.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    layout: TargetLayout,
    font: Option<FontVec>,
    labels: HashMap<&'static str, Pixmap>,
    last: Option<Screen>,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, layout: TargetLayout, font: Option<FontVec>) -> Result<Self> {
        let Some(canvas) = Pixmap::new(width.max(1), height.max(1)) else {
            bail!("Cannot allocate a {width}x{height} canvas");
        };
        let mut renderer = Self {
            width: width.max(1),
            height: height.max(1),
            canvas,
            layout,
            font,
            labels: HashMap::new(),
            last: None,
            timer: HighPrecisionTimer::new(),
        };
        renderer.cache_labels();
        Ok(renderer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let Some(canvas) = Pixmap::new(width.max(1), height.max(1)) else {
            bail!("Cannot allocate a {width}x{height} canvas");
        };
        self.width = width.max(1);
        self.height = height.max(1);
        self.canvas = canvas;
        self.cache_labels();
        self.last = None;
        log::info!("Renderer resized to {width}x{height}");
        Ok(())
    }

    /// Text sizes follow the window height, so labels are rebuilt on resize.
    fn cache_labels(&mut self) {
        self.labels.clear();
        let Some(font) = &self.font else {
            return;
        };
        let message_px = 0.05 * self.height as f32;
        let button_px = 0.025 * self.height as f32;
        let texts = [
            ("Correct", message_px, Color::WHITE),
            ("Incorrect", message_px, Color::WHITE),
            ("No response timeout", message_px, Color::WHITE),
            ("Same", button_px, Color::BLACK),
            ("Different", button_px, Color::BLACK),
        ];
        for (text, size, color) in texts {
            if let Some(pm) = render_text_pixmap(text, size, font, color) {
                self.labels.insert(text, pm);
            }
        }
    }

    /// Draws `screen` and copies it into `frame` (RGBA8, `width * height * 4`).
    pub fn render_frame(&mut self, screen: &Screen, frame: &mut [u8]) -> Result<FrameStats> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame.len() != expected {
            bail!("Frame buffer is {} bytes, expected {expected}", frame.len());
        }

        let t = self.timer.now();
        let redrawn = self.last.as_ref() != Some(screen);
        if redrawn {
            self.draw(screen);
            self.last = Some(*screen);
        }
        let draw = self.timer.elapsed(t);

        let t = self.timer.now();
        // canvas is fully opaque, so premultiplied bytes are plain RGBA
        let src: &[[u8; 4]] = cast_slice(self.canvas.data());
        let dst: &mut [[u8; 4]] = cast_slice_mut(frame);
        dst.copy_from_slice(src);
        let copy = self.timer.elapsed(t);

        Ok(FrameStats {
            draw,
            copy,
            redrawn,
        })
    }

    fn draw(&mut self, screen: &Screen) {
        let pixels: &mut [[u8; 4]] = cast_slice_mut(self.canvas.data_mut());
        pixels.fill(BACKGROUND);

        if screen.targets {
            self.draw_target(self.layout.same, Color::from_rgba8(0, 128, 0, 255), "Same");
            self.draw_target(self.layout.diff, Color::from_rgba8(255, 0, 0, 255), "Different");
        }
        if screen.fixation {
            self.draw_fixation();
        }
        if let Some(feedback) = screen.feedback {
            self.draw_feedback(feedback);
        }
    }

    fn to_px(&self, r: NormRect) -> Option<Rect> {
        let (w, h) = (self.width as f32, self.height as f32);
        let cx = (r.center.0 + 1.0) * 0.5 * w;
        let cy = (1.0 - r.center.1) * 0.5 * h;
        let pw = r.size.0 * 0.5 * w;
        let ph = r.size.1 * 0.5 * h;
        Rect::from_xywh(cx - pw * 0.5, cy - ph * 0.5, pw, ph)
    }

    fn fill(&mut self, rect: Option<Rect>, color: Color) {
        let Some(rect) = rect else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(color);
        self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn draw_fixation(&mut self) {
        let arm = NormRect {
            center: (0.0, 0.0),
            size: (0.1, 0.1),
        };
        let Some(extent) = self.to_px(arm) else {
            return;
        };
        let thickness = (extent.width().min(extent.height()) * 0.1).max(2.0);
        let (cx, cy) = (
            extent.x() + extent.width() * 0.5,
            extent.y() + extent.height() * 0.5,
        );
        let horizontal = Rect::from_xywh(extent.x(), cy - thickness * 0.5, extent.width(), thickness);
        let vertical = Rect::from_xywh(cx - thickness * 0.5, extent.y(), thickness, extent.height());
        self.fill(horizontal, Color::WHITE);
        self.fill(vertical, Color::WHITE);
    }

    fn draw_target(&mut self, target: NormRect, color: Color, label: &'static str) {
        let rect = self.to_px(target);
        self.fill(rect, color);
        if let Some(rect) = rect {
            let center = (rect.x() + rect.width() * 0.5, rect.y() + rect.height() * 0.5);
            self.blit_label(label, center);
        }
    }

    fn draw_feedback(&mut self, feedback: Feedback) {
        let center = (self.width as f32 * 0.5, self.height as f32 * 0.5);
        if self.labels.contains_key(feedback.message()) {
            self.blit_label(feedback.message(), center);
            return;
        }
        let color = match feedback {
            Feedback::Correct => Color::from_rgba8(0, 200, 0, 255),
            Feedback::Incorrect => Color::from_rgba8(220, 0, 0, 255),
            Feedback::NoResponse => Color::from_rgba8(128, 128, 128, 255),
        };
        let marker = NormRect {
            center: (0.0, 0.0),
            size: (0.1, 0.1),
        };
        let rect = self.to_px(marker);
        self.fill(rect, color);
    }

    fn blit_label(&mut self, text: &str, center: (f32, f32)) {
        let Some(pm) = self.labels.get(text) else {
            return;
        };
        let x = (center.0 - pm.width() as f32 * 0.5).round() as i32;
        let y = (center.1 - pm.height() as f32 * 0.5).round() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
