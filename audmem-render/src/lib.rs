pub mod render;
pub mod text;

pub use render::{FrameStats, NormRect, SkiaRenderer, TargetLayout};
pub use text::{load_font, render_text_pixmap};

pub use ab_glyph::FontVec;
