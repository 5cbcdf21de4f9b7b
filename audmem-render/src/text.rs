use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use std::path::{Path, PathBuf};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Places fonts are commonly installed, tried when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads `path`, or the first system font found when `path` is `None`.
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                log::info!("Using font {}", candidate.display());
                return Some(font);
            }
            Err(e) => log::warn!("{} is not a usable font: {e}", candidate.display()),
        }
    }
    log::warn!("No font available, feedback is shown as colour only");
    None
}

/// Rasterizes one line of text into a tightly cropped premultiplied pixmap.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // layout with the baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let first = outlines.first()?.px_bounds();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.min.x, first.min.y, first.max.x, first.max.y);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let rgba = [color.red(), color.green(), color.blue(), color.alpha()];
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // premultiplied source over existing coverage
            let a = (cov * rgba[3]).clamp(0.0, 1.0);
            let bg = dst[i];
            let inv = 1.0 - a;
            let blend = |src: f32, dst: u8| ((src * a * 255.0) + dst as f32 * inv).round().min(255.0) as u8;
            let out_a = ((a * 255.0) + bg.alpha() as f32 * inv).round().min(255.0) as u8;
            let (r, g, bl) = (blend(rgba[0], bg.red()), blend(rgba[1], bg.green()), blend(rgba[2], bg.blue()));
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(out_a), g.min(out_a), bl.min(out_a), out_a) {
                dst[i] = px;
            }
        });
    }
    Some(pm)
}
