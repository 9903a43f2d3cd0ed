use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("invalid font {}", path.display()))
}

/// Lines shown on the three text screens.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenText {
    pub intro: Vec<String>,
    pub instructions: Vec<String>,
    pub done: Vec<String>,
}

impl ScreenText {
    pub fn for_keys(bigger: char, smaller: char) -> Self {
        Self {
            intro: vec!["Welcome to the experiment. Press any key to begin.".into()],
            instructions: vec![
                "In this experiment, a map will appear in the center of the screen".into(),
                format!(
                    "if the map gets bigger, press the letter {} on the keyboard.",
                    bigger.to_uppercase()
                ),
                format!(
                    "if the map is smaller, press the letter {}.",
                    smaller.to_uppercase()
                ),
                "Press any key to begin.".into(),
            ],
            done: vec!["Thank you for participating in the experiment!".into()],
        }
    }
}

/// Rasterized lines keyed by content.
pub struct TextCache {
    font: FontArc,
    size_px: f32,
    color: Color,
    map: HashMap<String, Arc<Pixmap>>,
}

impl TextCache {
    pub fn new(font: FontArc, size_px: f32, color: Color) -> Self {
        Self {
            font,
            size_px,
            color,
            map: HashMap::new(),
        }
    }

    /// `None` for text with no visible glyphs.
    pub fn get_or_render(&mut self, text: &str) -> Option<Arc<Pixmap>> {
        if let Some(p) = self.map.get(text) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(
            text,
            self.size_px,
            &self.font,
            self.color,
        )?);
        self.map.insert(text.to_owned(), Arc::clone(&pm));
        Some(pm)
    }

    pub fn line_height(&self) -> f32 {
        let sf = self.font.as_scaled(PxScale::from(self.size_px));
        sf.height() + sf.line_gap()
    }
}

pub fn render_text_pixmap(
    text: &str,
    font_size: f32,
    font: &FontArc,
    color: Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with baseline at ascent
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

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();
    let c = color.to_color_u8();

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

            // Porter-Duff over in premultiplied space
            let a = (cov * c.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let bg = dst[i];
            let inv = 1.0 - a;
            let blend = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round().min(255.0) as u8;
            let alpha = (a * 255.0 + bg.alpha() as f32 * inv).round().min(255.0) as u8;
            let red = blend(c.red(), bg.red()).min(alpha);
            let green = blend(c.green(), bg.green()).min(alpha);
            let blue = blend(c.blue(), bg.blue()).min(alpha);
            if let Some(px) = PremultipliedColorU8::from_rgba(red, green, blue, alpha) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_name_the_configured_keys() {
        let text = ScreenText::for_keys('j', 'f');
        assert_eq!(text.instructions.len(), 4);
        assert!(text.instructions[1].contains("letter J"));
        assert!(text.instructions[2].contains("letter F"));
        assert_eq!(text.intro.len(), 1);
        assert!(text.done[0].starts_with("Thank you"));
    }

    #[test]
    fn missing_font_is_an_error() {
        let err = load_font(Path::new("/nonexistent/DejaVuSans.ttf")).unwrap_err();
        assert!(err.to_string().contains("DejaVuSans.ttf"));
    }

    #[test]
    fn garbage_font_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not a font").unwrap();
        assert!(load_font(file.path()).is_err());
    }
}
