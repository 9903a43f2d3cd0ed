use crate::map::{draw_map, load_map};
use crate::text::{ScreenText, TextCache, load_font};
use ab_glyph::FontArc;
use anyhow::{Result, anyhow, bail};
use mapsize_core::Screen;
use mapsize_timing::Timer;
use std::path::Path;
use std::time::Duration;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};
use tracing::debug;

const TEXT_SIZE_PX: f32 = 28.0;

fn background() -> Color {
    Color::from_rgba8(24, 24, 24, 255)
}

/// Map image and font, loaded before any window exists so a bad path fails early.
pub struct Assets {
    pub map: Pixmap,
    pub font: FontArc,
}

impl Assets {
    pub fn load(map_path: &Path, font_path: &Path) -> Result<Self> {
        Ok(Self {
            map: load_map(map_path)?,
            font: load_font(font_path)?,
        })
    }
}

pub struct FrameTimings {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    /// False when the screen was unchanged and the frame buffer was left alone.
    pub redrawn: bool,
}

/// Draws [`Screen`]s into an offscreen canvas and copies it into the window's frame.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    map: Pixmap,
    text: TextCache,
    copy: ScreenText,
    last: Option<Screen>,
}

/// Colour the whole canvas is cleared to before drawing `screen`.
pub fn background_for(screen: Screen) -> Color {
    match screen {
        Screen::WhiteFlash => Color::WHITE,
        _ => background(),
    }
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, assets: Assets, copy: ScreenText) -> Result<Self> {
        let Assets { map, font } = assets;
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width,
            height,
            canvas,
            map,
            text: TextCache::new(font, TEXT_SIZE_PX, Color::WHITE),
            copy,
            last: None,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width, new_height)
            .ok_or_else(|| anyhow!("invalid canvas size {new_width}x{new_height}"))?;
        self.width = new_width;
        self.height = new_height;
        self.last = None;
        debug!(width = new_width, height = new_height, "canvas resized");
        Ok(())
    }

    /// Renders `screen` into `frame_buffer` (RGBA8, canvas sized). Identical consecutive
    /// screens skip both drawing and copying.
    pub fn render_frame<T: Timer<Timestamp = u64>>(
        &mut self,
        screen: Screen,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameTimings> {
        if frame_buffer.len() != self.canvas.data().len() {
            bail!(
                "frame buffer is {} bytes, canvas is {}",
                frame_buffer.len(),
                self.canvas.data().len()
            );
        }

        let start = timer.now();
        if self.last == Some(screen) {
            return Ok(FrameTimings {
                draw: Duration::ZERO,
                copy: Duration::ZERO,
                total: timer.elapsed(start),
                redrawn: false,
            });
        }

        self.draw_screen(screen);
        let draw = timer.elapsed(start);

        let copy_start = timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = timer.elapsed(copy_start);

        self.last = Some(screen);
        Ok(FrameTimings {
            draw,
            copy,
            total: timer.elapsed(start),
            redrawn: true,
        })
    }

    /// Draws `screen` onto the offscreen canvas.
    pub fn draw_screen(&mut self, screen: Screen) {
        self.canvas.fill(background_for(screen));
        match screen {
            Screen::Intro => self.draw_lines(Lines::Intro),
            Screen::Instructions => self.draw_lines(Lines::Instructions),
            Screen::Done => self.draw_lines(Lines::Done),
            Screen::WhiteFlash => {}
            Screen::Map { height_px } => {
                draw_map(&mut self.canvas, self.map.as_ref(), height_px);
            }
        }
    }

    fn draw_lines(&mut self, which: Lines) {
        let lines = match which {
            Lines::Intro => &self.copy.intro,
            Lines::Instructions => &self.copy.instructions,
            Lines::Done => &self.copy.done,
        };
        let line_height = self.text.line_height().ceil();
        let block = line_height * lines.len() as f32;
        let mut y = (self.height as f32 - block) / 2.0;

        for line in lines {
            if let Some(pm) = self.text.get_or_render(line) {
                let x = (self.width as f32 - pm.width() as f32) / 2.0;
                let dy = (line_height - pm.height() as f32) / 2.0;
                self.canvas.draw_pixmap(
                    x.round() as i32,
                    (y + dy).round() as i32,
                    Pixmap::as_ref(&pm),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
            y += line_height;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Lines {
    Intro,
    Instructions,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_flash_is_white() {
        assert_eq!(background_for(Screen::WhiteFlash), Color::WHITE);
        for screen in [
            Screen::Intro,
            Screen::Instructions,
            Screen::Map { height_px: 300 },
            Screen::Done,
        ] {
            assert_eq!(background_for(screen), background());
        }
    }
}
