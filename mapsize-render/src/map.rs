use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tiny_skia::{ColorU8, FilterQuality, Pixmap, PixmapPaint, PixmapRef, Transform};
use tracing::debug;

/// Decodes the map image into a premultiplied pixmap.
pub fn load_map(path: &Path) -> Result<Pixmap> {
    let image = image::open(path)
        .with_context(|| format!("failed to open map image {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    debug!(path = %path.display(), width, height, "map image decoded");
    pixmap_from_rgba(width, height, image.as_raw())
}

/// Straight RGBA8 to a premultiplied tiny-skia pixmap.
pub fn pixmap_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Pixmap> {
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid map size {width}x{height}"))?;
    let src: &[[u8; 4]] =
        bytemuck::try_cast_slice(rgba).map_err(|e| anyhow!("map pixel buffer: {e}"))?;
    if src.len() != pixmap.pixels().len() {
        bail!(
            "map pixel buffer holds {} pixels, expected {}",
            src.len(),
            pixmap.pixels().len()
        );
    }
    for (dst, [r, g, b, a]) in pixmap.pixels_mut().iter_mut().zip(src) {
        *dst = ColorU8::from_rgba(*r, *g, *b, *a).premultiply();
    }
    Ok(pixmap)
}

/// Where a map of a given on-screen height lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Scales the map to `height_px` keeping its aspect ratio, centred, snapped to whole pixels.
pub fn place_map(
    map_width: u32,
    map_height: u32,
    height_px: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Placement {
    let scale = height_px as f32 / map_height.max(1) as f32;
    let width = map_width as f32 * scale;
    let height = height_px as f32;
    Placement {
        x: ((canvas_width as f32 - width) / 2.0).round(),
        y: ((canvas_height as f32 - height) / 2.0).round(),
        width,
        height,
        scale,
    }
}

pub fn draw_map(canvas: &mut Pixmap, map: PixmapRef<'_>, height_px: u32) -> Placement {
    let placement = place_map(
        map.width(),
        map.height(),
        height_px,
        canvas.width(),
        canvas.height(),
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(
        0,
        0,
        map,
        &paint,
        Transform::from_scale(placement.scale, placement.scale)
            .post_translate(placement.x, placement.y),
        None,
    );
    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Pixmap {
        let raw: Vec<u8> = rgba
            .into_iter()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        pixmap_from_rgba(width, height, &raw).unwrap()
    }

    #[test]
    fn placement_keeps_aspect_ratio_and_centres() {
        let p = place_map(600, 300, 300, 1920, 1080);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.width, 600.0);
        assert_eq!((p.x, p.y), (660.0, 390.0));

        let p = place_map(600, 300, 350, 1920, 1080);
        assert!((p.width - 700.0).abs() < 1e-3);
        assert_eq!(p.height, 350.0);
    }

    #[test]
    fn straight_alpha_is_premultiplied() {
        let pm = pixmap_from_rgba(1, 1, &[200, 100, 50, 128]).unwrap();
        let px = pm.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert!(px.red() < 200 && px.red() >= 99);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(pixmap_from_rgba(2, 2, &[0; 12]).is_err());
        assert!(pixmap_from_rgba(2, 2, &[0; 15]).is_err());
        assert!(pixmap_from_rgba(0, 2, &[]).is_err());
    }

    #[test]
    fn map_is_drawn_at_requested_height() {
        let mut canvas = Pixmap::new(100, 100).unwrap();
        canvas.fill(Color::BLACK);
        let map = solid(10, 10, [255, 0, 0, 255]);

        let placement = draw_map(&mut canvas, map.as_ref(), 20);
        assert_eq!((placement.x, placement.y), (40.0, 40.0));

        let inside = canvas.pixel(50, 50).unwrap();
        assert!(inside.red() > 250 && inside.green() < 5);
        let outside = canvas.pixel(10, 10).unwrap();
        assert_eq!((outside.red(), outside.green(), outside.blue()), (0, 0, 0));
    }

    #[test]
    fn decoded_map_keeps_image_dimensions() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("map.png");
        image::RgbaImage::from_pixel(6, 4, image::Rgba([0, 128, 255, 255]))
            .save(&path)
            .unwrap();

        let map = load_map(&path).unwrap();
        assert_eq!((map.width(), map.height()), (6, 4));
        let px = map.pixel(3, 2).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (0, 128, 255));
    }

    #[test]
    fn missing_image_reports_path() {
        let err = load_map(Path::new("/nonexistent/us-map.png")).unwrap_err();
        assert!(err.to_string().contains("us-map.png"));
    }
}
