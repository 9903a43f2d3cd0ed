pub mod map;
pub mod render;
pub mod text;

pub use map::{Placement, draw_map, load_map, pixmap_from_rgba, place_map};
pub use render::{Assets, FrameTimings, SkiaRenderer};
pub use text::{ScreenText, TextCache, load_font};
