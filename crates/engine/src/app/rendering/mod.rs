mod color;
mod font;
mod hud;
mod raster;
mod renderer;
mod scene_view;
mod sprites;

pub use color::{parse_color, shade, Rgba};
pub use hud::{debug_lines, DebugOverlay};
pub use raster::{Canvas, Sprite};
pub use renderer::Renderer;
pub use scene_view::{directional_frame_path, draw_order, entity_anchor};
pub use sprites::SpriteCache;
