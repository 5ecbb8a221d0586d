mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    debug_lines, directional_frame_path, draw_order, entity_anchor, parse_color, shade, Canvas,
    DebugOverlay, Renderer, Rgba, Sprite, SpriteCache,
};
