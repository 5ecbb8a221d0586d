use crate::app::LoopMetricsSnapshot;
use crate::content::UiElementKind;
use crate::session::{
    text_extent, Alert, ContextMenu, GameSession, UiElementLayout, UiRect, MENU_PADDING_X_PX,
    MENU_TEXT_SIZE_PX,
};
use crate::sim::ScreenPoint;

use super::color::{color_or, parse_color, with_alpha, Rgba, WHITE};
use super::font::{draw_text, draw_text_centered};
use super::raster::Canvas;
use super::sprites::SpriteCache;

const MENU_BACKGROUND: Rgba = [0x22, 0x22, 0x22, 235];
const MENU_BORDER: Rgba = [0x88, 0x88, 0x88, 255];
const MENU_HOVER: Rgba = [0x44, 0x44, 0x44, 255];
const MENU_DISABLED_TEXT: Rgba = [0x77, 0x77, 0x77, 255];
const MENU_DETAIL_TEXT: Rgba = [0xFF, 0x88, 0x66, 255];
const ALERT_BACKGROUND: Rgba = [0, 0, 0, 190];
const ALERT_TEXT_SIZE_PX: f64 = 14.0;
const ALERT_TOP_PX: f64 = 20.0;
const ALERT_SPACING_PX: f64 = 6.0;
const ALERT_PADDING_PX: f64 = 8.0;
const ALERT_FADE_MS: f64 = 500.0;
const DEBUG_TEXT_SIZE_PX: f64 = 7.0;
const DEBUG_LINE_HEIGHT_PX: f64 = 8.0;
const DEBUG_TEXT: Rgba = [0, 255, 0, 255];
const DEBUG_BACKGROUND: Rgba = [0, 0, 0, 200];

/// Per-frame data for the F3 overlay.
#[derive(Debug, Clone, Copy)]
pub struct DebugOverlay {
    pub metrics: LoopMetricsSnapshot,
    pub sprites_loaded: usize,
}

pub(crate) fn draw_ui(canvas: &mut Canvas<'_>, session: &GameSession, sprites: &mut SpriteCache) {
    for layout in session.ui_layout() {
        draw_element(canvas, &layout, sprites);
    }
}

fn fill(canvas: &mut Canvas<'_>, rect: UiRect, color: Rgba) {
    canvas.fill_rect(
        rect.x.round() as i32,
        rect.y.round() as i32,
        rect.width.round() as i32,
        rect.height.round() as i32,
        color,
    );
}

fn draw_element(canvas: &mut Canvas<'_>, layout: &UiElementLayout<'_>, sprites: &mut SpriteCache) {
    if let Some(background) = layout.background().and_then(parse_color) {
        fill(canvas, layout.rect, background);
    }
    let descriptor = layout.descriptor;
    let color = color_or(descriptor.color.as_deref(), WHITE);
    let size = layout.text_size_px();
    let rect = layout.rect;
    match descriptor.kind {
        UiElementKind::Image => {
            let Some(src) = descriptor.src.as_deref() else {
                return;
            };
            if let Some(sprite) = sprites.get(src) {
                canvas.blit_scaled(sprite, rect.x, rect.y, rect.width, rect.height);
            }
        }
        UiElementKind::Button => {
            let (_, text_height) = text_extent(&layout.text, size);
            let top = rect.y + (rect.height - text_height) / 2.0;
            draw_text_centered(canvas, rect.x + rect.width / 2.0, top, &layout.text, size, color);
        }
        UiElementKind::Text => draw_text(canvas, rect.x, rect.y, &layout.text, size, color),
    }
}

pub(crate) fn draw_context_menu(
    canvas: &mut Canvas<'_>,
    menu: &ContextMenu,
    cursor: Option<ScreenPoint>,
) {
    let bounds = menu.bounds();
    fill(canvas, bounds, MENU_BACKGROUND);
    for (index, entry) in menu.entries.iter().enumerate() {
        let row = menu.entry_rect(index);
        let hovered = cursor.is_some_and(|point| row.contains(point));
        if hovered && entry.is_enabled() {
            fill(canvas, row, MENU_HOVER);
        }
        let text_color = if entry.is_enabled() {
            WHITE
        } else {
            MENU_DISABLED_TEXT
        };
        let (_, text_height) = text_extent(&entry.label, MENU_TEXT_SIZE_PX);
        let text_top = row.y + (row.height - text_height) / 2.0;
        draw_text(canvas, row.x + MENU_PADDING_X_PX, text_top, &entry.label, MENU_TEXT_SIZE_PX, text_color);

        if let (true, Some(detail)) = (hovered, entry.detail.as_deref()) {
            draw_text(
                canvas,
                row.x + row.width + 8.0,
                text_top,
                detail,
                MENU_TEXT_SIZE_PX,
                MENU_DETAIL_TEXT,
            );
        }
    }
    canvas.rect_outline(
        bounds.x.round() as i32,
        bounds.y.round() as i32,
        bounds.width.round() as i32,
        bounds.height.round() as i32,
        MENU_BORDER,
    );
}

pub(crate) fn draw_alerts<'a>(canvas: &mut Canvas<'_>, alerts: impl Iterator<Item = &'a Alert>) {
    let center_x = canvas.width() as f64 / 2.0;
    let mut top = ALERT_TOP_PX;
    for alert in alerts {
        let fade = (alert.remaining_ms / ALERT_FADE_MS).clamp(0.0, 1.0);
        let (width, height) = text_extent(&alert.text, ALERT_TEXT_SIZE_PX);
        let box_rect = UiRect {
            x: center_x - width / 2.0 - ALERT_PADDING_PX,
            y: top,
            width: width + ALERT_PADDING_PX * 2.0,
            height: height + ALERT_PADDING_PX * 2.0,
        };
        fill(canvas, box_rect, with_alpha(ALERT_BACKGROUND, fade));
        draw_text_centered(
            canvas,
            center_x,
            top + ALERT_PADDING_PX,
            &alert.text,
            ALERT_TEXT_SIZE_PX,
            with_alpha(WHITE, fade),
        );
        top += box_rect.height + ALERT_SPACING_PX;
    }
}

pub fn debug_lines(session: &GameSession, overlay: &DebugOverlay) -> Vec<String> {
    let simulation = session.simulation();
    let mut lines = vec![format!(
        "FPS {:.0}  FRAME {:.1}MS  WORST {:.1}MS",
        overlay.metrics.fps, overlay.metrics.frame_time_ms, overlay.metrics.worst_frame_ms
    )];
    match simulation.scene() {
        Some(scene) => {
            lines.push(format!(
                "SCENE {} ({})  {}X{}",
                scene.id,
                scene.kind.as_token(),
                scene.width,
                scene.height
            ));
            let moving = scene
                .entities()
                .iter()
                .filter(|entity| entity.motion.is_moving)
                .count();
            lines.push(format!(
                "ENTITIES {}  MOVING {}",
                scene.entities().len(),
                moving
            ));
        }
        None => lines.push("SCENE -".to_string()),
    }
    if let Some(player) = simulation.player() {
        lines.push(format!(
            "PLAYER {:.2},{:.2}  PATH {}",
            player.position.x,
            player.position.y,
            player.motion.path.len()
        ));
    }
    if let Some(cell) = session.hover_cell() {
        lines.push(format!("HOVER {},{}  {:?}", cell.x, cell.y, session.cursor_hint()));
    }
    lines.push(format!(
        "TICK {}  SPRITES {}",
        simulation.tick_count(),
        overlay.sprites_loaded
    ));
    lines
}

pub(crate) fn draw_debug_overlay(
    canvas: &mut Canvas<'_>,
    session: &GameSession,
    overlay: &DebugOverlay,
) {
    let lines = debug_lines(session, overlay);
    let width = lines
        .iter()
        .map(|line| text_extent(line, DEBUG_TEXT_SIZE_PX).0)
        .fold(0.0, f64::max);
    let height = lines.len() as f64 * DEBUG_LINE_HEIGHT_PX + 6.0;
    let top = canvas.height() as f64 - height - 4.0;
    fill(
        canvas,
        UiRect {
            x: 4.0,
            y: top,
            width: width + 8.0,
            height,
        },
        DEBUG_BACKGROUND,
    );
    for (index, line) in lines.iter().enumerate() {
        draw_text(
            canvas,
            8.0,
            top + 3.0 + index as f64 * DEBUG_LINE_HEIGHT_PX,
            line,
            DEBUG_TEXT_SIZE_PX,
            DEBUG_TEXT,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AlertQueue;

    #[test]
    fn alerts_stack_down_from_the_top() {
        let mut alerts = AlertQueue::default();
        alerts.push("one");
        alerts.push("two");
        let mut frame = vec![0u8; 200 * 120 * 4];
        let mut canvas = Canvas::new(&mut frame, 200, 120);
        draw_alerts(&mut canvas, alerts.iter());

        // Box spans 20..46 for the first alert, the second starts at 52.
        assert_ne!(canvas.pixel(100 - 12, 21), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(100, 48), Some([0, 0, 0, 0]));
        assert_ne!(canvas.pixel(100 - 12, 53), Some([0, 0, 0, 0]));
    }
}
