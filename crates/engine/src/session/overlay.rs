use std::collections::VecDeque;

use crate::content::{UiElementDescriptor, UiElementKind};
use crate::rules::{render_template, RulesState};
use crate::sim::ScreenPoint;

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;
pub const DEFAULT_UI_TEXT_SIZE_PX: f64 = 14.0;
pub const BUTTON_PADDING_PX: f64 = 8.0;
pub const ALERT_DURATION_MS: f64 = 3000.0;
pub const MAX_QUEUED_ALERTS: usize = 4;

/// Integer scale applied to the 3x5 bitmap font for a nominal pixel size.
pub fn text_scale(size_px: f64) -> u32 {
    ((size_px / 7.0).round() as u32).max(1)
}

pub fn text_extent(text: &str, size_px: f64) -> (f64, f64) {
    let scale = text_scale(size_px) as f64;
    let glyphs = text.chars().count() as f64;
    let width = if glyphs == 0.0 {
        0.0
    } else {
        glyphs * (GLYPH_WIDTH as f64 + 1.0) * scale - scale
    };
    (width, GLYPH_HEIGHT as f64 * scale)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl UiRect {
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// A UI or HUD element resolved against the current viewport and rules state.
#[derive(Debug, Clone, PartialEq)]
pub struct UiElementLayout<'a> {
    pub descriptor: &'a UiElementDescriptor,
    pub text: String,
    pub rect: UiRect,
    pub hovered: bool,
}

impl UiElementLayout<'_> {
    pub fn background(&self) -> Option<&str> {
        let descriptor = self.descriptor;
        if self.hovered && descriptor.kind == UiElementKind::Button {
            if let Some(hover) = descriptor.hover_background.as_deref() {
                return Some(hover);
            }
        }
        descriptor.background.as_deref()
    }

    pub fn text_size_px(&self) -> f64 {
        self.descriptor.size_px.unwrap_or(DEFAULT_UI_TEXT_SIZE_PX)
    }
}

pub fn layout_elements<'a>(
    elements: &'a [UiElementDescriptor],
    rules: &RulesState,
    viewport: (u32, u32),
    cursor: Option<ScreenPoint>,
) -> Vec<UiElementLayout<'a>> {
    elements
        .iter()
        .map(|descriptor| {
            let text = match descriptor.kind {
                UiElementKind::Image => String::new(),
                _ => render_template(&descriptor.content, rules),
            };
            let rect = element_rect(descriptor, &text, viewport);
            let hovered = cursor.is_some_and(|point| rect.contains(point));
            UiElementLayout {
                descriptor,
                text,
                rect,
                hovered,
            }
        })
        .collect()
}

fn element_rect(descriptor: &UiElementDescriptor, text: &str, viewport: (u32, u32)) -> UiRect {
    let (view_width, view_height) = (viewport.0 as f64, viewport.1 as f64);
    let size_px = descriptor.size_px.unwrap_or(DEFAULT_UI_TEXT_SIZE_PX);
    let (text_width, text_height) = text_extent(text, size_px);
    let padding = match descriptor.kind {
        UiElementKind::Button => BUTTON_PADDING_PX * 2.0,
        _ => 0.0,
    };
    let width = descriptor.width.unwrap_or(text_width + padding);
    let height = descriptor.height.unwrap_or(text_height + padding);

    let x = match (descriptor.left, descriptor.right) {
        (Some(left), _) => left.resolve(view_width),
        (None, Some(right)) => view_width - right.resolve(view_width) - width,
        (None, None) => 0.0,
    };
    let y = match (descriptor.top, descriptor.bottom) {
        (Some(top), _) => top.resolve(view_height),
        (None, Some(bottom)) => view_height - bottom.resolve(view_height) - height,
        (None, None) => 0.0,
    };
    UiRect {
        x,
        y,
        width,
        height,
    }
}

/// Topmost element with an action under `point`.
pub fn action_at<'a>(layouts: &'a [UiElementLayout<'_>], point: ScreenPoint) -> Option<&'a str> {
    layouts
        .iter()
        .rev()
        .filter(|layout| layout.rect.contains(point))
        .find_map(|layout| layout.descriptor.action.as_deref())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub text: String,
    pub remaining_ms: f64,
}

/// Toast messages raised by `alert:` actions; oldest dropped first when full.
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    alerts: VecDeque<Alert>,
}

impl AlertQueue {
    pub fn push(&mut self, text: impl Into<String>) {
        if self.alerts.len() == MAX_QUEUED_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(Alert {
            text: text.into(),
            remaining_ms: ALERT_DURATION_MS,
        });
    }

    pub fn advance(&mut self, dt_ms: f64) {
        for alert in &mut self.alerts {
            alert.remaining_ms -= dt_ms;
        }
        self.alerts.retain(|alert| alert.remaining_ms > 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::UiLength;
    use crate::rules::GlobalValue;

    fn element(kind: UiElementKind, content: &str) -> UiElementDescriptor {
        UiElementDescriptor {
            kind,
            content: content.to_string(),
            src: None,
            top: None,
            left: None,
            bottom: None,
            right: None,
            width: None,
            height: None,
            color: None,
            background: None,
            hover_background: None,
            size_px: None,
            action: None,
        }
    }

    #[test]
    fn text_extent_scales_with_size() {
        assert_eq!(text_scale(14.0), 2);
        assert_eq!(text_scale(1.0), 1);
        assert_eq!(text_extent("ab", 14.0), (14.0, 10.0));
        assert_eq!(text_extent("", 14.0), (0.0, 10.0));
    }

    #[test]
    fn elements_anchor_to_edges_and_percentages() {
        let mut left = element(UiElementKind::Text, "hi");
        left.left = Some(UiLength::Percent(50.0));
        left.top = Some(UiLength::Px(10.0));

        let mut corner = element(UiElementKind::Image, "");
        corner.right = Some(UiLength::Px(10.0));
        corner.bottom = Some(UiLength::Px(20.0));
        corner.width = Some(40.0);
        corner.height = Some(30.0);

        let elements = vec![left, corner];
        let layouts = layout_elements(&elements, &RulesState::default(), (800, 600), None);
        assert_eq!(layouts[0].rect.x, 400.0);
        assert_eq!(layouts[0].rect.y, 10.0);
        assert_eq!(
            layouts[1].rect,
            UiRect {
                x: 750.0,
                y: 550.0,
                width: 40.0,
                height: 30.0
            }
        );
    }

    #[test]
    fn templates_expand_and_buttons_resolve_hover_and_actions() {
        let mut rules = RulesState::default();
        rules.globals.insert("gold".into(), GlobalValue::Number(3.0));
        let hud = element(UiElementKind::Text, "Gold: {gold}");
        let mut button = element(UiElementKind::Button, "Go");
        button.width = Some(100.0);
        button.height = Some(40.0);
        button.top = Some(UiLength::Px(100.0));
        button.background = Some("#222".into());
        button.hover_background = Some("#444".into());
        button.action = Some("loadScene:village".into());

        let elements = vec![hud, button];
        let cursor = ScreenPoint { x: 50.0, y: 120.0 };
        let layouts = layout_elements(&elements, &rules, (800, 600), Some(cursor));
        assert_eq!(layouts[0].text, "Gold: 3");
        assert!(layouts[1].hovered);
        assert_eq!(layouts[1].background(), Some("#444"));
        assert_eq!(action_at(&layouts, cursor), Some("loadScene:village"));
        assert_eq!(action_at(&layouts, ScreenPoint { x: 500.0, y: 500.0 }), None);
    }

    #[test]
    fn alerts_expire_and_cap() {
        let mut alerts = AlertQueue::default();
        for index in 0..6 {
            alerts.push(format!("alert {index}"));
        }
        assert_eq!(alerts.len(), MAX_QUEUED_ALERTS);
        assert_eq!(alerts.iter().next().map(|a| a.text.as_str()), Some("alert 2"));

        alerts.advance(ALERT_DURATION_MS - 1.0);
        assert_eq!(alerts.len(), MAX_QUEUED_ALERTS);
        alerts.advance(1.0);
        assert!(alerts.is_empty());
    }
}
