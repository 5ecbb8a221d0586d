use crate::rules::RulesState;
use crate::sim::{Entity, GridCell, ScreenPoint, SceneState};

use super::overlay::{text_extent, UiRect};

pub const INTERACTION_RANGE: u32 = 1;
pub const MENU_MIN_WIDTH_PX: f64 = 120.0;
pub const MENU_ENTRY_HEIGHT_PX: f64 = 28.0;
pub const MENU_PADDING_X_PX: f64 = 15.0;
pub const MENU_TEXT_SIZE_PX: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    /// Edge cell leading to a neighbouring scene.
    Transition,
    /// Edge cell with no neighbour configured.
    BlockedEdge,
    Interactable,
    Walkable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    /// `None` renders the entry disabled.
    pub action: Option<String>,
    pub detail: Option<String>,
}

impl MenuEntry {
    fn enabled(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: Some(action.into()),
            detail: None,
        }
    }

    fn disabled(label: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            label: label.into(),
            action: None,
            detail,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.action.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub anchor: ScreenPoint,
    /// Entity index the menu was opened on.
    pub target: Option<usize>,
    pub entries: Vec<MenuEntry>,
}

impl ContextMenu {
    pub fn width(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| text_extent(&entry.label, MENU_TEXT_SIZE_PX).0 + MENU_PADDING_X_PX * 2.0)
            .fold(MENU_MIN_WIDTH_PX, f64::max)
    }

    pub fn entry_rect(&self, index: usize) -> UiRect {
        UiRect {
            x: self.anchor.x,
            y: self.anchor.y + index as f64 * MENU_ENTRY_HEIGHT_PX,
            width: self.width(),
            height: MENU_ENTRY_HEIGHT_PX,
        }
    }

    pub fn bounds(&self) -> UiRect {
        UiRect {
            x: self.anchor.x,
            y: self.anchor.y,
            width: self.width(),
            height: self.entries.len() as f64 * MENU_ENTRY_HEIGHT_PX,
        }
    }

    pub fn entry_at(&self, point: ScreenPoint) -> Option<&MenuEntry> {
        (0..self.entries.len())
            .find(|&index| self.entry_rect(index).contains(point))
            .and_then(|index| self.entries.get(index))
    }
}

/// Manhattan distance between rounded cells, or `None` without a player.
pub fn player_distance(scene: &SceneState, target: &Entity) -> Option<u32> {
    scene
        .player()
        .map(|player| player.cell().manhattan_distance(target.cell()))
}

pub fn build_context_menu(
    scene: &SceneState,
    rules: &RulesState,
    cell: GridCell,
    anchor: ScreenPoint,
) -> ContextMenu {
    let Some(target) = scene.obj_index_at(cell) else {
        let entries = if scene.in_bounds(cell) {
            vec![MenuEntry::enabled(
                "Walk here",
                format!("movePlayer:{}:{}", cell.x, cell.y),
            )]
        } else {
            Vec::new()
        };
        return ContextMenu {
            anchor,
            target: None,
            entries,
        };
    };

    let mut entries = Vec::new();
    if let Some(entity) = scene.entity(target) {
        let kind = entity.kind.as_token();
        entries.push(MenuEntry::enabled(
            format!("Info: {kind}"),
            format!("log:Selection {kind}"),
        ));
        if let Some(interaction) = entity.interaction.as_ref() {
            let in_range =
                player_distance(scene, entity).is_some_and(|distance| distance <= INTERACTION_RANGE);
            let entry = if !in_range {
                MenuEntry::disabled("Too far", None)
            } else if rules.check(interaction.condition.as_ref()) {
                MenuEntry::enabled("Interact", interaction.action.clone())
            } else {
                MenuEntry::disabled("Blocked", interaction.fail_message.clone())
            };
            entries.push(entry);
        }
    }

    ContextMenu {
        anchor,
        target: Some(target),
        entries,
    }
}

pub fn cursor_hint(scene: &SceneState, cell: GridCell) -> CursorHint {
    if !scene.is_game() {
        return CursorHint::Default;
    }
    if scene.border_direction(cell).is_some() {
        return match scene.exit_at(cell) {
            Some(_) => CursorHint::Transition,
            None => CursorHint::BlockedEdge,
        };
    }
    if scene
        .obj_at(cell)
        .is_some_and(|entity| entity.interaction.is_some())
    {
        return CursorHint::Interactable;
    }
    if scene.is_valid_tile(cell) {
        CursorHint::Walkable
    } else {
        CursorHint::Default
    }
}
