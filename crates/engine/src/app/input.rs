use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::session::{ClickOutcome, GameSession};
use crate::sim::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ToggleDebug,
    Quit,
}

const ACTION_COUNT: usize = 6;

/// Step priority when several arrows land in the same tick.
const STEP_ACTIONS: [(InputAction, i32, i32); 4] = [
    (InputAction::MoveUp, 0, -1),
    (InputAction::MoveDown, 0, 1),
    (InputAction::MoveLeft, -1, 0),
    (InputAction::MoveRight, 1, 0),
];

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::ToggleDebug => 4,
            InputAction::Quit => 5,
        }
    }

    fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        match key {
            PhysicalKey::Code(KeyCode::ArrowUp) => Some(InputAction::MoveUp),
            PhysicalKey::Code(KeyCode::ArrowDown) => Some(InputAction::MoveDown),
            PhysicalKey::Code(KeyCode::ArrowLeft) => Some(InputAction::MoveLeft),
            PhysicalKey::Code(KeyCode::ArrowRight) => Some(InputAction::MoveRight),
            PhysicalKey::Code(KeyCode::F3) => Some(InputAction::ToggleDebug),
            PhysicalKey::Code(KeyCode::Escape) => Some(InputAction::Quit),
            _ => None,
        }
    }
}

/// Held state plus press edges; an edge is set on the up-to-down transition
/// only, so OS key repeat never retriggers it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    fn take_pressed(&mut self, action: InputAction) -> bool {
        std::mem::take(&mut self.pressed[action.index()])
    }

    fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<ScreenPoint>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn cursor_position_px(&self) -> Option<ScreenPoint> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// First arrow pressed this tick, in up/down/left/right priority.
    pub fn step_direction(&self) -> Option<(i32, i32)> {
        STEP_ACTIONS
            .iter()
            .find(|(action, _, _)| self.was_pressed(*action))
            .map(|&(_, dx, dy)| (dx, dy))
    }
}

#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    pub(crate) quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<ScreenPoint>,
    left_mouse_is_down: bool,
    left_click_pressed_edge: bool,
    right_mouse_is_down: bool,
    right_click_pressed_edge: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    pub(crate) fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if key_event.repeat {
            return;
        }
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(action) = InputAction::from_physical_key(key) else {
            return;
        };
        self.actions.set(action, is_pressed);
        if action == InputAction::Quit && is_pressed {
            self.mark_quit_requested();
        }
    }

    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let (is_down, pressed_edge) = match button {
            MouseButton::Left => (&mut self.left_mouse_is_down, &mut self.left_click_pressed_edge),
            MouseButton::Right => (
                &mut self.right_mouse_is_down,
                &mut self.right_click_pressed_edge,
            ),
            _ => return,
        };
        match state {
            ElementState::Pressed => {
                if !*is_down {
                    *pressed_edge = true;
                }
                *is_down = true;
            }
            ElementState::Released => *is_down = false,
        }
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    pub(crate) fn set_cursor_position_px(&mut self, x: f64, y: f64) {
        self.cursor_position_px = Some(ScreenPoint { x, y });
    }

    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Debug toggle is consumed per frame, outside the tick snapshot.
    pub(crate) fn take_debug_toggle_pressed(&mut self) -> bool {
        self.actions.take_pressed(InputAction::ToggleDebug)
    }

    pub(crate) fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            quit_requested: self.quit_requested,
            actions: self.actions,
            cursor_position_px: self.cursor_position_px,
            left_click_pressed: self.left_click_pressed_edge,
            right_click_pressed: self.right_click_pressed_edge,
            window_width: self.window_width,
            window_height: self.window_height,
        };
        self.actions.clear_edges();
        self.left_click_pressed_edge = false;
        self.right_click_pressed_edge = false;
        snapshot
    }
}

/// Feeds one tick of input into the session, before it is ticked.
pub(crate) fn apply_input(session: &mut GameSession, snapshot: &InputSnapshot) {
    let (width, height) = snapshot.window_size();
    if session.viewport() != (width, height) {
        session.set_viewport(width, height);
    }
    session.set_cursor(snapshot.cursor_position_px());

    if let Some(point) = snapshot.cursor_position_px() {
        if snapshot.left_click_pressed() {
            let outcome = session.handle_left_click(point);
            if outcome != ClickOutcome::Ignored {
                tracing::debug!(outcome = ?outcome, "left_click_handled");
            }
        } else if snapshot.right_click_pressed() {
            session.handle_right_click(point);
        }
    }

    if let Some((dx, dy)) = snapshot.step_direction() {
        session.handle_step(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowRight), true);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert_eq!(first.step_direction(), Some((1, 0)));
        assert!(second.is_down(InputAction::MoveRight));
        assert_eq!(second.step_direction(), None);
    }

    #[test]
    fn held_arrow_does_not_spam_press_edges() {
        let mut input = InputCollector::default();
        let key = PhysicalKey::Code(KeyCode::ArrowUp);
        input.update_action_state_from_physical_key(key, true);
        let first = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(key, true);
        let second = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(key, false);
        input.update_action_state_from_physical_key(key, true);
        let third = input.snapshot_for_tick();
        assert!(first.was_pressed(InputAction::MoveUp));
        assert!(!second.was_pressed(InputAction::MoveUp));
        assert!(third.was_pressed(InputAction::MoveUp));
    }

    #[test]
    fn step_priority_prefers_vertical_arrows() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowDown), true);
        assert_eq!(input.snapshot_for_tick().step_direction(), Some((0, 1)));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), false);
        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveLeft));
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        assert!(input.quit_requested);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn f3_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();
        let f3 = PhysicalKey::Code(KeyCode::F3);
        input.update_action_state_from_physical_key(f3, true);
        assert!(input.take_debug_toggle_pressed());
        input.update_action_state_from_physical_key(f3, true);
        assert!(!input.take_debug_toggle_pressed());
        input.update_action_state_from_physical_key(f3, false);
        input.update_action_state_from_physical_key(f3, true);
        assert!(input.take_debug_toggle_pressed());
    }

    #[test]
    fn left_click_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let first = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let second = input.snapshot_for_tick();
        assert!(first.left_click_pressed());
        assert!(!second.left_click_pressed());
    }

    #[test]
    fn right_click_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert!(first.right_click_pressed());
        assert!(!second.right_click_pressed());
    }

    #[test]
    fn snapshot_carries_cursor_and_window_size() {
        let mut input = InputCollector::new(1280, 720);
        input.set_cursor_position_px(100.0, 200.0);
        let snapshot = input.snapshot_for_tick();
        assert_eq!(snapshot.window_size(), (1280, 720));
        let cursor = snapshot.cursor_position_px().expect("cursor");
        assert!((cursor.x - 100.0).abs() < 0.0001);
        assert!((cursor.y - 200.0).abs() < 0.0001);

        input.clear_cursor_position();
        assert!(input.snapshot_for_tick().cursor_position_px().is_none());
    }
}
