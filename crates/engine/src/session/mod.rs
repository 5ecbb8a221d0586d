mod library;
mod menu;
mod overlay;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::content::{GameDescriptor, InputMode, SceneDescriptor, UiElementDescriptor};
use crate::persist::{load_json, save_json, StateStore, StoreError, GLOBALS_KEY, INVENTORY_KEY};
use crate::rules::{Action, ActionParseError, GlobalValue, Globals, Inventory, RulesState};
use crate::sim::{
    GridCell, IsoProjection, MoveOutcome, SceneKind, SceneLoadError, ScreenPoint, Simulation,
    SimulationConfig, TickReport,
};

pub use library::SceneLibrary;
pub use menu::{
    build_context_menu, cursor_hint, player_distance, ContextMenu, CursorHint, MenuEntry,
    INTERACTION_RANGE, MENU_ENTRY_HEIGHT_PX, MENU_PADDING_X_PX, MENU_TEXT_SIZE_PX,
};
pub use overlay::{
    action_at, layout_elements, text_extent, text_scale, Alert, AlertQueue, UiElementLayout,
    UiRect, ALERT_DURATION_MS, GLYPH_HEIGHT, GLYPH_WIDTH,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to restore saved state: {0}")]
    Store(#[from] StoreError),
    #[error("game declares no start scene")]
    NoStartScene,
    #[error("failed to load start scene: {0}")]
    StartScene(#[from] SceneLoadError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Executed(Action),
    /// Parsed but changed nothing: missing item, failed load, no path.
    NoEffect(Action),
    TooFar { distance: u32 },
    Invalid(ActionParseError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Menu(ActionOutcome),
    Ui(ActionOutcome),
    Move(MoveOutcome),
    Ignored,
}

/// One running game: descriptors, the live simulation, rules state and the
/// overlay state driven by input.
pub struct GameSession {
    library: SceneLibrary,
    simulation: Simulation,
    rules: RulesState,
    input_mode: InputMode,
    projection: IsoProjection,
    viewport: (u32, u32),
    cursor: Option<ScreenPoint>,
    hover_cell: Option<GridCell>,
    context_menu: Option<ContextMenu>,
    alerts: AlertQueue,
}

impl GameSession {
    /// XML globals are replaced wholesale by stored ones when present.
    pub fn new(
        game: GameDescriptor,
        content_root: impl Into<PathBuf>,
        store: Box<dyn StateStore>,
        config: SimulationConfig,
    ) -> Result<Self, SessionError> {
        let mut rules = RulesState::default();
        for (name, value) in &game.globals {
            rules
                .globals
                .insert(name.clone(), GlobalValue::Text(value.clone()));
        }
        if let Some(saved) = load_json::<Globals, _>(&*store, GLOBALS_KEY)? {
            info!(count = saved.len(), "globals_restored");
            rules.globals = saved;
        }
        if let Some(saved) = load_json::<Inventory, _>(&*store, INVENTORY_KEY)? {
            info!(stacks = saved.items().len(), "inventory_restored");
            rules.inventory = saved;
        }

        info!(
            file = %game.file_path.display(),
            scene_count = game.scenes.len(),
            asset_count = game.assets.len(),
            input_mode = ?game.input_mode,
            "game_loaded"
        );
        let input_mode = game.input_mode;
        let projection = IsoProjection::new(game.tile_width, game.tile_height);
        Ok(Self {
            library: SceneLibrary::new(game, content_root, store),
            simulation: Simulation::new(config),
            rules,
            input_mode,
            projection,
            viewport: (0, 0),
            cursor: None,
            hover_cell: None,
            context_menu: None,
            alerts: AlertQueue::default(),
        })
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        let Some(start) = self.library.game().start_scene().map(str::to_string) else {
            return Err(SessionError::NoStartScene);
        };
        self.load_scene(&start)?;
        Ok(())
    }

    pub fn library(&self) -> &SceneLibrary {
        &self.library
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn rules(&self) -> &RulesState {
        &self.rules
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn cursor(&self) -> Option<ScreenPoint> {
        self.cursor
    }

    pub fn hover_cell(&self) -> Option<GridCell> {
        self.hover_cell
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    pub fn active_descriptor(&self) -> Option<&SceneDescriptor> {
        let scene = self.simulation.scene()?;
        self.library.descriptor(&scene.id)
    }

    fn in_game_scene(&self) -> bool {
        self.simulation.scene().is_some_and(|scene| scene.is_game())
    }

    pub fn load_scene(&mut self, scene_id: &str) -> Result<(), SceneLoadError> {
        self.context_menu = None;
        self.simulation.load_scene(scene_id, &mut self.library)
    }

    pub fn tick(&mut self, dt_ms: f64) -> TickReport {
        let report = self.simulation.tick(dt_ms, &mut self.library);
        if report.scene_entered.is_some() {
            self.context_menu = None;
        }
        self.alerts.advance(dt_ms);
        report
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.projection.fit_viewport_width(width);
    }

    /// Hover tracking only runs in game scenes.
    pub fn set_cursor(&mut self, cursor: Option<ScreenPoint>) {
        self.cursor = cursor;
        self.hover_cell = match cursor {
            Some(point) if self.in_game_scene() => Some(self.projection.screen_to_cell(point)),
            _ => None,
        };
    }

    pub fn cursor_hint(&self) -> CursorHint {
        match (self.simulation.scene(), self.hover_cell) {
            (Some(scene), Some(cell)) => cursor_hint(scene, cell),
            _ => CursorHint::Default,
        }
    }

    /// UI children for `ui` scenes, HUD children for game scenes.
    pub fn active_ui_elements(&self) -> &[UiElementDescriptor] {
        let Some(scene) = self.simulation.scene() else {
            return &[];
        };
        let Some(descriptor) = self.library.descriptor(&scene.id) else {
            return &[];
        };
        match scene.kind {
            SceneKind::Ui => &descriptor.ui,
            SceneKind::Game => &descriptor.hud,
        }
    }

    pub fn ui_layout(&self) -> Vec<UiElementLayout<'_>> {
        layout_elements(
            self.active_ui_elements(),
            &self.rules,
            self.viewport,
            self.cursor,
        )
    }

    pub fn handle_left_click(&mut self, point: ScreenPoint) -> ClickOutcome {
        if let Some(menu) = self.context_menu.take() {
            if let Some(entry) = menu.entry_at(point) {
                return match entry.action.clone() {
                    Some(action) => ClickOutcome::Menu(self.execute_action(&action, menu.target)),
                    None => {
                        self.context_menu = Some(menu);
                        ClickOutcome::Ignored
                    }
                };
            }
        }

        let ui_action = action_at(&self.ui_layout(), point).map(str::to_string);
        if let Some(action) = ui_action {
            return ClickOutcome::Ui(self.execute_action(&action, None));
        }

        if !self.in_game_scene() || !self.input_mode.allows_mouse() {
            return ClickOutcome::Ignored;
        }
        let cell = self.projection.screen_to_cell(point);
        ClickOutcome::Move(self.simulation.command_move(cell))
    }

    /// Opens the context menu for the cell under `point`.
    pub fn handle_right_click(&mut self, point: ScreenPoint) -> bool {
        if !self.input_mode.allows_mouse() {
            return false;
        }
        let Some(scene) = self.simulation.scene().filter(|scene| scene.is_game()) else {
            return false;
        };
        let cell = self.projection.screen_to_cell(point);
        let menu = build_context_menu(scene, &self.rules, cell, point);
        if menu.entries.is_empty() {
            self.context_menu = None;
            return false;
        }
        self.context_menu = Some(menu);
        true
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Arrow-key step; ignored in mouse-only games and `ui` scenes.
    pub fn handle_step(&mut self, dx: i32, dy: i32) -> bool {
        if !self.input_mode.allows_keyboard() || !self.in_game_scene() {
            return false;
        }
        self.simulation.command_step(dx, dy)
    }

    /// Runs an action string. With a target entity, every command except
    /// `loadScene` and `movePlayer` needs the player within interaction range.
    pub fn execute_action(&mut self, raw: &str, target: Option<usize>) -> ActionOutcome {
        let action = match Action::parse(raw) {
            Ok(action) => action,
            Err(error) => {
                warn!(action = raw, error = %error, "action_rejected");
                return ActionOutcome::Invalid(error);
            }
        };

        if action.requires_proximity() {
            if let Some(distance) = target.and_then(|index| self.target_distance(index)) {
                if distance > INTERACTION_RANGE {
                    info!(action = raw, distance, reason = "too_far", "action_rejected");
                    return ActionOutcome::TooFar { distance };
                }
            }
        }

        let applied = self.apply_action(&action);
        info!(action = raw, applied, "action_executed");
        if applied {
            ActionOutcome::Executed(action)
        } else {
            ActionOutcome::NoEffect(action)
        }
    }

    fn target_distance(&self, index: usize) -> Option<u32> {
        let scene = self.simulation.scene()?;
        let target = scene.entity(index)?;
        player_distance(scene, target)
    }

    fn apply_action(&mut self, action: &Action) -> bool {
        match action {
            Action::LoadScene(scene_id) => match self.load_scene(scene_id) {
                Ok(()) => true,
                Err(error) => {
                    warn!(scene = %scene_id, error = %error, "scene_load_failed");
                    false
                }
            },
            Action::Alert(text) => {
                info!(text = %text, "alert_raised");
                self.alerts.push(text.clone());
                true
            }
            Action::Log(text) => {
                info!(message = %text, "script_log");
                true
            }
            Action::AddVar { name, delta } => {
                let value = self.rules.add_var(name, *delta);
                info!(var = %name, value, "global_changed");
                self.save_rules();
                true
            }
            Action::SetVar { name, value } => {
                self.rules.set_var(name, value);
                info!(var = %name, value = %value, "global_changed");
                self.save_rules();
                true
            }
            Action::MovePlayer { x, y } => matches!(
                self.simulation.command_path_to(GridCell::new(*x, *y)),
                MoveOutcome::Walk { .. }
            ),
            Action::AddItem { item, quantity } => {
                let total = self.rules.inventory.add(item, *quantity);
                info!(item = %item, delta = *quantity, total, "inventory_changed");
                self.save_rules();
                true
            }
            Action::RemoveItem { item, quantity } => {
                if !self.rules.inventory.remove(item, *quantity) {
                    return false;
                }
                let total = self.rules.inventory.quantity(item);
                info!(item = %item, delta = -*quantity, total, "inventory_changed");
                self.save_rules();
                true
            }
            Action::UseItem(item) => {
                if self.rules.inventory.has(item, 1) {
                    info!(item = %item, "item_used");
                    true
                } else {
                    warn!(item = %item, "item_use_missing");
                    false
                }
            }
        }
    }

    fn save_rules(&mut self) {
        let store = self.library.store_mut();
        let result = save_json(store, GLOBALS_KEY, &self.rules.globals)
            .and_then(|()| save_json(store, INVENTORY_KEY, &self.rules.inventory));
        if let Err(error) = result {
            warn!(error = %error, "rules_state_save_failed");
        }
    }
}
