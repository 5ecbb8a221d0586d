use std::panic::{self, AssertUnwindSafe};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::content::ContentError;

use super::ai::run_ai_phase;
use super::entity::{Entity, DEFAULT_ANIMATION_FRAME_INTERVAL_MS};
use super::grid::{BorderDirection, GridCell};
use super::motion::{advance_entity, MotionStep};
use super::pathfinding::find_path;
use super::scene::SceneState;
use super::transition::{resolve_entry, PendingSceneTransition, PendingSpawn};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub rng_seed: Option<u64>,
    pub animation_frame_interval_ms: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            animation_frame_interval_ms: DEFAULT_ANIMATION_FRAME_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("unknown scene id '{0}'")]
    UnknownScene(String),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// A freshly built scene. The player is kept apart so entry placement can run
/// before it joins the entity list.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub scene: SceneState,
    pub player: Option<Entity>,
}

/// Collaborator that turns scene ids into live scenes and snapshots scenes being left.
pub trait SceneLoader {
    fn contains_scene(&self, scene_id: &str) -> bool;
    fn build_scene(&mut self, scene_id: &str, rng: &mut SmallRng) -> Result<SceneSetup, SceneLoadError>;
    fn persist_scene(&mut self, scene: &SceneState);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub skipped: bool,
    pub panicked: bool,
    pub ai_paths_assigned: usize,
    pub moving_entities: usize,
    pub arrivals: usize,
    pub scene_entered: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Transition {
        target_scene: String,
        direction: BorderDirection,
        steps: usize,
    },
    Walk {
        steps: usize,
    },
    Rejected,
}

/// Owns the active scene and the one-shot spawn token carried between scenes.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    scene: Option<SceneState>,
    pending_spawn: Option<PendingSpawn>,
    rng: SmallRng,
    tick_count: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            config,
            scene: None,
            pending_spawn: None,
            rng,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&SceneState> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut SceneState> {
        self.scene.as_mut()
    }

    pub fn player(&self) -> Option<&Entity> {
        self.scene.as_ref().and_then(SceneState::player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.scene.as_mut().and_then(SceneState::player_mut)
    }

    pub fn pending_spawn(&self) -> Option<PendingSpawn> {
        self.pending_spawn
    }

    pub fn set_pending_spawn(&mut self, spawn: Option<PendingSpawn>) {
        self.pending_spawn = spawn;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshots the current scene, then replaces it with `scene_id`.
    ///
    /// Unknown ids and build failures keep the current scene and drop the
    /// pending spawn token.
    pub fn load_scene<L: SceneLoader + ?Sized>(
        &mut self,
        scene_id: &str,
        loader: &mut L,
    ) -> Result<(), SceneLoadError> {
        if !loader.contains_scene(scene_id) {
            self.pending_spawn = None;
            return Err(SceneLoadError::UnknownScene(scene_id.to_string()));
        }
        if let Some(current) = self.scene.as_ref() {
            loader.persist_scene(current);
        }

        let setup = match loader.build_scene(scene_id, &mut self.rng) {
            Ok(setup) => setup,
            Err(source) => {
                self.pending_spawn = None;
                return Err(source);
            }
        };
        self.enter_scene(setup);
        Ok(())
    }

    /// Installs a built scene, consuming the pending spawn token if any.
    pub fn enter_scene(&mut self, setup: SceneSetup) {
        let SceneSetup { mut scene, player } = setup;
        let frame_interval_ms = self.config.animation_frame_interval_ms;
        for entity in scene.entities_mut() {
            entity.animation.frame_interval_ms = frame_interval_ms;
        }

        let pending_spawn = self.pending_spawn.take();
        if let Some(mut player) = player {
            player.animation.frame_interval_ms = frame_interval_ms;
            if let Some(spawn) = pending_spawn {
                let placement = resolve_entry(&scene, spawn);
                player.place_at(placement.cell.to_pos());
            }
            scene.push_entity(player);
        }

        info!(
            scene = %scene.id,
            kind = scene.kind.as_token(),
            width = scene.width,
            height = scene.height,
            entity_count = scene.entities().len(),
            "scene_loaded"
        );
        self.scene = Some(scene);
    }

    /// Advances one frame. Panics inside the frame are caught and logged.
    pub fn tick<L: SceneLoader + ?Sized>(&mut self, dt_ms: f64, loader: &mut L) -> TickReport {
        self.tick_count = self.tick_count.saturating_add(1);
        let tick = self.tick_count;
        match panic::catch_unwind(AssertUnwindSafe(|| self.tick_frame(dt_ms, loader))) {
            Ok(report) => report,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(tick, dt_ms, message = %message, "tick_panicked");
                self.pending_spawn = None;
                TickReport {
                    panicked: true,
                    ..TickReport::default()
                }
            }
        }
    }

    fn tick_frame<L: SceneLoader + ?Sized>(&mut self, dt_ms: f64, loader: &mut L) -> TickReport {
        let Some(scene) = self.scene.as_mut() else {
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        };
        if !scene.is_game() {
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }

        let mut report = TickReport {
            ai_paths_assigned: run_ai_phase(scene, dt_ms, &mut self.rng),
            ..TickReport::default()
        };

        let mut transition = None;
        for entity in scene.entities_mut() {
            match advance_entity(entity, dt_ms) {
                MotionStep::Moving => report.moving_entities += 1,
                MotionStep::Arrived => report.arrivals += 1,
                MotionStep::Idle => {}
            }
            if entity.is_player() && entity.is_settled() {
                if let Some(armed) = entity.pending_transition.take() {
                    transition = Some((armed, entity.cell()));
                }
            }
        }

        if let Some((armed, exit_cell)) = transition {
            let PendingSceneTransition {
                target_scene,
                direction,
            } = armed;
            info!(
                from = %scene.id,
                to = %target_scene,
                direction = %direction,
                cell = %exit_cell,
                "scene_transition_requested"
            );
            self.pending_spawn = Some(PendingSpawn::from_exit(direction, exit_cell));
            match self.load_scene(&target_scene, loader) {
                Ok(()) => report.scene_entered = Some(target_scene),
                Err(source) => {
                    warn!(scene = %target_scene, error = %source, "scene_load_failed");
                }
            }
        }

        report
    }

    pub fn request_path(&self, from: GridCell, to: GridCell) -> Vec<GridCell> {
        match self.scene.as_ref() {
            Some(scene) => find_path(scene, from, to),
            None => Vec::new(),
        }
    }

    pub fn is_valid_tile(&self, cell: GridCell) -> bool {
        self.scene
            .as_ref()
            .is_some_and(|scene| scene.is_valid_tile(cell))
    }

    pub fn obj_at(&self, cell: GridCell) -> Option<&Entity> {
        self.scene.as_ref().and_then(|scene| scene.obj_at(cell))
    }

    pub fn border_direction(&self, cell: GridCell) -> Option<BorderDirection> {
        self.scene
            .as_ref()
            .and_then(|scene| scene.border_direction(cell))
    }

    /// Click-to-move. Edge cells with a neighbour scene arm a transition
    /// instead of a plain walk, and never fall back to one.
    pub fn command_move(&mut self, destination: GridCell) -> MoveOutcome {
        let Some(scene) = self.scene.as_ref() else {
            return MoveOutcome::Rejected;
        };
        let Some(start) = scene.player().map(Entity::cell) else {
            return MoveOutcome::Rejected;
        };

        if let Some((direction, target_scene)) = scene.exit_at(destination) {
            let target_scene = target_scene.to_string();
            let path = find_path(scene, start, destination);
            if path.is_empty() {
                return MoveOutcome::Rejected;
            }
            let steps = path.len();
            let Some(player) = self.player_mut() else {
                return MoveOutcome::Rejected;
            };
            player.assign_path(path);
            player.pending_transition = Some(PendingSceneTransition {
                target_scene: target_scene.clone(),
                direction,
            });
            return MoveOutcome::Transition {
                target_scene,
                direction,
                steps,
            };
        }

        if !scene.is_valid_tile(destination) {
            return MoveOutcome::Rejected;
        }
        self.command_path_to(destination)
    }

    /// Paths the player toward an in-bounds `destination`; occupied goals are allowed.
    pub fn command_path_to(&mut self, destination: GridCell) -> MoveOutcome {
        let Some(start) = self.player().map(Entity::cell) else {
            return MoveOutcome::Rejected;
        };
        if !self
            .scene
            .as_ref()
            .is_some_and(|scene| scene.in_bounds(destination))
        {
            return MoveOutcome::Rejected;
        }
        let path = self.request_path(start, destination);
        if path.is_empty() {
            return MoveOutcome::Rejected;
        }
        let steps = path.len();
        match self.player_mut() {
            Some(player) => {
                player.assign_path(path);
                MoveOutcome::Walk { steps }
            }
            None => MoveOutcome::Rejected,
        }
    }

    /// One-cell keyboard step. Ignored while the player is mid-move.
    pub fn command_step(&mut self, dx: i32, dy: i32) -> bool {
        let Some(scene) = self.scene.as_ref() else {
            return false;
        };
        let Some(player) = scene.player() else {
            return false;
        };
        if player.motion.is_moving {
            return false;
        }
        let destination = player.cell().offset(dx, dy);
        if !scene.is_valid_tile(destination) {
            return false;
        }
        match self.player_mut() {
            Some(player) => {
                player.assign_path(vec![destination]);
                true
            }
            None => false,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use crate::sim::grid::{GridPos, SceneAdjacency};
    use crate::sim::scene::SceneKind;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixtureLoader {
        scenes: HashMap<String, SceneSetup>,
        persisted: Vec<String>,
        panic_on_build: bool,
    }

    impl FixtureLoader {
        fn with_scene(mut self, scene: SceneState, player_at: Option<GridPos>) -> Self {
            let player = player_at.map(|pos| Entity::new(EntityKind::Player, pos));
            self.scenes
                .insert(scene.id.clone(), SceneSetup { scene, player });
            self
        }
    }

    impl SceneLoader for FixtureLoader {
        fn contains_scene(&self, scene_id: &str) -> bool {
            self.scenes.contains_key(scene_id)
        }

        fn build_scene(
            &mut self,
            scene_id: &str,
            _rng: &mut SmallRng,
        ) -> Result<SceneSetup, SceneLoadError> {
            if self.panic_on_build {
                panic!("fixture build failure for {scene_id}");
            }
            self.scenes
                .get(scene_id)
                .cloned()
                .ok_or_else(|| SceneLoadError::UnknownScene(scene_id.to_string()))
        }

        fn persist_scene(&mut self, scene: &SceneState) {
            self.persisted.push(scene.id.clone());
        }
    }

    fn seeded() -> Simulation {
        Simulation::new(SimulationConfig {
            rng_seed: Some(7),
            ..SimulationConfig::default()
        })
    }

    fn village_and_forest() -> FixtureLoader {
        let village = SceneState::new("village", SceneKind::Game, 6, 6)
            .with_adjacency(SceneAdjacency::default().with(BorderDirection::East, "forest"));
        let forest = SceneState::new("forest", SceneKind::Game, 8, 8)
            .with_adjacency(SceneAdjacency::default().with(BorderDirection::West, "village"));
        FixtureLoader::default()
            .with_scene(village, Some(GridPos::new(2.0, 3.0)))
            .with_scene(forest, Some(GridPos::new(4.0, 4.0)))
    }

    fn run_ticks(simulation: &mut Simulation, loader: &mut FixtureLoader, count: usize) {
        for _ in 0..count {
            simulation.tick(50.0, loader);
        }
    }

    #[test]
    fn unknown_scene_is_rejected_without_side_effects() {
        let mut loader = village_and_forest();
        let mut simulation = seeded();
        simulation.load_scene("village", &mut loader).expect("village");
        let error = simulation
            .load_scene("nowhere", &mut loader)
            .expect_err("unknown scene");
        assert!(matches!(error, SceneLoadError::UnknownScene(id) if id == "nowhere"));
        assert_eq!(simulation.scene().map(|scene| scene.id.as_str()), Some("village"));
        assert!(loader.persisted.is_empty());
    }

    #[test]
    fn edge_click_arms_transition_and_loads_neighbor() {
        let mut loader = village_and_forest();
        let mut simulation = seeded();
        simulation.load_scene("village", &mut loader).expect("village");

        let outcome = simulation.command_move(GridCell::new(5, 3));
        assert_eq!(
            outcome,
            MoveOutcome::Transition {
                target_scene: "forest".to_string(),
                direction: BorderDirection::East,
                steps: 3,
            }
        );

        run_ticks(&mut simulation, &mut loader, 400);
        let scene = simulation.scene().expect("scene");
        assert_eq!(scene.id, "forest");
        assert_eq!(loader.persisted, vec!["village".to_string()]);
        let player = scene.player().expect("player");
        assert_eq!(player.position, GridPos::new(0.0, 3.0));
        assert_eq!(player.spawn, player.position);
        assert!(simulation.pending_spawn().is_none());
    }

    #[test]
    fn edge_without_neighbor_is_a_plain_walk() {
        let mut loader = village_and_forest();
        let mut simulation = seeded();
        simulation.load_scene("village", &mut loader).expect("village");
        assert_eq!(
            simulation.command_move(GridCell::new(0, 3)),
            MoveOutcome::Walk { steps: 2 }
        );
        assert!(simulation.player().is_some_and(|p| p.pending_transition.is_none()));
    }

    #[test]
    fn keyboard_step_requires_valid_neighbor() {
        let mut loader = village_and_forest();
        let mut simulation = seeded();
        simulation.load_scene("village", &mut loader).expect("village");
        assert!(simulation.command_step(1, 0));
        assert!(!simulation.command_step(0, -10));
    }

    #[test]
    fn ui_scenes_do_not_tick() {
        let mut loader = FixtureLoader::default()
            .with_scene(SceneState::new("title", SceneKind::Ui, 1, 1), None);
        let mut simulation = seeded();
        simulation.load_scene("title", &mut loader).expect("title");
        assert!(simulation.tick(16.0, &mut loader).skipped);
    }

    #[test]
    fn panicking_tick_is_contained() {
        let mut loader = village_and_forest();
        let mut simulation = seeded();
        simulation.load_scene("village", &mut loader).expect("village");
        simulation.command_move(GridCell::new(5, 3));
        loader.panic_on_build = true;

        let mut saw_panic = false;
        for _ in 0..400 {
            if simulation.tick(50.0, &mut loader).panicked {
                saw_panic = true;
                break;
            }
        }
        assert!(saw_panic);

        loader.panic_on_build = false;
        let report = simulation.tick(16.0, &mut loader);
        assert!(!report.panicked);
        assert_eq!(simulation.scene().map(|scene| scene.id.as_str()), Some("village"));
    }
}
