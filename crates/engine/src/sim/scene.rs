use super::entity::Entity;
use super::grid::{BorderDirection, GridCell, SceneAdjacency};

pub const DEFAULT_SCENE_WIDTH: i32 = 10;
pub const DEFAULT_SCENE_HEIGHT: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SceneKind {
    #[default]
    Game,
    Ui,
}

impl SceneKind {
    pub fn from_token(token: &str) -> Self {
        match token {
            "ui" => Self::Ui,
            _ => Self::Game,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Ui => "ui",
        }
    }
}

/// Anything the pathfinder can query for walkable cells.
pub trait Passability {
    fn is_passable(&self, cell: GridCell) -> bool;
}

/// The live scene. Entity order is iteration order for every tick phase.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub id: String,
    pub kind: SceneKind,
    pub width: i32,
    pub height: i32,
    pub background: Option<String>,
    pub adjacency: SceneAdjacency,
    entities: Vec<Entity>,
    player_index: Option<usize>,
}

impl SceneState {
    pub fn new(id: impl Into<String>, kind: SceneKind, width: i32, height: i32) -> Self {
        Self {
            id: id.into(),
            kind,
            width,
            height,
            background: None,
            adjacency: SceneAdjacency::default(),
            entities: Vec::new(),
            player_index: None,
        }
    }

    pub fn with_adjacency(mut self, adjacency: SceneAdjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn is_game(&self) -> bool {
        self.kind == SceneKind::Game
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn entity(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn push_entity(&mut self, entity: Entity) -> usize {
        let index = self.entities.len();
        if entity.is_player() {
            self.player_index = Some(index);
        }
        self.entities.push(entity);
        index
    }

    pub fn player_index(&self) -> Option<usize> {
        self.player_index
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_index.and_then(|index| self.entities.get(index))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player_index.and_then(|index| self.entities.get_mut(index))
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    pub fn is_valid_tile(&self, cell: GridCell) -> bool {
        if !self.is_game() || !self.in_bounds(cell) {
            return false;
        }
        !self
            .entities
            .iter()
            .any(|entity| entity.collision && entity.cell() == cell)
    }

    pub fn obj_index_at(&self, cell: GridCell) -> Option<usize> {
        self.entities.iter().position(|entity| entity.cell() == cell)
    }

    pub fn obj_at(&self, cell: GridCell) -> Option<&Entity> {
        self.obj_index_at(cell).and_then(|index| self.entities.get(index))
    }

    /// Edge the cell lies on. Corners resolve north, south, west, east in that order.
    pub fn border_direction(&self, cell: GridCell) -> Option<BorderDirection> {
        let within_x = cell.x >= 0 && cell.x < self.width;
        let within_y = cell.y >= 0 && cell.y < self.height;
        if cell.y <= 0 && within_x {
            return Some(BorderDirection::North);
        }
        if cell.y >= self.height - 1 && within_x {
            return Some(BorderDirection::South);
        }
        if cell.x <= 0 && within_y {
            return Some(BorderDirection::West);
        }
        if cell.x >= self.width - 1 && within_y {
            return Some(BorderDirection::East);
        }
        None
    }

    /// Border direction plus the scene it leads to, when one is configured.
    pub fn exit_at(&self, cell: GridCell) -> Option<(BorderDirection, &str)> {
        let direction = self.border_direction(cell)?;
        let target = self.adjacency.get(direction)?;
        Some((direction, target))
    }
}

impl Passability for SceneState {
    fn is_passable(&self, cell: GridCell) -> bool {
        self.is_valid_tile(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use crate::sim::grid::GridPos;

    fn scene_with_rock(x: f64, y: f64) -> SceneState {
        let mut scene = SceneState::new("field", SceneKind::Game, 6, 4);
        scene.push_entity(
            Entity::new(EntityKind::Object, GridPos::new(x, y))
                .with_id("rock")
                .with_collision(true),
        );
        scene
    }

    #[test]
    fn colliding_entity_blocks_its_rounded_cell() {
        let scene = scene_with_rock(2.6, 1.2);
        assert!(!scene.is_valid_tile(GridCell::new(3, 1)));
        assert!(scene.is_valid_tile(GridCell::new(2, 1)));
    }

    #[test]
    fn any_colliding_entity_on_a_cell_blocks_it() {
        let mut scene = SceneState::new("field", SceneKind::Game, 6, 4);
        scene.push_entity(Entity::new(EntityKind::Object, GridPos::new(1.0, 1.0)));
        scene.push_entity(
            Entity::new(EntityKind::Object, GridPos::new(1.0, 1.0)).with_collision(true),
        );
        assert!(!scene.is_valid_tile(GridCell::new(1, 1)));
        assert_eq!(scene.obj_index_at(GridCell::new(1, 1)), Some(0));
    }

    #[test]
    fn out_of_bounds_and_ui_scenes_are_never_valid() {
        let scene = SceneState::new("field", SceneKind::Game, 6, 4);
        assert!(!scene.is_valid_tile(GridCell::new(-1, 0)));
        assert!(!scene.is_valid_tile(GridCell::new(6, 0)));
        assert!(!scene.is_valid_tile(GridCell::new(0, 4)));
        let menu = SceneState::new("menu", SceneKind::Ui, 6, 4);
        assert!(!menu.is_valid_tile(GridCell::new(1, 1)));
    }

    #[test]
    fn border_direction_corners_prefer_north_then_south() {
        let scene = SceneState::new("field", SceneKind::Game, 6, 4);
        assert_eq!(scene.border_direction(GridCell::new(0, 0)), Some(BorderDirection::North));
        assert_eq!(scene.border_direction(GridCell::new(5, 3)), Some(BorderDirection::South));
        assert_eq!(scene.border_direction(GridCell::new(0, 2)), Some(BorderDirection::West));
        assert_eq!(scene.border_direction(GridCell::new(5, 2)), Some(BorderDirection::East));
        assert_eq!(scene.border_direction(GridCell::new(2, 2)), None);
        assert_eq!(scene.border_direction(GridCell::new(9, 9)), None);
    }

    #[test]
    fn exit_requires_configured_neighbor() {
        let scene = SceneState::new("field", SceneKind::Game, 6, 4)
            .with_adjacency(SceneAdjacency::default().with(BorderDirection::East, "forest"));
        assert_eq!(
            scene.exit_at(GridCell::new(5, 2)),
            Some((BorderDirection::East, "forest"))
        );
        assert_eq!(scene.exit_at(GridCell::new(0, 2)), None);
    }

    #[test]
    fn player_is_tracked_by_index() {
        let mut scene = scene_with_rock(1.0, 1.0);
        let index = scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(0.0, 0.0)));
        assert_eq!(scene.player_index(), Some(index));
        assert!(scene.player().is_some_and(Entity::is_player));
    }
}
