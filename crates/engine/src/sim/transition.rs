use tracing::{info, warn};

use super::grid::{BorderDirection, GridCell};
use super::scene::SceneState;

pub const ENTRY_SEARCH_RADIUS: i32 = 4;

/// Armed on the player when a move command targets an edge with a neighbour scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSceneTransition {
    pub target_scene: String,
    pub direction: BorderDirection,
}

/// One-shot token carried from the scene being left into the next scene's setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSpawn {
    pub exited: BorderDirection,
    /// Coordinate along the crossed edge: x for north/south, y for east/west.
    pub along: i32,
}

impl PendingSpawn {
    pub fn from_exit(exited: BorderDirection, exit_cell: GridCell) -> Self {
        let along = if exited.is_horizontal_edge() {
            exit_cell.x
        } else {
            exit_cell.y
        };
        Self { exited, along }
    }

    pub fn entered_edge(self) -> BorderDirection {
        self.exited.opposite()
    }

    /// Cell on the entered edge of a `width` x `height` scene.
    pub fn entry_cell(self, width: i32, height: i32) -> GridCell {
        match self.entered_edge() {
            BorderDirection::North => GridCell::new(self.along, 0),
            BorderDirection::South => GridCell::new(self.along, height - 1),
            BorderDirection::West => GridCell::new(0, self.along),
            BorderDirection::East => GridCell::new(width - 1, self.along),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryResolution {
    Direct,
    Fallback { offset: i32 },
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPlacement {
    pub cell: GridCell,
    pub resolution: EntryResolution,
}

/// Probe order for one ring: two lateral cells along the entered edge, then one inward.
pub fn entry_candidates(entered: BorderDirection, origin: GridCell, offset: i32) -> [GridCell; 3] {
    match entered {
        BorderDirection::North | BorderDirection::South => {
            let inward = if entered == BorderDirection::North {
                offset
            } else {
                -offset
            };
            [
                origin.offset(-offset, 0),
                origin.offset(offset, 0),
                origin.offset(0, inward),
            ]
        }
        BorderDirection::West | BorderDirection::East => {
            let inward = if entered == BorderDirection::West {
                offset
            } else {
                -offset
            };
            [
                origin.offset(0, -offset),
                origin.offset(0, offset),
                origin.offset(inward, 0),
            ]
        }
    }
}

/// Finds where the player enters `scene`. The player must not be in the
/// scene's entity list yet. Falls back to the unchecked edge cell when the
/// ring search finds nothing.
pub fn resolve_entry(scene: &SceneState, spawn: PendingSpawn) -> EntryPlacement {
    let origin = spawn.entry_cell(scene.width, scene.height);
    if scene.is_valid_tile(origin) {
        return EntryPlacement {
            cell: origin,
            resolution: EntryResolution::Direct,
        };
    }

    let entered = spawn.entered_edge();
    for offset in 1..=ENTRY_SEARCH_RADIUS {
        for candidate in entry_candidates(entered, origin, offset) {
            if scene.is_valid_tile(candidate) {
                info!(
                    scene = %scene.id,
                    edge = %entered,
                    blocked = %origin,
                    cell = %candidate,
                    offset,
                    "player_spawn_fallback"
                );
                return EntryPlacement {
                    cell: candidate,
                    resolution: EntryResolution::Fallback { offset },
                };
            }
        }
    }

    warn!(
        scene = %scene.id,
        edge = %entered,
        cell = %origin,
        "player_spawn_unresolved"
    );
    EntryPlacement {
        cell: origin,
        resolution: EntryResolution::Unresolved,
    }
}
