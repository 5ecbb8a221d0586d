pub mod ai;
pub mod context;
pub mod entity;
pub mod grid;
pub mod motion;
pub mod pathfinding;
pub mod scene;
pub mod transition;

pub use context::{
    MoveOutcome, SceneLoadError, SceneLoader, SceneSetup, Simulation, SimulationConfig,
    TickReport,
};
pub use entity::{
    AnimationClip, AnimationState, Attachment, AttachmentKind, Behavior, Entity, EntityKind,
    EntityVisual, Interaction, MobBrain, MotionState,
};
pub use grid::{
    BorderDirection, Facing, GridCell, GridPos, IsoProjection, SceneAdjacency, ScreenPoint,
};
pub use pathfinding::{find_path, MAX_PATH_EXPANSIONS};
pub use scene::{Passability, SceneKind, SceneState};
pub use transition::{EntryPlacement, EntryResolution, PendingSceneTransition, PendingSpawn};
