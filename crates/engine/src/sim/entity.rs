use std::collections::VecDeque;

use crate::rules::Condition;

use super::grid::{Facing, GridCell, GridPos};
use super::transition::PendingSceneTransition;

pub const DEFAULT_ENTITY_SPEED: f64 = 0.1;
pub const DEFAULT_PLACEHOLDER_COLOR: &str = "#F0F";
pub const DEFAULT_ANIMATION_FRAME_INTERVAL_MS: f64 = 150.0;
pub const WALK_FRAME_COUNT: u32 = 4;
pub const DEFAULT_DIRECTIONAL_BASE_PATH: &str = "assets/hero";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Mob,
    Object,
}

impl EntityKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Mob => "mob",
            Self::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Passive,
    Aggressive,
}

impl Behavior {
    pub fn from_token(token: &str) -> Self {
        match token {
            "aggressive" => Self::Aggressive,
            _ => Self::Passive,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MobBrain {
    pub behavior: Behavior,
    pub wander_radius: f64,
    pub aggro_radius: f64,
    pub ai_timer_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub action: String,
    pub condition: Option<Condition>,
    pub fail_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Text,
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub content: String,
    pub asset: Option<String>,
    pub color: String,
    pub offset_y: f64,
    pub size_px: f64,
    pub font: String,
    pub background: Option<String>,
}

impl Attachment {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            content: content.into(),
            asset: None,
            color: "#FFF".to_string(),
            offset_y: -50.0,
            size_px: 12.0,
            font: "Arial".to_string(),
            background: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityVisual {
    pub asset: Option<String>,
    pub placeholder: String,
    /// Set when the entity is drawn from per-direction idle/walk frames.
    pub directional_base_path: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Default for EntityVisual {
    fn default() -> Self {
        Self {
            asset: None,
            placeholder: DEFAULT_PLACEHOLDER_COLOR.to_string(),
            directional_base_path: None,
            attachments: Vec::new(),
        }
    }
}

impl EntityVisual {
    pub fn uses_directional_sprites(&self) -> bool {
        self.directional_base_path.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionState {
    pub path: VecDeque<GridCell>,
    pub is_moving: bool,
    /// Fraction of the active segment covered, kept in [0, 1).
    pub progress: f64,
    pub segment_start: GridPos,
    pub segment_target: GridPos,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimationClip {
    #[default]
    Idle,
    Walk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub facing: Facing,
    pub clip: AnimationClip,
    pub frame: u32,
    pub timer_ms: f64,
    pub frame_interval_ms: f64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            facing: Facing::default(),
            clip: AnimationClip::Idle,
            frame: 0,
            timer_ms: 0.0,
            frame_interval_ms: DEFAULT_ANIMATION_FRAME_INTERVAL_MS,
        }
    }
}

impl AnimationState {
    pub fn set_idle(&mut self) {
        self.clip = AnimationClip::Idle;
        self.frame = 0;
    }

    pub fn start_walk(&mut self, facing: Facing) {
        self.facing = facing;
        self.clip = AnimationClip::Walk;
        self.frame = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: Option<String>,
    pub kind: EntityKind,
    pub position: GridPos,
    pub spawn: GridPos,
    pub speed: f64,
    pub collision: bool,
    pub brain: MobBrain,
    pub interaction: Option<Interaction>,
    pub visual: EntityVisual,
    pub motion: MotionState,
    pub animation: AnimationState,
    pub pending_transition: Option<PendingSceneTransition>,
}

impl Entity {
    pub fn new(kind: EntityKind, position: GridPos) -> Self {
        Self {
            id: None,
            kind,
            position,
            spawn: position,
            speed: DEFAULT_ENTITY_SPEED,
            collision: false,
            brain: MobBrain::default(),
            interaction: None,
            visual: EntityVisual::default(),
            motion: MotionState::default(),
            animation: AnimationState::default(),
            pending_transition: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_collision(mut self, collision: bool) -> Self {
        self.collision = collision;
        self
    }

    pub fn cell(&self) -> GridCell {
        self.position.nearest_cell()
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn is_mob(&self) -> bool {
        self.kind == EntityKind::Mob
    }

    /// Replaces the waypoint queue. The next motion step starts a fresh segment.
    pub fn assign_path(&mut self, path: Vec<GridCell>) {
        self.motion.path = path.into();
        self.motion.is_moving = false;
    }

    pub fn is_settled(&self) -> bool {
        self.motion.path.is_empty() && !self.motion.is_moving
    }

    pub fn place_at(&mut self, position: GridPos) {
        self.position = position;
        self.spawn = position;
    }
}
