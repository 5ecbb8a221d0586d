use std::fmt;

pub const DEFAULT_TILE_WIDTH_PX: f64 = 64.0;
pub const DEFAULT_TILE_HEIGHT_PX: f64 = 32.0;
pub const DEFAULT_ORIGIN_OFFSET_Y_PX: f64 = 100.0;

const COMPASS_SECTOR_DEGREES: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn manhattan_distance(self, other: GridCell) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    pub fn to_pos(self) -> GridPos {
        GridPos {
            x: self.x as f64,
            y: self.y as f64,
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous grid coordinates. Fractional while an entity is between cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridPos {
    pub x: f64,
    pub y: f64,
}

impl GridPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest cell, rounding halves towards positive infinity.
    pub fn nearest_cell(self) -> GridCell {
        GridCell {
            x: round_half_up(self.x),
            y: round_half_up(self.y),
        }
    }

    pub fn distance(self, other: GridPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(self, target: GridPos, t: f64) -> GridPos {
        GridPos {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Grid-to-screen transform. `offset` is the screen position of cell (0, 0)'s top vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjection {
    pub tile_width: f64,
    pub tile_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH_PX,
            tile_height: DEFAULT_TILE_HEIGHT_PX,
            offset_x: 0.0,
            offset_y: DEFAULT_ORIGIN_OFFSET_Y_PX,
        }
    }
}

impl IsoProjection {
    pub fn new(tile_width: f64, tile_height: f64) -> Self {
        Self {
            tile_width,
            tile_height,
            ..Self::default()
        }
    }

    pub fn half_tile_width(&self) -> f64 {
        self.tile_width / 2.0
    }

    pub fn half_tile_height(&self) -> f64 {
        self.tile_height / 2.0
    }

    /// Centers the map horizontally in a viewport of the given width.
    pub fn fit_viewport_width(&mut self, viewport_width: u32) {
        self.offset_x = viewport_width as f64 / 2.0;
    }

    pub fn iso_to_screen(&self, pos: GridPos) -> ScreenPoint {
        ScreenPoint {
            x: (pos.x - pos.y) * self.half_tile_width() + self.offset_x,
            y: (pos.x + pos.y) * self.half_tile_height() + self.offset_y,
        }
    }

    pub fn screen_to_iso(&self, point: ScreenPoint) -> GridPos {
        let adj_x = (point.x - self.offset_x) / self.half_tile_width();
        let adj_y = (point.y - self.offset_y) / self.half_tile_height();
        GridPos {
            x: (adj_y + adj_x) / 2.0,
            y: (adj_y - adj_x) / 2.0,
        }
    }

    pub fn screen_to_cell(&self, point: ScreenPoint) -> GridCell {
        self.screen_to_iso(point).nearest_cell()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderDirection {
    North,
    South,
    East,
    West,
}

impl BorderDirection {
    pub const ALL: [BorderDirection; 4] = [
        BorderDirection::North,
        BorderDirection::South,
        BorderDirection::East,
        BorderDirection::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    /// True for edges that run along the x axis (y fixed).
    pub fn is_horizontal_edge(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::East => 2,
            Self::West => 3,
        }
    }
}

impl fmt::Display for BorderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Scene ids reachable through each border.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneAdjacency {
    targets: [Option<String>; 4],
}

impl SceneAdjacency {
    pub fn with(mut self, direction: BorderDirection, scene_id: impl Into<String>) -> Self {
        self.set(direction, Some(scene_id.into()));
        self
    }

    pub fn set(&mut self, direction: BorderDirection, scene_id: Option<String>) {
        self.targets[direction.index()] = scene_id;
    }

    pub fn get(&self, direction: BorderDirection) -> Option<&str> {
        self.targets[direction.index()].as_deref()
    }
}

/// Eight-way facing, screen-space compass on the grid axes (+x east, +y south).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    East,
    SouthEast,
    #[default]
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Facing {
    const BY_SECTOR: [Facing; 8] = [
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
        Facing::North,
        Facing::NorthEast,
    ];

    pub const ALL: [Facing; 8] = Self::BY_SECTOR;

    pub fn from_movement(from: GridPos, to: GridPos) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let mut degrees = dy.atan2(dx).to_degrees();
        if degrees < 0.0 {
            degrees += 360.0;
        }
        let sector = round_half_up(degrees / COMPASS_SECTOR_DEGREES).rem_euclid(8) as usize;
        Self::BY_SECTOR[sector]
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::East => "east",
            Self::SouthEast => "south-east",
            Self::South => "south",
            Self::SouthWest => "south-west",
            Self::West => "west",
            Self::NorthWest => "north-west",
            Self::North => "north",
            Self::NorthEast => "north-east",
        }
    }
}
