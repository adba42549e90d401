// Core types shared across the simulation.
//
// Defines the tile coordinate (`TileCoord`), object identifiers, the four
// cardinal facings, relative movement/rotation directions, the ordered
// placement `Layer`s of a tile, and rectangular `TileArea`s used by area
// goals. All types derive `Serialize`/`Deserialize` so a world snapshot can
// be handed to an external persistence layer.
//
// Coordinate convention: `x` grows east, `y` grows south. `Facing::North`
// is therefore `(0, -1)`.
//
// **Critical constraint: determinism.** Object IDs are sequential integers
// handed out by the `World` in creation order. Never derive IDs from
// addresses, hashes, or wall-clock time.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile position on the grid. May lie outside the grid; bounds are checked
/// by the `Grid`, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: max of |dx| and |dy|. This is the reach metric.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Manhattan distance, used as the A* heuristic.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// The tile one step away in `facing`.
    pub fn step(self, facing: Facing) -> Self {
        let (dx, dy) = facing.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The tile `n` steps away in `facing`.
    pub fn step_n(self, facing: Facing, n: i32) -> Self {
        let (dx, dy) = facing.delta();
        Self::new(self.x + dx * n, self.y + dy * n)
    }

    /// The four cardinal neighbors in N, E, S, W order.
    pub fn cardinal_neighbors(self) -> [TileCoord; 4] {
        Facing::ALL.map(|f| self.step(f))
    }

    /// `true` if `other` is exactly one cardinal step away.
    pub fn is_cardinal_neighbor(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// The facing that points from `self` toward a cardinal neighbor, or
    /// `None` if `other` is not one cardinal step away.
    pub fn facing_toward(self, other: Self) -> Option<Facing> {
        Facing::from_delta(other.x - self.x, other.y - self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle of tiles. `origin` is the north-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileArea {
    pub origin: TileCoord,
    pub width: u32,
    pub height: u32,
}

impl TileArea {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: TileCoord::new(x, y),
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        let dx = coord.x - self.origin.x;
        let dy = coord.y - self.origin.y;
        dx >= 0 && dy >= 0 && (dx as u32) < self.width && (dy as u32) < self.height
    }

    /// Every tile in the area, row-major (same order as the world's grid scan).
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let origin = self.origin;
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |dy| {
            (0..width).map(move |dx| TileCoord::new(origin.x + dx, origin.y + dy))
        })
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// One of the four cardinal directions an agent can face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// Clockwise order starting at north. Also the tie-break order for
    /// neighbor scans.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Facing> {
        match (dx, dy) {
            (0, -1) => Some(Facing::North),
            (1, 0) => Some(Facing::East),
            (0, 1) => Some(Facing::South),
            (-1, 0) => Some(Facing::West),
            _ => None,
        }
    }

    pub fn rotated(self, rotation: Rotation) -> Facing {
        match (self, rotation) {
            (Facing::North, Rotation::Clockwise) => Facing::East,
            (Facing::East, Rotation::Clockwise) => Facing::South,
            (Facing::South, Rotation::Clockwise) => Facing::West,
            (Facing::West, Rotation::Clockwise) => Facing::North,
            (Facing::North, Rotation::CounterClockwise) => Facing::West,
            (Facing::West, Rotation::CounterClockwise) => Facing::South,
            (Facing::South, Rotation::CounterClockwise) => Facing::East,
            (Facing::East, Rotation::CounterClockwise) => Facing::North,
        }
    }

    pub fn opposite(self) -> Facing {
        self.rotated(Rotation::Clockwise).rotated(Rotation::Clockwise)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
        };
        f.write_str(name)
    }
}

/// A quarter turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Movement relative to the agent's current facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// Identifiers and layers
// ---------------------------------------------------------------------------

/// Stable identifier of a game object in the world arena. Agents are game
/// objects too and share this ID space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-tile placement layers, in scan/render order. A layer is a semantic
/// partition of what is on a tile; it says nothing about ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Ground,
    Structure,
    Furniture,
    Object,
    Agent,
}

pub const LAYER_COUNT: usize = 5;

impl Layer {
    pub const ALL: [Layer; LAYER_COUNT] = [
        Layer::Ground,
        Layer::Structure,
        Layer::Furniture,
        Layer::Object,
        Layer::Agent,
    ];

    pub fn index(self) -> usize {
        match self {
            Layer::Ground => 0,
            Layer::Structure => 1,
            Layer::Furniture => 2,
            Layer::Object => 3,
            Layer::Agent => 4,
        }
    }
}
