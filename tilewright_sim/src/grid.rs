// Dense 2D tile grid for the game world.
//
// The grid is stored as a flat `Vec<Tile>` indexed by `x + y * width`,
// giving O(1) access. Each `Tile` holds one ordered list of object IDs per
// `Layer`. Out-of-bounds reads return `None`; out-of-bounds writes are
// rejected by the caller (`World::place`) before reaching the grid.
//
// The grid only records *placement*. Which object owns what is tracked by
// each `GameObject::location` in the world arena; `world.rs` keeps the two
// in sync.
//
// See also: `world.rs` which owns the `Grid` and performs all placement
// mutations, `pathfinding.rs` which scans the grid to build its cost grid.
//
// **Critical constraint: determinism.** Layer lists preserve insertion
// order and the scan order is row-major, so every traversal of the grid is
// reproducible.

use crate::types::{LAYER_COUNT, Layer, ObjectId, TileCoord};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Per-layer object list. Most tiles hold zero to two objects per layer.
pub type LayerList = SmallVec<[ObjectId; 2]>;

/// One grid cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    layers: [LayerList; LAYER_COUNT],
}

impl Tile {
    pub fn layer(&self, layer: Layer) -> &[ObjectId] {
        &self.layers[layer.index()]
    }

    pub(crate) fn push(&mut self, layer: Layer, id: ObjectId) {
        self.layers[layer.index()].push(id);
    }

    /// Remove `id` from `layer`. Returns `true` if it was present.
    pub(crate) fn remove(&mut self, layer: Layer, id: ObjectId) -> bool {
        let list = &mut self.layers[layer.index()];
        match list.iter().position(|&o| o == id) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Every object on the tile, in layer order then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.layers.iter().flat_map(|l| l.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.is_empty())
    }
}

/// Dense 2D tile grid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Grid {
    /// Flat storage: index = x + y * width.
    tiles: Vec<Tile>,
    pub width: u32,
    pub height: u32,
}

impl Grid {
    /// Create an empty grid.
    pub fn new(width: u32, height: u32) -> Self {
        let total = (width as usize) * (height as usize);
        Self {
            tiles: vec![Tile::default(); total],
            width,
            height,
        }
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    /// Convert a coordinate to a flat index. Returns `None` if out of bounds.
    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.x as usize + coord.y as usize * self.width as usize)
        } else {
            None
        }
    }

    /// Inverse of `index`.
    pub fn coord_of(&self, index: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((index % w) as i32, (index / w) as i32)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    pub(crate) fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).map(move |i| &mut self.tiles[i])
    }

    /// All tiles with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (self.coord_of(i), t))
    }
}
