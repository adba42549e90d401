// World state and the spatial/containment model.
//
// `World` is the single source of truth for the simulation: the object
// arena (`BTreeMap<ObjectId, GameObject>`), the agent side table, the tile
// grid, the config, and the PRNG. Every relocation of an object goes through
// the operations in this file, which enforce the single-ownership rule:
//
//   An object is either placed in exactly one tile-layer list, contained in
//   exactly one parent's `contents`, or attached as a part of exactly one
//   owner. Never two of these, never none (except transiently inside a
//   single call, or between an explicit `remove` and the next attach).
//
// Every relocating operation validates first, then detaches the object from
// its current location, then attaches it to the new one. Validation failures
// return a `ContainmentError` and leave the world untouched.
//
// Containment cycles are refused: an object may not go into itself or into
// anything currently inside it (`is_inside` walks the ancestor chain).
//
// Cells touched by relocations are recorded in a dirty set drained by
// `take_dirty_cells()`, so a renderer can invalidate only what changed.
//
// The tick loop (`sim.rs`), primitive actions (`action.rs`), and the
// interpreter (`interpreter.rs`) add further `impl World` blocks.
//
// See also: `grid.rs` for tile storage, `object.rs` for `GameObject` and
// `Location`, `agent.rs` for per-agent state.
//
// **Critical constraint: determinism.** Arena and agent maps are BTreeMaps,
// IDs are sequential, and all randomness goes through `self.rng`.

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::{ContainmentError, IntegrityError};
use crate::event::{SimEvent, SimEventKind};
use crate::grid::Grid;
use crate::object::{GameObject, Location, ObjectTemplate};
use crate::types::{Facing, Layer, ObjectId, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tilewright_prng::GameRng;

/// How `objects_at` expands container contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentsMode {
    /// Only objects placed directly on the tile.
    #[default]
    None,
    /// Also the contents of containers whose interior is open, recursively.
    /// Agent inventories are not expanded.
    Open,
    /// Also the contents of every container, recursively.
    All,
}

/// Options for `World::objects_at`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectsAt {
    pub contents: ContentsMode,
    pub include_parts: bool,
}

impl ObjectsAt {
    /// What is physically placed on the tile.
    pub fn placed() -> Self {
        Self::default()
    }

    /// What is visible or reachable on the tile.
    pub fn visible() -> Self {
        Self {
            contents: ContentsMode::Open,
            include_parts: true,
        }
    }

    /// Everything on the tile, including closed containers and inventories.
    pub fn everything() -> Self {
        Self {
            contents: ContentsMode::All,
            include_parts: true,
        }
    }
}

/// Result of a passability query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Passability {
    Passable,
    /// The first object (in layer order) that blocks movement.
    Blocked(ObjectId),
    OutOfBounds,
}

impl Passability {
    pub fn is_passable(self) -> bool {
        self == Passability::Passable
    }
}

/// The entire simulated world.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    /// Current tick. Also the tick generation compared against
    /// `GameObject::last_ticked`.
    pub tick: u64,

    /// The world's deterministic PRNG.
    pub rng: GameRng,

    /// Simulation configuration (immutable after construction).
    pub config: SimConfig,

    pub grid: Grid,

    /// Every object, agents included, keyed by ID.
    pub objects: BTreeMap<ObjectId, GameObject>,

    /// Agent-only state, keyed by the agent's object ID.
    pub agents: BTreeMap<ObjectId, Agent>,

    next_id: u32,

    /// Events emitted since the last drain, in emission order.
    #[serde(skip)]
    pending_events: Vec<SimEvent>,

    #[serde(skip)]
    dirty: BTreeSet<TileCoord>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, SimConfig::default())
    }

    pub fn with_config(seed: u64, config: SimConfig) -> Self {
        let (w, h) = config.grid_size;
        Self {
            tick: 0,
            rng: GameRng::new(seed),
            grid: Grid::new(w, h),
            config,
            objects: BTreeMap::new(),
            agents: BTreeMap::new(),
            next_id: 1,
            pending_events: Vec::new(),
            dirty: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn agent(&self, id: ObjectId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: ObjectId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn is_agent(&self, id: ObjectId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Display name of an object, or its ID if it no longer exists.
    pub fn name_of(&self, id: ObjectId) -> String {
        self.objects
            .get(&id)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn is_within_bounds(&self, coord: TileCoord) -> bool {
        self.grid.in_bounds(coord)
    }

    // -----------------------------------------------------------------------
    // Creation and deletion
    // -----------------------------------------------------------------------

    /// Create a detached object from a template.
    pub fn spawn(&mut self, template: ObjectTemplate) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            GameObject {
                id,
                kind: template.kind,
                name: template.name,
                location: Location::Detached,
                contents: Vec::new(),
                parts: Vec::new(),
                caps: template.caps,
                props: template.props,
                last_ticked: self.tick,
            },
        );
        id
    }

    /// Create an object and place it on the grid. Bounds are checked before
    /// the object is created, so a refused spawn allocates nothing.
    pub fn spawn_at(
        &mut self,
        template: ObjectTemplate,
        coord: TileCoord,
        layer: Layer,
    ) -> Result<ObjectId, ContainmentError> {
        if !self.grid.in_bounds(coord) {
            return Err(ContainmentError::OutOfBounds(coord));
        }
        let id = self.spawn(template);
        self.place(id, coord, layer)?;
        Ok(id)
    }

    /// Create an object directly inside a container.
    pub fn spawn_in(
        &mut self,
        template: ObjectTemplate,
        container: ObjectId,
    ) -> Result<ObjectId, ContainmentError> {
        let holder = self
            .objects
            .get(&container)
            .ok_or(ContainmentError::UnknownObject(container))?;
        if !holder.caps.container {
            return Err(ContainmentError::NotAContainer(container));
        }
        let id = self.spawn(template);
        self.move_into_container(id, container)?;
        Ok(id)
    }

    /// Create an object and attach it as a permanent part of `owner`.
    pub fn spawn_part(
        &mut self,
        template: ObjectTemplate,
        owner: ObjectId,
    ) -> Result<ObjectId, ContainmentError> {
        if !self.objects.contains_key(&owner) {
            return Err(ContainmentError::UnknownObject(owner));
        }
        let id = self.spawn(template);
        self.attach_part(owner, id)?;
        Ok(id)
    }

    /// Create an agent standing at `coord`, in the Agent layer.
    pub fn spawn_agent(
        &mut self,
        name: &str,
        coord: TileCoord,
        facing: Facing,
    ) -> Result<ObjectId, ContainmentError> {
        let template = ObjectTemplate::fixture("agent").named(name).container();
        let id = self.spawn_at(template, coord, Layer::Agent)?;
        self.agents.insert(id, Agent::new(id, facing));
        log::info!("spawned agent {id} '{name}' at {coord} facing {facing}");
        Ok(id)
    }

    /// Remove an object, its parts, and everything inside it from the world.
    pub fn delete(&mut self, id: ObjectId) -> Result<(), ContainmentError> {
        if !self.objects.contains_key(&id) {
            return Err(ContainmentError::UnknownObject(id));
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(obj) = self.objects.remove(&next) {
                stack.extend(obj.contents.iter().copied());
                stack.extend(obj.parts.iter().copied());
            }
            self.agents.remove(&next);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Relocation
    // -----------------------------------------------------------------------

    /// Place an object on a tile layer, detaching it from wherever it was.
    pub fn place(
        &mut self,
        id: ObjectId,
        coord: TileCoord,
        layer: Layer,
    ) -> Result<(), ContainmentError> {
        let obj = self
            .objects
            .get(&id)
            .ok_or(ContainmentError::UnknownObject(id))?;
        if matches!(obj.location, Location::Part { .. }) {
            return Err(ContainmentError::IsPart(id));
        }
        if !self.grid.in_bounds(coord) {
            return Err(ContainmentError::OutOfBounds(coord));
        }
        self.detach(id);
        if let Some(tile) = self.grid.tile_mut(coord) {
            tile.push(layer, id);
        }
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.location = Location::Placed { coord, layer };
        }
        self.dirty.insert(coord);
        Ok(())
    }

    /// Detach an object from the grid or its container, leaving it
    /// `Detached`. Must be followed by a new attach or a `delete`.
    pub fn remove(&mut self, id: ObjectId) -> Result<(), ContainmentError> {
        let obj = self
            .objects
            .get(&id)
            .ok_or(ContainmentError::UnknownObject(id))?;
        if matches!(obj.location, Location::Part { .. }) {
            return Err(ContainmentError::IsPart(id));
        }
        self.detach(id);
        Ok(())
    }

    /// Move an object into a container's contents, detaching it first.
    pub fn move_into_container(
        &mut self,
        id: ObjectId,
        container: ObjectId,
    ) -> Result<(), ContainmentError> {
        let obj = self
            .objects
            .get(&id)
            .ok_or(ContainmentError::UnknownObject(id))?;
        if matches!(obj.location, Location::Part { .. }) {
            return Err(ContainmentError::IsPart(id));
        }
        let holder = self
            .objects
            .get(&container)
            .ok_or(ContainmentError::UnknownObject(container))?;
        if !holder.caps.container {
            return Err(ContainmentError::NotAContainer(container));
        }
        if container == id || self.is_inside(container, id) {
            return Err(ContainmentError::WouldCycle {
                object: id,
                container,
            });
        }
        self.detach(id);
        if let Some(holder) = self.objects.get_mut(&container) {
            holder.contents.push(id);
        }
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.location = Location::Contained { parent: container };
        }
        self.mark_dirty_at(container);
        Ok(())
    }

    /// Permanently attach `part` to `owner`.
    pub fn attach_part(&mut self, owner: ObjectId, part: ObjectId) -> Result<(), ContainmentError> {
        if !self.objects.contains_key(&part) {
            return Err(ContainmentError::UnknownObject(part));
        }
        if !self.objects.contains_key(&owner) {
            return Err(ContainmentError::UnknownObject(owner));
        }
        if owner == part || self.is_inside(owner, part) {
            return Err(ContainmentError::WouldCycle {
                object: part,
                container: owner,
            });
        }
        self.detach(part);
        if let Some(o) = self.objects.get_mut(&owner) {
            o.parts.push(part);
        }
        if let Some(p) = self.objects.get_mut(&part) {
            p.location = Location::Part { owner };
        }
        self.mark_dirty_at(owner);
        Ok(())
    }

    /// Unlink `id` from its current location list. Idempotent.
    fn detach(&mut self, id: ObjectId) {
        let Some(location) = self.objects.get(&id).map(|o| o.location) else {
            return;
        };
        match location {
            Location::Placed { coord, layer } => {
                if let Some(tile) = self.grid.tile_mut(coord) {
                    tile.remove(layer, id);
                }
                self.dirty.insert(coord);
            }
            Location::Contained { parent } => {
                if let Some(p) = self.objects.get_mut(&parent) {
                    p.contents.retain(|&c| c != id);
                }
                self.mark_dirty_at(parent);
            }
            Location::Part { owner } => {
                if let Some(o) = self.objects.get_mut(&owner) {
                    o.parts.retain(|&c| c != id);
                }
                self.mark_dirty_at(owner);
            }
            Location::Detached => {}
        }
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.location = Location::Detached;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The object directly holding `id` (its container or part owner).
    pub fn holder_of(&self, id: ObjectId) -> Option<ObjectId> {
        match self.objects.get(&id)?.location {
            Location::Contained { parent } => Some(parent),
            Location::Part { owner } => Some(owner),
            _ => None,
        }
    }

    /// `true` if `id` is transitively inside (or a part of) `ancestor`.
    pub fn is_inside(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = self.holder_of(id);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.holder_of(h);
        }
        false
    }

    /// The outermost holder of `id` (itself if not held).
    pub fn root_of(&self, id: ObjectId) -> ObjectId {
        let mut current = id;
        while let Some(h) = self.holder_of(current) {
            current = h;
        }
        current
    }

    /// Grid position of the object's outermost ancestor, or `None` if that
    /// ancestor is not placed.
    pub fn world_position(&self, id: ObjectId) -> Option<TileCoord> {
        match self.objects.get(&self.root_of(id))?.location {
            Location::Placed { coord, .. } => Some(coord),
            _ => None,
        }
    }

    /// `true` if the container's interior is visible and reachable.
    pub fn is_container_open(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.interior_open())
    }

    /// Objects at a tile, in layer order, optionally expanded with parts and
    /// container contents (depth-first). Out-of-bounds tiles yield nothing.
    pub fn objects_at(&self, coord: TileCoord, opts: ObjectsAt) -> Vec<ObjectId> {
        let mut out = Vec::new();
        if let Some(tile) = self.grid.tile(coord) {
            for id in tile.iter() {
                self.collect_object(id, opts, &mut out);
            }
        }
        out
    }

    fn collect_object(&self, id: ObjectId, opts: ObjectsAt, out: &mut Vec<ObjectId>) {
        let Some(obj) = self.objects.get(&id) else {
            return;
        };
        out.push(id);
        if opts.include_parts {
            for &p in &obj.parts {
                self.collect_object(p, opts, out);
            }
        }
        let expand = match opts.contents {
            ContentsMode::None => false,
            ContentsMode::Open => {
                obj.caps.container && obj.interior_open() && !self.is_agent(id)
            }
            ContentsMode::All => true,
        };
        if expand {
            for &c in &obj.contents {
                self.collect_object(c, opts, out);
            }
        }
    }

    /// Whether an agent could step onto `coord`.
    pub fn is_passable(&self, coord: TileCoord) -> Passability {
        let Some(tile) = self.grid.tile(coord) else {
            return Passability::OutOfBounds;
        };
        for id in tile.iter() {
            if self.objects.get(&id).is_some_and(|o| o.blocks_movement()) {
                return Passability::Blocked(id);
            }
        }
        Passability::Passable
    }

    /// The agent standing on `coord`, if any.
    pub fn agent_at(&self, coord: TileCoord) -> Option<ObjectId> {
        let tile = self.grid.tile(coord)?;
        tile.layer(Layer::Agent)
            .iter()
            .copied()
            .find(|id| self.is_agent(*id))
    }

    // -----------------------------------------------------------------------
    // Integrity, dirty cells, events
    // -----------------------------------------------------------------------

    /// Check the single-ownership invariant across the arena and the grid.
    pub fn verify_ownership(&self) -> Result<(), IntegrityError> {
        for (coord, tile) in self.grid.iter() {
            for layer in Layer::ALL {
                for &id in tile.layer(layer) {
                    let Some(obj) = self.objects.get(&id) else {
                        return Err(IntegrityError::DanglingTileReference { coord, object: id });
                    };
                    if obj.location != (Location::Placed { coord, layer }) {
                        return Err(IntegrityError::StrayReference { object: id });
                    }
                }
            }
        }

        for (&id, obj) in &self.objects {
            match obj.location {
                Location::Placed { coord, layer } => {
                    let count = self
                        .grid
                        .tile(coord)
                        .map_or(0, |t| t.layer(layer).iter().filter(|&&o| o == id).count());
                    if count != 1 {
                        return Err(IntegrityError::PlacementMismatch {
                            object: id,
                            coord,
                            count,
                        });
                    }
                }
                Location::Contained { parent } => {
                    let count = self
                        .objects
                        .get(&parent)
                        .map_or(0, |p| p.contents.iter().filter(|&&o| o == id).count());
                    if count != 1 {
                        return Err(IntegrityError::ContentsMismatch {
                            object: id,
                            parent,
                            count,
                        });
                    }
                }
                Location::Part { owner } => {
                    let count = self
                        .objects
                        .get(&owner)
                        .map_or(0, |o| o.parts.iter().filter(|&&p| p == id).count());
                    if count != 1 {
                        return Err(IntegrityError::PartMismatch {
                            object: id,
                            owner,
                            count,
                        });
                    }
                }
                Location::Detached => {
                    return Err(IntegrityError::Unattached { object: id });
                }
            }
            for &child in &obj.contents {
                let ok = self
                    .objects
                    .get(&child)
                    .is_some_and(|c| c.location == Location::Contained { parent: id });
                if !ok {
                    return Err(IntegrityError::StrayReference { object: child });
                }
            }
            for &part in &obj.parts {
                let ok = self
                    .objects
                    .get(&part)
                    .is_some_and(|p| p.location == Location::Part { owner: id });
                if !ok {
                    return Err(IntegrityError::StrayReference { object: part });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn mark_dirty_at(&mut self, id: ObjectId) {
        if let Some(coord) = self.world_position(id) {
            self.dirty.insert(coord);
        }
    }

    /// Drain the set of cells touched since the last call, row-major.
    pub fn take_dirty_cells(&mut self) -> Vec<TileCoord> {
        let mut cells: Vec<_> = std::mem::take(&mut self.dirty).into_iter().collect();
        cells.sort_by_key(|c| (c.y, c.x));
        cells
    }

    pub(crate) fn emit(&mut self, kind: SimEventKind) {
        self.pending_events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    pub(crate) fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> World {
        let config = SimConfig {
            grid_size: (6, 6),
            ..SimConfig::default()
        };
        World::with_config(7, config)
    }

    #[test]
    fn place_out_of_bounds_is_refused_without_change() {
        let mut world = small_world();
        let rock = world.spawn(ObjectTemplate::item("rock"));
        let err = world
            .place(rock, TileCoord::new(6, 0), Layer::Object)
            .unwrap_err();
        assert_eq!(err, ContainmentError::OutOfBounds(TileCoord::new(6, 0)));
        assert_eq!(world.get(rock).unwrap().location, Location::Detached);
    }

    #[test]
    fn move_detaches_before_attach() {
        let mut world = small_world();
        let c = TileCoord::new(2, 2);
        let rock = world
            .spawn_at(ObjectTemplate::item("rock"), c, Layer::Object)
            .unwrap();
        let chest = world
            .spawn_at(
                ObjectTemplate::fixture("chest").container(),
                TileCoord::new(3, 2),
                Layer::Furniture,
            )
            .unwrap();
        world.move_into_container(rock, chest).unwrap();
        assert!(world.objects_at(c, ObjectsAt::placed()).is_empty());
        assert_eq!(world.get(chest).unwrap().contents, vec![rock]);
        world.verify_ownership().unwrap();

        // Moving back onto the grid removes it from the chest.
        world.place(rock, c, Layer::Object).unwrap();
        assert!(world.get(chest).unwrap().contents.is_empty());
        assert_eq!(world.objects_at(c, ObjectsAt::placed()), vec![rock]);
        world.verify_ownership().unwrap();
    }

    #[test]
    fn containment_cycles_are_refused() {
        let mut world = small_world();
        let c = TileCoord::new(1, 1);
        let bag = world
            .spawn_at(ObjectTemplate::item("bag").container(), c, Layer::Object)
            .unwrap();
        let pouch = world
            .spawn_in(ObjectTemplate::item("pouch").container(), bag)
            .unwrap();
        assert!(matches!(
            world.move_into_container(bag, bag),
            Err(ContainmentError::WouldCycle { .. })
        ));
        assert!(matches!(
            world.move_into_container(bag, pouch),
            Err(ContainmentError::WouldCycle { .. })
        ));
        assert_eq!(world.holder_of(pouch), Some(bag));
        world.verify_ownership().unwrap();
    }

    #[test]
    fn objects_at_expands_only_open_containers() {
        let mut world = small_world();
        let c = TileCoord::new(2, 3);
        let shelf = world
            .spawn_at(ObjectTemplate::fixture("shelf").container(), c, Layer::Furniture)
            .unwrap();
        let chest = world
            .spawn_at(
                ObjectTemplate::fixture("chest").container().openable(false),
                c,
                Layer::Furniture,
            )
            .unwrap();
        let cup = world.spawn_in(ObjectTemplate::item("cup"), shelf).unwrap();
        let coin = world.spawn_in(ObjectTemplate::item("coin"), chest).unwrap();

        let visible = world.objects_at(c, ObjectsAt::visible());
        assert_eq!(visible, vec![shelf, cup, chest]);
        let all = world.objects_at(c, ObjectsAt::everything());
        assert_eq!(all, vec![shelf, cup, chest, coin]);
    }

    #[test]
    fn agent_inventory_hidden_unless_all() {
        let mut world = small_world();
        let c = TileCoord::new(0, 0);
        let agent = world.spawn_agent("Ada", c, Facing::East).unwrap();
        let apple = world.spawn_in(ObjectTemplate::item("apple"), agent).unwrap();
        assert_eq!(world.objects_at(c, ObjectsAt::visible()), vec![agent]);
        assert_eq!(world.objects_at(c, ObjectsAt::everything()), vec![agent, apple]);
    }

    #[test]
    fn passability_reports_blocker() {
        let mut world = small_world();
        let c = TileCoord::new(4, 4);
        world
            .spawn_at(ObjectTemplate::floor("grass"), c, Layer::Ground)
            .unwrap();
        assert_eq!(world.is_passable(c), Passability::Passable);
        let door = world
            .spawn_at(ObjectTemplate::door(0), c, Layer::Structure)
            .unwrap();
        assert_eq!(world.is_passable(c), Passability::Blocked(door));
        world.get_mut(door).unwrap().caps.openable = Some(crate::object::Openable { open: true });
        assert_eq!(world.is_passable(c), Passability::Passable);
        assert_eq!(
            world.is_passable(TileCoord::new(-1, 0)),
            Passability::OutOfBounds
        );
    }

    #[test]
    fn world_position_follows_outermost_holder() {
        let mut world = small_world();
        let c = TileCoord::new(5, 1);
        let agent = world.spawn_agent("Bo", c, Facing::North).unwrap();
        let bag = world
            .spawn_in(ObjectTemplate::item("bag").container(), agent)
            .unwrap();
        let gem = world.spawn_in(ObjectTemplate::item("gem"), bag).unwrap();
        assert_eq!(world.world_position(gem), Some(c));
        assert_eq!(world.root_of(gem), agent);
    }

    #[test]
    fn delete_removes_contents_and_parts() {
        let mut world = small_world();
        let c = TileCoord::new(1, 4);
        let wall = world
            .spawn_at(ObjectTemplate::fixture("wall"), c, Layer::Structure)
            .unwrap();
        let door = world.spawn(ObjectTemplate::door(0));
        world.attach_part(wall, door).unwrap();
        let box_ = world
            .spawn_at(ObjectTemplate::item("box").container(), c, Layer::Object)
            .unwrap();
        let nail = world.spawn_in(ObjectTemplate::item("nail"), box_).unwrap();

        world.delete(wall).unwrap();
        world.delete(box_).unwrap();
        assert!(!world.contains(door));
        assert!(!world.contains(nail));
        assert!(world.objects_at(c, ObjectsAt::everything()).is_empty());
        world.verify_ownership().unwrap();
    }

    #[test]
    fn parts_cannot_be_placed_directly() {
        let mut world = small_world();
        let c = TileCoord::new(2, 0);
        let wall = world
            .spawn_at(ObjectTemplate::fixture("wall"), c, Layer::Structure)
            .unwrap();
        let door = world.spawn(ObjectTemplate::door(0));
        world.attach_part(wall, door).unwrap();
        assert_eq!(
            world.place(door, TileCoord::new(0, 0), Layer::Structure),
            Err(ContainmentError::IsPart(door))
        );
        assert_eq!(world.objects_at(c, ObjectsAt::visible()), vec![wall, door]);
    }

    #[test]
    fn spawned_part_travels_with_its_owner() {
        let mut world = small_world();
        let agent = world
            .spawn_agent("Ada", TileCoord::new(0, 0), Facing::East)
            .unwrap();
        let cart = world
            .spawn_at(
                ObjectTemplate::item("cart").container(),
                TileCoord::new(1, 0),
                Layer::Object,
            )
            .unwrap();
        let handle = world
            .spawn_part(ObjectTemplate::item("handle"), cart)
            .unwrap();
        assert_eq!(world.get(handle).unwrap().location, Location::Part { owner: cart });
        assert_eq!(world.get(cart).unwrap().parts, vec![handle]);
        assert_eq!(world.world_position(handle), Some(TileCoord::new(1, 0)));
        world.verify_ownership().unwrap();

        let out = world.pick_up(agent, handle);
        assert!(!out.success);
        assert_eq!(world.holder_of(handle), Some(cart));

        world
            .place(cart, TileCoord::new(4, 3), Layer::Object)
            .unwrap();
        assert_eq!(world.world_position(handle), Some(TileCoord::new(4, 3)));
        world.verify_ownership().unwrap();

        assert_eq!(
            world.spawn_part(ObjectTemplate::item("wheel"), ObjectId(999)),
            Err(ContainmentError::UnknownObject(ObjectId(999)))
        );
    }

    #[test]
    fn verify_flags_unattached_objects() {
        let mut world = small_world();
        let rock = world.spawn(ObjectTemplate::item("rock"));
        assert_eq!(
            world.verify_ownership(),
            Err(IntegrityError::Unattached { object: rock })
        );
    }

    #[test]
    fn dirty_cells_are_drained() {
        let mut world = small_world();
        let rock = world
            .spawn_at(ObjectTemplate::item("rock"), TileCoord::new(3, 1), Layer::Object)
            .unwrap();
        world.place(rock, TileCoord::new(1, 1), Layer::Object).unwrap();
        assert_eq!(
            world.take_dirty_cells(),
            vec![TileCoord::new(1, 1), TileCoord::new(3, 1)]
        );
        assert!(world.take_dirty_cells().is_empty());
    }

    #[test]
    fn world_survives_json() {
        let mut world = small_world();
        let agent = world
            .spawn_agent("Cy", TileCoord::new(2, 2), Facing::South)
            .unwrap();
        world.spawn_in(ObjectTemplate::item("pebble"), agent).unwrap();
        let json = world.to_json().unwrap();
        let restored = World::from_json(&json).unwrap();
        assert_eq!(restored.objects.len(), world.objects.len());
        assert_eq!(restored.agent(agent).unwrap().facing, Facing::South);
        restored.verify_ownership().unwrap();
    }
}
