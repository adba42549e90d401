// Game objects and their capabilities.
//
// Every thing in the world (floor tiles, walls, doors, tables, mushrooms,
// shovels, agents) is a `GameObject` stored in the world's arena and
// addressed by `ObjectId`. What an object can do is described by typed
// capability data in `Capabilities` rather than a free-form attribute bag:
// a door is an object with `openable` + `passage`, a chest is a `container`
// with `openable`, soil is a `container` with `diggable`, and so on. Actions
// are polymorphic over which capabilities are present.
//
// Where an object is lives in `Location`:
// - `Placed`: on a grid tile, in exactly one layer list.
// - `Contained`: in exactly one other object's `contents`.
// - `Part`: permanently attached to an owner (listed in its `parts`).
// - `Detached`: transient, between spawn/remove and the next attach.
// The location is the object's own record of the relation; the matching
// list entry (tile layer, contents, parts) is kept in sync by `world.rs`.
//
// Open-ended numeric/string data consumed by collaborators outside the core
// (scoring, inspection tools) goes in `props`.
//
// `ObjectTemplate` is the construction input for `World::spawn`. Its small
// set of constructors covers the shapes the core itself cares about; richer
// object catalogs belong to whatever factory populates the world.
//
// See also: `world.rs` for the arena and containment operations,
// `action.rs` for how capabilities gate primitive actions.

use crate::types::{Layer, ObjectId, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an object currently is. See the module header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Placed { coord: TileCoord, layer: Layer },
    Contained { parent: ObjectId },
    Part { owner: ObjectId },
    Detached,
}

/// Open/closed state for doors, chests, jars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Openable {
    pub open: bool,
}

/// Marks an openable world feature that blocks movement only while closed.
/// `required_key == 0` means no key is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub required_key: u32,
}

/// An item that unlocks passages with a matching `required_key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub key_id: u32,
    /// A disabled key is still carried but no longer opens anything.
    pub disabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activatable {
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readable {
    pub text: String,
}

/// What a usable tool does to its target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseEffect {
    /// Digs diggable ground open, or fills an already dug hole back in.
    Dig,
    /// Reports the target's value for `property` from its `props`.
    Inspect { property: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usable {
    pub effect: UseEffect,
}

/// Ground that can be dug. A dug hole is an open container; filling it in
/// closes it again, burying whatever was put inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diggable {
    pub dug: bool,
}

/// Typed capability set of an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Can be picked up, dropped, put, and thrown.
    pub movable: bool,
    /// Does not block movement onto its tile.
    pub passable: bool,
    /// Can hold other objects in `contents`.
    pub container: bool,
    pub edible: bool,
    /// Eating this, or anything containing it, poisons the eater.
    pub poisonous: bool,
    pub openable: Option<Openable>,
    pub passage: Option<Passage>,
    pub key: Option<Key>,
    pub activatable: Option<Activatable>,
    pub readable: Option<Readable>,
    pub usable: Option<Usable>,
    pub diggable: Option<Diggable>,
}

/// Open-ended property value for collaborators outside the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(x) => write!(f, "{x}"),
            PropValue::Text(s) => f.write_str(s),
        }
    }
}

/// A game object in the world arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    /// Type tag, e.g. `"mushroom"`, `"door"`. Goals match on this.
    pub kind: String,
    /// Display name used in outcome messages.
    pub name: String,
    pub location: Location,
    /// Objects this one currently owns, in insertion order.
    pub contents: Vec<ObjectId>,
    /// Permanently attached sub-objects.
    pub parts: Vec<ObjectId>,
    pub caps: Capabilities,
    #[serde(default)]
    pub props: BTreeMap<String, PropValue>,
    /// Tick generation in which this object last ran its per-tick update.
    #[serde(default)]
    pub last_ticked: u64,
}

impl GameObject {
    pub fn is_placed(&self) -> bool {
        matches!(self.location, Location::Placed { .. })
    }

    pub fn parent(&self) -> Option<ObjectId> {
        match self.location {
            Location::Contained { parent } => Some(parent),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.caps.openable.is_some_and(|o| o.open)
    }

    /// A passage that is currently closed. Whether it can actually be opened
    /// (key checks) is decided by `open_close`, not here.
    pub fn is_closed_passage(&self) -> bool {
        self.caps.passage.is_some() && self.caps.openable.is_some_and(|o| !o.open)
    }

    /// `true` if this object prevents agents from entering its tile.
    pub fn blocks_movement(&self) -> bool {
        if self.caps.passable {
            return false;
        }
        !(self.caps.passage.is_some() && self.is_open())
    }

    /// `true` if a container's interior can be seen and reached. Dug holes
    /// are open, filled ones are not; lidded containers follow their lid;
    /// plain containers (shelves, tables) are always open.
    pub fn interior_open(&self) -> bool {
        if let Some(d) = self.caps.diggable {
            return d.dug;
        }
        match self.caps.openable {
            Some(o) => o.open,
            None => true,
        }
    }
}

/// Construction input for `World::spawn`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    pub kind: String,
    pub name: String,
    pub caps: Capabilities,
    pub props: BTreeMap<String, PropValue>,
}

impl ObjectTemplate {
    fn base(kind: &str, caps: Capabilities) -> Self {
        Self {
            kind: kind.to_string(),
            name: kind.to_string(),
            caps,
            props: BTreeMap::new(),
        }
    }

    /// A loose item: movable and passable.
    pub fn item(kind: &str) -> Self {
        Self::base(
            kind,
            Capabilities {
                movable: true,
                passable: true,
                ..Capabilities::default()
            },
        )
    }

    /// An immovable obstacle such as a wall or a table.
    pub fn fixture(kind: &str) -> Self {
        Self::base(kind, Capabilities::default())
    }

    /// Walkable ground.
    pub fn floor(kind: &str) -> Self {
        Self::base(
            kind,
            Capabilities {
                passable: true,
                ..Capabilities::default()
            },
        )
    }

    /// A closed door. `required_key == 0` for an unlocked door.
    pub fn door(required_key: u32) -> Self {
        Self::fixture("door")
            .openable(false)
            .with_passage(required_key)
    }

    /// Diggable walkable ground (starts filled in).
    pub fn soil() -> Self {
        let mut t = Self::floor("soil").container();
        t.caps.diggable = Some(Diggable { dug: false });
        t
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn container(mut self) -> Self {
        self.caps.container = true;
        self
    }

    pub fn openable(mut self, open: bool) -> Self {
        self.caps.openable = Some(Openable { open });
        self
    }

    pub fn with_passage(mut self, required_key: u32) -> Self {
        self.caps.passage = Some(Passage { required_key });
        self
    }

    pub fn passable(mut self, passable: bool) -> Self {
        self.caps.passable = passable;
        self
    }

    pub fn edible(mut self) -> Self {
        self.caps.edible = true;
        self
    }

    pub fn poisonous(mut self) -> Self {
        self.caps.poisonous = true;
        self
    }

    pub fn key(mut self, key_id: u32) -> Self {
        self.caps.key = Some(Key {
            key_id,
            disabled: false,
        });
        self
    }

    pub fn activatable(mut self, active: bool) -> Self {
        self.caps.activatable = Some(Activatable { active });
        self
    }

    pub fn readable(mut self, text: &str) -> Self {
        self.caps.readable = Some(Readable {
            text: text.to_string(),
        });
        self
    }

    pub fn usable(mut self, effect: UseEffect) -> Self {
        self.caps.usable = Some(Usable { effect });
        self
    }

    pub fn with_prop(mut self, key: &str, value: PropValue) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }
}
