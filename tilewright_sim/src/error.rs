// Error types for the simulation.
//
// Three families:
// - `ContainmentError`: the spatial/containment model rejected a relocation
//   (bad coordinate, unknown object, containment cycle, ...).
// - `ActionError`: a primitive action failed validation. Its `Display` text is
//   the player-facing message that ends up in the failed `ActionOutcome`;
//   primitive actions never surface it as an `Err` to their callers.
// - `ConfigError`: `SimConfig` could not be loaded or is inconsistent.
//
// `IntegrityError` is reported by `World::verify_ownership()` when the
// single-ownership invariant is broken. It indicates a bug in the sim, not
// a gameplay failure.
//
// See also: `action.rs` which maps `ActionError` into `ActionOutcome`,
// `world.rs` for the containment operations returning `ContainmentError`.

use crate::types::{ObjectId, TileCoord};
use std::fmt;
use thiserror::Error;

/// A relocation the containment model refused to perform. No state changes
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainmentError {
    #[error("no object with id {0}")]
    UnknownObject(ObjectId),
    #[error("{0} is outside the grid")]
    OutOfBounds(TileCoord),
    #[error("object {0} cannot hold other objects")]
    NotAContainer(ObjectId),
    #[error("object {object} cannot be placed inside {container}: it would contain itself")]
    WouldCycle {
        object: ObjectId,
        container: ObjectId,
    },
    #[error("object {0} is a permanent part of another object")]
    IsPart(ObjectId),
    #[error("object {0} is not an agent")]
    NotAnAgent(ObjectId),
}

/// Capability flags a primitive action may require of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Movable,
    Openable,
    Container,
    Activatable,
    Edible,
    Readable,
    Usable,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Movable => "something that can be moved",
            Capability::Openable => "something that can be opened or closed",
            Capability::Container => "a container",
            Capability::Activatable => "something that can be switched on or off",
            Capability::Edible => "edible",
            Capability::Readable => "something that can be read",
            Capability::Usable => "something that can be used",
        };
        f.write_str(s)
    }
}

/// Why a primitive action was refused. Variant order follows the validation
/// order every action applies: existence, capability, reach, then state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("there is no object {0}")]
    UnknownObject(ObjectId),
    #[error("{0} is not an agent")]
    NotAnAgent(ObjectId),
    #[error("{0} is outside the world")]
    OutOfBounds(TileCoord),
    #[error("the way to {coord} is blocked by the {blocker_name}")]
    NotPassable {
        coord: TileCoord,
        blocker: ObjectId,
        blocker_name: String,
    },
    #[error("the {name} is not {capability}")]
    MissingCapability { name: String, capability: Capability },
    #[error("the {name} is too far away")]
    OutOfReach { name: String },
    #[error("the {name} is inside something closed")]
    Inaccessible { name: String },
    #[error("the {name} is attached and cannot be moved on its own")]
    Attached { name: String },
    #[error("you cannot do that to yourself")]
    SelfTarget,
    #[error("you are already holding the {name}")]
    AlreadyHeld { name: String },
    #[error("you are not holding the {name}")]
    NotHeld { name: String },
    #[error("the {name} is already {state}")]
    AlreadyInState { name: String, state: &'static str },
    #[error("the {name} is closed")]
    ContainerClosed { name: String },
    #[error("the {object} cannot go inside the {container}, it would end up inside itself")]
    WouldCycle { object: String, container: String },
    #[error("the {name} is locked and you are not carrying its key")]
    MissingKey { name: String },
    #[error("the {key} no longer works on the {name}")]
    KeyDisabled { name: String, key: String },
    #[error("there is no room in front of you to throw the {name}")]
    NoLandingTile { name: String },
    #[error("there is no free tile next to the {name}")]
    NoRoomNear { name: String },
    #[error("the {name} has no {property} to measure")]
    NoSuchProperty { name: String, property: String },
    #[error("the {tool} does nothing to the {target}")]
    NoEffect { tool: String, target: String },
    #[error(transparent)]
    Containment(#[from] ContainmentError),
}

/// `SimConfig` could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A violation of the single-ownership invariant found by
/// `World::verify_ownership()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("object {object} claims to be at {coord} but appears there {count} times")]
    PlacementMismatch {
        object: ObjectId,
        coord: TileCoord,
        count: usize,
    },
    #[error("object {object} claims parent {parent} but appears in its contents {count} times")]
    ContentsMismatch {
        object: ObjectId,
        parent: ObjectId,
        count: usize,
    },
    #[error("object {object} claims owner {owner} but appears in its parts {count} times")]
    PartMismatch {
        object: ObjectId,
        owner: ObjectId,
        count: usize,
    },
    #[error("object {object} is listed somewhere it does not claim to be")]
    StrayReference { object: ObjectId },
    #[error("object {object} is neither placed nor contained")]
    Unattached { object: ObjectId },
    #[error("tile {coord} references missing object {object}")]
    DanglingTileReference { coord: TileCoord, object: ObjectId },
}
