// tilewright_sim: tile-grid agent simulation library.
//
// This crate holds the agent action and autopilot-navigation engine: the
// object/containment model on a layered tile grid, the primitive actions
// agents perform, the per-agent priority queue of autopilot goals, the
// single-step interpreter that drives those goals, and the A* pathfinder
// underneath it. It has no rendering, input, or I/O beyond loading config.
//
// Module overview:
// - `types.rs`:       TileCoord, TileArea, Facing, Rotation, MoveDirection, Layer, ObjectId.
// - `error.rs`:       ContainmentError, ActionError, ConfigError, IntegrityError.
// - `config.rs`:      SimConfig with nested pathing, poison, and autopilot tunables.
// - `object.rs`:      GameObject, typed capabilities, Location, ObjectTemplate.
// - `grid.rs`:        Dense tile storage with per-layer object lists.
// - `world.rs`:       World: object arena + grid + containment operations and queries.
// - `agent.rs`:       Agent side-table entry (facing, queue, door tracking, poison).
// - `outcome.rs`:     ActionOutcome returned by every primitive action.
// - `history.rs`:     Per-agent action history and its query surface.
// - `action.rs`:      Primitive actions (move, pick up, put, open, eat, use, ...).
// - `pathfinding.rs`: Cost grid + 4-directional A*.
// - `navigation.rs`:  One-step navigation with door policy and adjacency back-off.
// - `autopilot.rs`:   Autopilot goals and the priority-ordered queue.
// - `interpreter.rs`: ActionStatus and the per-goal step function.
// - `command.rs`:     SimCommand / SimAction: user-controlled agent input.
// - `event.rs`:       Narrative SimEvents (feed posts, goal results, poisoning).
// - `sim.rs`:         World::step tick loop and the ObjectTicker hook.
// - `prng`:           Re-exported from `tilewright_prng`: xoshiro256++ PRNG with
//                     SplitMix64 seeding.
//
// **Critical constraint: determinism.** A world is a pure function of its
// seed and the command stream. All randomness comes from the seeded
// `GameRng` stored in the world. No `HashMap` iteration, no system time, no
// OS entropy. Use `BTreeMap` for ordered collections.

pub mod action;
pub mod agent;
pub mod autopilot;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod history;
pub mod interpreter;
pub mod navigation;
pub mod object;
pub mod outcome;
pub mod pathfinding;
pub use tilewright_prng as prng;
pub mod sim;
pub mod types;
pub mod world;
