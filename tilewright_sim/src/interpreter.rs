// Autopilot action interpreter.
//
// `step(action, agent, world)` advances one queued goal by at most one
// primitive action and returns an `ActionStatus` telling the caller what to
// do with the goal:
//
// - `InProgress`: leave it at the head; run it again next tick.
// - `Completed` / `Failed` / `Invalid`: remove it. `Invalid` means the goal
//   could never run (non-agent actor, empty area) and indicates a bug
//   upstream.
// - `Suspended`: leave it in place. The handler has pushed higher-priority
//   sub-actions onto the same queue, so the goal is paused until they drain.
//
// Handlers that act on a target first make sure the agent is in position
// (on the target's tile, or cardinally adjacent and facing it), navigating
// one step per tick until it is. Only then do they issue the primitive.
//
// The area pickup goal is the decomposing one: it finds the next matching
// object it has not tried yet, queues a pickup and a place-in-container
// sub-action (the latter carrying an `IncrementTaken` continuation back to
// the parent), and suspends. When the children are done the parent runs
// again and either finds the next object or completes.
//
// `step` may mutate the action it is given (progress, wander heading,
// remaining steps). The tick loop writes the mutated copy back.
//
// See also: `autopilot.rs` for the goal kinds and queue, `navigation.rs`
// for the movement helper, `sim.rs` for the caller.
//
// **Critical constraint: determinism.** Candidate searches scan tiles in
// row-major order and objects in layer order; wandering draws from the
// world PRNG only.

use crate::autopilot::{AutopilotAction, AutopilotKind, Condition, Continuation};
use crate::event::SimEventKind;
use crate::navigation::{self, NavStatus};
use crate::object::UseEffect;
use crate::types::{Facing, Layer, MoveDirection, ObjectId, TileArea, TileCoord};
use crate::world::{ObjectsAt, World};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Result of one interpreter step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    InProgress,
    Completed,
    Failed,
    Invalid,
    Suspended,
}

impl ActionStatus {
    /// `true` if the goal leaves the queue.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            ActionStatus::Completed | ActionStatus::Failed | ActionStatus::Invalid
        )
    }
}

fn status_of(success: bool) -> ActionStatus {
    if success {
        ActionStatus::Completed
    } else {
        ActionStatus::Failed
    }
}

/// Run one step of `action` for `agent`.
pub fn step(action: &mut AutopilotAction, agent: ObjectId, world: &mut World) -> ActionStatus {
    if !world.is_agent(agent) {
        return ActionStatus::Invalid;
    }
    let priority = action.priority;
    let timestamp = action.timestamp;
    match &mut action.kind {
        AutopilotKind::GoTo {
            target,
            allow_adjacent,
        } => go_to(world, agent, *target, *allow_adjacent),
        AutopilotKind::PickUp { object } => pick_up(world, agent, *object),
        AutopilotKind::PlaceInContainer { object, container } => {
            place_in_container(world, agent, *object, *container)
        }
        AutopilotKind::DropAt { object, target } => drop_at(world, agent, *object, *target),
        AutopilotKind::PickUpObjectsInArea {
            area,
            kinds,
            container,
            progress,
        } => {
            if area.is_empty() {
                return ActionStatus::Invalid;
            }
            if !world.contains(*container) {
                return ActionStatus::Failed;
            }
            if progress.num_taken >= progress.max_to_take {
                return ActionStatus::Completed;
            }
            let attempted: FxHashSet<ObjectId> = progress.attempted.iter().copied().collect();
            let Some(found) = find_in_area(world, *area, kinds, *container, &attempted) else {
                return status_of(progress.num_taken > 0);
            };
            progress.attempted.push(found);
            let sub_priority =
                priority.saturating_add(world.config.autopilot.subtask_priority_boost);
            let pick = AutopilotAction::new(AutopilotKind::PickUp { object: found }, sub_priority);
            let place = AutopilotAction::new(
                AutopilotKind::PlaceInContainer {
                    object: found,
                    container: *container,
                },
                sub_priority,
            )
            .with_continuation(Continuation::IncrementTaken { parent: timestamp });
            if world.enqueue_subtask(agent, pick).is_err()
                || world.enqueue_subtask(agent, place).is_err()
            {
                return ActionStatus::Invalid;
            }
            log::debug!(
                "agent {agent} decomposed area pickup: fetching {found} into {}",
                container
            );
            ActionStatus::Suspended
        }
        AutopilotKind::LocateBlankTile { area } => {
            if area.is_empty() {
                return ActionStatus::Invalid;
            }
            locate_blank_tile(world, agent, *area)
        }
        AutopilotKind::Wander { heading } => wander(world, agent, heading),
        AutopilotKind::Wait => ActionStatus::InProgress,
        AutopilotKind::EatFromInventory { kinds } => eat_from_inventory(world, agent, kinds),
        AutopilotKind::DigInFront => dig_in_front(world, agent),
        AutopilotKind::BuryInFront { object } => bury_in_front(world, agent, *object),
        AutopilotKind::PostFeedUpdate { text } => {
            world.emit(SimEventKind::FeedPost {
                agent,
                text: text.clone(),
            });
            ActionStatus::Completed
        }
        AutopilotKind::MoveRelative {
            direction,
            steps_remaining,
        } => {
            if *steps_remaining == 0 {
                return ActionStatus::Completed;
            }
            if !world.move_direction(agent, *direction).success {
                return ActionStatus::Failed;
            }
            *steps_remaining -= 1;
            if *steps_remaining == 0 {
                ActionStatus::Completed
            } else {
                ActionStatus::InProgress
            }
        }
        AutopilotKind::RotateTo { facing } => {
            if world.agent(agent).is_some_and(|a| a.facing == *facing) {
                return ActionStatus::Completed;
            }
            status_of(world.rotate_to_direction(agent, *facing).success)
        }
        AutopilotKind::CheckCondition { condition } => {
            status_of(check_condition(world, agent, condition))
        }
    }
}

// ---------------------------------------------------------------------------
// Navigation helpers
// ---------------------------------------------------------------------------

fn nav_status(status: NavStatus) -> ActionStatus {
    match status {
        NavStatus::Arrived => ActionStatus::Completed,
        NavStatus::Acted => ActionStatus::InProgress,
        NavStatus::Unreachable => ActionStatus::Failed,
    }
}

/// Get in position to act on `target`. `None` means ready to act; otherwise
/// the status to return this tick.
fn approach(world: &mut World, agent: ObjectId, target: TileCoord) -> Option<ActionStatus> {
    if navigation::is_in_position(world, agent, target) {
        return None;
    }
    match navigation::navigate_toward_goal(world, agent, target, true) {
        NavStatus::Arrived => None,
        other => Some(nav_status(other)),
    }
}

fn go_to(
    world: &mut World,
    agent: ObjectId,
    target: TileCoord,
    allow_adjacent: bool,
) -> ActionStatus {
    nav_status(navigation::navigate_toward_goal(
        world,
        agent,
        target,
        allow_adjacent,
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn is_held_by(world: &World, object: ObjectId, agent: ObjectId) -> bool {
    world.get(object).and_then(|o| o.parent()) == Some(agent)
}

fn pick_up(world: &mut World, agent: ObjectId, object: ObjectId) -> ActionStatus {
    if is_held_by(world, object, agent) {
        return ActionStatus::Completed;
    }
    let Some(pos) = world.world_position(object) else {
        return ActionStatus::Failed;
    };
    if let Some(status) = approach(world, agent, pos) {
        return status;
    }
    status_of(world.pick_up(agent, object).success)
}

fn place_in_container(
    world: &mut World,
    agent: ObjectId,
    object: ObjectId,
    container: ObjectId,
) -> ActionStatus {
    if !world.contains(object) {
        return ActionStatus::Failed;
    }
    if world.get(object).and_then(|o| o.parent()) == Some(container) {
        return ActionStatus::Completed;
    }
    if !is_held_by(world, object, agent) {
        return ActionStatus::Failed;
    }
    let Some(pos) = world.world_position(container) else {
        return ActionStatus::Failed;
    };
    if let Some(status) = approach(world, agent, pos) {
        return status;
    }
    status_of(world.put_into(agent, object, container).success)
}

fn drop_at(
    world: &mut World,
    agent: ObjectId,
    object: ObjectId,
    target: TileCoord,
) -> ActionStatus {
    if !is_held_by(world, object, agent) {
        return ActionStatus::Failed;
    }
    match navigation::navigate_toward_goal(world, agent, target, false) {
        NavStatus::Arrived => status_of(world.drop(agent, object).success),
        other => nav_status(other),
    }
}

/// First object in `area` (row-major, layer order) of a wanted kind that
/// is visible, movable, not yet tried, and not already in `container`.
fn find_in_area(
    world: &World,
    area: TileArea,
    kinds: &[String],
    container: ObjectId,
    attempted: &FxHashSet<ObjectId>,
) -> Option<ObjectId> {
    area.tiles().find_map(|coord| {
        world
            .objects_at(coord, ObjectsAt::visible())
            .into_iter()
            .find(|&id| {
                id != container
                    && !attempted.contains(&id)
                    && !world.is_inside(id, container)
                    && world
                        .get(id)
                        .is_some_and(|o| o.caps.movable && kinds.iter().any(|k| *k == o.kind))
            })
    })
}

/// An in-bounds passable tile with nothing on the furniture, object, or
/// agent layers (ignoring `agent` itself).
fn is_blank(world: &World, agent: ObjectId, coord: TileCoord) -> bool {
    if !world.passable_for(agent, coord).is_passable() {
        return false;
    }
    let Some(tile) = world.grid.tile(coord) else {
        return false;
    };
    [Layer::Furniture, Layer::Object, Layer::Agent]
        .into_iter()
        .all(|layer| tile.layer(layer).iter().all(|&id| id == agent))
}

fn locate_blank_tile(world: &mut World, agent: ObjectId, area: TileArea) -> ActionStatus {
    let Some(pos) = world.world_position(agent) else {
        return ActionStatus::Failed;
    };
    if area.contains(pos) && is_blank(world, agent, pos) {
        return ActionStatus::Completed;
    }
    let mut best: Option<(u32, TileCoord)> = None;
    for coord in area.tiles() {
        if !is_blank(world, agent, coord) {
            continue;
        }
        let d = pos.manhattan_distance(coord);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, coord));
        }
    }
    let Some((_, target)) = best else {
        return ActionStatus::Failed;
    };
    go_to(world, agent, target, false)
}

fn wander(world: &mut World, agent: ObjectId, heading: &mut Option<Facing>) -> ActionStatus {
    let (Some(pos), Some(facing)) = (
        world.world_position(agent),
        world.agent(agent).map(|a| a.facing),
    ) else {
        return ActionStatus::Failed;
    };
    let turn_chance = world.config.autopilot.wander_turn_chance;
    let current = match *heading {
        Some(h) if !world.rng.chance(turn_chance) => h,
        _ => {
            let picked = world.rng.pick(&Facing::ALL).copied().unwrap_or(facing);
            *heading = Some(picked);
            picked
        }
    };
    if facing != current {
        world.rotate_to_direction(agent, current);
        return ActionStatus::InProgress;
    }
    if world.passable_for(agent, pos.step(current)).is_passable() {
        world.move_direction(agent, MoveDirection::Forward);
    } else {
        *heading = None;
    }
    ActionStatus::InProgress
}

fn eat_from_inventory(world: &mut World, agent: ObjectId, kinds: &[String]) -> ActionStatus {
    let food = world.reachable_inventory(agent).into_iter().find(|&id| {
        world.get(id).is_some_and(|o| {
            o.caps.edible && (kinds.is_empty() || kinds.iter().any(|k| *k == o.kind))
        })
    });
    match food {
        Some(item) => status_of(world.eat(agent, item).success),
        None => ActionStatus::Failed,
    }
}

/// A held tool whose use effect digs.
fn find_dig_tool(world: &World, agent: ObjectId) -> Option<ObjectId> {
    world.reachable_inventory(agent).into_iter().find(|&id| {
        world.get(id).is_some_and(|o| {
            o.caps
                .usable
                .as_ref()
                .is_some_and(|u| u.effect == UseEffect::Dig)
        })
    })
}

/// Diggable ground on the tile the agent faces.
fn ground_in_front(world: &World, agent: ObjectId) -> Option<ObjectId> {
    let pos = world.world_position(agent)?;
    let facing = world.agent(agent)?.facing;
    world
        .objects_at(pos.step(facing), ObjectsAt::visible())
        .into_iter()
        .find(|&id| world.get(id).is_some_and(|o| o.caps.diggable.is_some()))
}

fn dig_in_front(world: &mut World, agent: ObjectId) -> ActionStatus {
    let (Some(tool), Some(ground)) = (find_dig_tool(world, agent), ground_in_front(world, agent))
    else {
        return ActionStatus::Failed;
    };
    if world.is_container_open(ground) {
        return ActionStatus::Completed;
    }
    status_of(world.use_on(agent, tool, ground).success)
}

fn bury_in_front(world: &mut World, agent: ObjectId, object: ObjectId) -> ActionStatus {
    let (Some(tool), Some(ground)) = (find_dig_tool(world, agent), ground_in_front(world, agent))
    else {
        return ActionStatus::Failed;
    };
    if !world.contains(object) {
        return ActionStatus::Failed;
    }
    let buried_inside = world.get(object).and_then(|o| o.parent()) == Some(ground);
    let hole_open = world.is_container_open(ground);
    let success = match (hole_open, buried_inside) {
        (false, true) => return ActionStatus::Completed,
        (false, false) => world.use_on(agent, tool, ground).success,
        (true, false) => world.put_into(agent, object, ground).success,
        (true, true) => {
            let filled = world.use_on(agent, tool, ground).success;
            return status_of(filled);
        }
    };
    if success {
        ActionStatus::InProgress
    } else {
        ActionStatus::Failed
    }
}

fn check_condition(world: &World, agent: ObjectId, condition: &Condition) -> bool {
    match condition {
        Condition::ObjectInContainer { object, container } => {
            world.get(*object).and_then(|o| o.parent()) == Some(*container)
        }
        Condition::Holding { kind } => world
            .get(agent)
            .is_some_and(|a| {
                a.contents
                    .iter()
                    .any(|&id| world.get(id).is_some_and(|o| o.kind == *kind))
            }),
        Condition::AgentAt { coord } => world.world_position(agent) == Some(*coord),
        Condition::IsOpen { object, open } => world
            .get(*object)
            .and_then(|o| o.caps.openable)
            .is_some_and(|o| o.open == *open),
        Condition::IsActive { object, active } => world
            .get(*object)
            .and_then(|o| o.caps.activatable)
            .is_some_and(|a| a.active == *active),
    }
}
