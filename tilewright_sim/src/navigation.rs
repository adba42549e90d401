// Single-step navigation toward a goal tile.
//
// `navigate_toward_goal` performs at most one primitive action per call and
// reports whether the agent has arrived, acted, or cannot get there. The
// decision order each tick is:
//
//   1. Door policy. If the agent opened a door while navigating and has
//      since taken exactly `door_close_after_steps` forward steps, it closes
//      that door this tick instead of advancing. A pending door that was
//      already passed further is forgotten.
//   2. Arrival: on the destination, or (with `allow_adjacent`) cardinally
//      adjacent to it and facing it. Adjacent but facing elsewhere costs one
//      rotation.
//   3. Pathfind. With `allow_adjacent`, when the destination itself is
//      unreachable, each cardinal neighbor of it is tried and the shortest
//      path wins (N, E, S, W tie order).
//   4. Not facing the next step: rotate once.
//   5. Next tile holds a closed passage: open it and remember it as the door
//      to close.
//   6. Otherwise step forward. A step blocked by another agent counts as
//      waiting, not failure, for up to `max_blocked_wait_ticks` ticks in a
//      row; after that the goal is unreachable.
//
// See also: `pathfinding.rs` for the A* search, `interpreter.rs` whose
// handlers call this before issuing their own primitive action, `agent.rs`
// for the door fields.

use crate::pathfinding::{self, NextStep};
use crate::types::{MoveDirection, ObjectId, TileCoord};
use crate::world::{ObjectsAt, World};

/// What one navigation call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavStatus {
    /// In position. No action was taken this call.
    Arrived,
    /// One primitive action was taken (or the agent is waiting its turn).
    Acted,
    /// No path exists, or a door on the path could not be opened.
    Unreachable,
}

/// `true` if the agent stands on `target`, or is cardinally adjacent to it
/// and facing it.
pub fn is_in_position(world: &World, agent: ObjectId, target: TileCoord) -> bool {
    let (Some(pos), Some(a)) = (world.world_position(agent), world.agent(agent)) else {
        return false;
    };
    pos == target || pos.facing_toward(target) == Some(a.facing)
}

/// Advance `agent` by at most one action toward `dest`.
pub fn navigate_toward_goal(
    world: &mut World,
    agent: ObjectId,
    dest: TileCoord,
    allow_adjacent: bool,
) -> NavStatus {
    let Some(facing) = world.agent(agent).map(|a| a.facing) else {
        return NavStatus::Unreachable;
    };
    let Some(pos) = world.world_position(agent) else {
        return NavStatus::Unreachable;
    };

    if close_pending_door(world, agent) {
        return NavStatus::Acted;
    }

    if pos == dest {
        return NavStatus::Arrived;
    }
    if allow_adjacent {
        if let Some(toward) = pos.facing_toward(dest) {
            if toward == facing {
                return NavStatus::Arrived;
            }
            world.rotate_to_direction(agent, toward);
            return NavStatus::Acted;
        }
    }

    let Some(step) = plan_step(world, agent, pos, dest, allow_adjacent) else {
        log::debug!("agent {agent} has no path from {pos} to {dest}");
        return NavStatus::Unreachable;
    };

    let Some(toward) = pos.facing_toward(step.next) else {
        return NavStatus::Unreachable;
    };
    if toward != facing {
        world.rotate_to_direction(agent, toward);
        return NavStatus::Acted;
    }

    let door = world
        .objects_at(step.next, ObjectsAt::visible())
        .into_iter()
        .find(|&id| world.get(id).is_some_and(|o| o.is_closed_passage()));
    if let Some(door) = door {
        let outcome = world.open_close(agent, door, true);
        if !outcome.success {
            log::debug!("agent {agent} cannot open {door}: {}", outcome.message);
            return NavStatus::Unreachable;
        }
        if let Some(a) = world.agent_mut(agent) {
            a.door_to_close = Some(door);
            a.steps_since_door_open = 0;
        }
        log::debug!("agent {agent} opened door {door} at {}", step.next);
        return NavStatus::Acted;
    }

    let outcome = world.move_direction(agent, MoveDirection::Forward);
    if outcome.success {
        if let Some(a) = world.agent_mut(agent) {
            a.blocked_ticks = 0;
            if a.door_to_close.is_some() {
                a.steps_since_door_open += 1;
            }
        }
        return NavStatus::Acted;
    }
    match outcome.data.blocking {
        Some(blocker) if world.is_agent(blocker) => wait_behind(world, agent, blocker),
        _ => NavStatus::Unreachable,
    }
}

/// Someone is in the way. Wait for them to move, up to
/// `max_blocked_wait_ticks` consecutive ticks.
fn wait_behind(world: &mut World, agent: ObjectId, blocker: ObjectId) -> NavStatus {
    let max_wait = world.config.autopilot.max_blocked_wait_ticks;
    let Some(a) = world.agent_mut(agent) else {
        return NavStatus::Unreachable;
    };
    a.blocked_ticks += 1;
    if a.blocked_ticks <= max_wait {
        return NavStatus::Acted;
    }
    a.blocked_ticks = 0;
    log::debug!("agent {agent} gave up waiting behind {blocker}");
    NavStatus::Unreachable
}

/// Close the door the agent opened, if it is time. Returns `true` if a
/// close was attempted (and so this tick's action is spent).
fn close_pending_door(world: &mut World, agent: ObjectId) -> bool {
    let close_after = world.config.autopilot.door_close_after_steps;
    let Some((door, steps)) = world
        .agent(agent)
        .and_then(|a| a.door_to_close.map(|d| (d, a.steps_since_door_open)))
    else {
        return false;
    };
    if steps < close_after {
        return false;
    }
    if let Some(a) = world.agent_mut(agent) {
        a.door_to_close = None;
        a.steps_since_door_open = 0;
    }
    if steps > close_after {
        return false;
    }
    let still_open = world.get(door).is_some_and(|d| d.is_open());
    if !still_open {
        return false;
    }
    let outcome = world.open_close(agent, door, false);
    log::debug!(
        "agent {agent} closing door {door} behind it: {}",
        outcome.message
    );
    outcome.success
}

/// First step toward `dest`, falling back to its cardinal neighbors when
/// `allow_adjacent` and the destination itself has no path.
fn plan_step(
    world: &World,
    agent: ObjectId,
    pos: TileCoord,
    dest: TileCoord,
    allow_adjacent: bool,
) -> Option<NextStep> {
    if let Some(step) = pathfinding::next_step_for(world, Some(agent), pos, dest) {
        return Some(step);
    }
    if !allow_adjacent {
        return None;
    }
    let mut best: Option<NextStep> = None;
    for neighbor in dest.cardinal_neighbors() {
        let Some(step) = pathfinding::next_step_for(world, Some(agent), pos, neighbor) else {
            continue;
        };
        if best.is_none_or(|b| step.path_length < b.path_length) {
            best = Some(step);
        }
    }
    best
}
