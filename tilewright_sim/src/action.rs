// Primitive actions: the reach- and validity-checked operations agents
// perform on the world.
//
// Every action follows the same validation order and stops at the first
// failure:
//
//   1. Existence: the actor is an agent, the target objects exist.
//   2. Capability: the target has the needed capability (movable,
//      openable, usable, edible, ...).
//   3. Reach: the target's world position is within Chebyshev distance 1 of
//      the actor, and it is not sealed inside a closed container or another
//      agent. Movement checks the destination's bounds and passability
//      instead.
//   4. State: already open/closed/on/off, container closed, containment
//      cycle, key checks, inventory ownership.
//
// Validation never mutates. A failing check becomes an `ActionError`, which
// the public entry point turns into a failed `ActionOutcome`. Primitive
// actions never return `Err` and never abort the tick.
//
// Every public entry point appends exactly one `ActionRecord` to the actor's
// history, success or not, with snapshots of the argument objects taken
// before the action ran.
//
// Putting an object into another agent bypasses the closed-container check:
// that is how agents give each other things.
//
// See also: `world.rs` for the containment operations these build on,
// `error.rs` for the failure taxonomy, `navigation.rs` and `interpreter.rs`
// which drive these actions for autopiloted agents.
//
// **Critical constraint: determinism.** The poison roll is the only random
// draw and goes through `self.rng`.

use crate::error::{ActionError, Capability};
use crate::event::SimEventKind;
use crate::history::{ActionKind, ActionRecord, ArgSnapshot};
use crate::object::{Diggable, GameObject, Location, UseEffect};
use crate::outcome::{ActionOutcome, Importance, OutcomeData};
use crate::types::{Facing, Layer, MoveDirection, ObjectId, Rotation, TileCoord};
use crate::world::{Passability, World};

type ActionResult = Result<ActionOutcome, ActionError>;

impl World {
    // -----------------------------------------------------------------------
    // Public entry points
    // -----------------------------------------------------------------------

    /// Step one tile forward or backward relative to the agent's facing.
    /// Facing does not change.
    pub fn move_direction(&mut self, agent: ObjectId, direction: MoveDirection) -> ActionOutcome {
        self.perform(agent, ActionKind::Move, None, None, |w| {
            w.try_move(agent, direction)
        })
    }

    /// Quarter turn. Always succeeds for an agent.
    pub fn rotate(&mut self, agent: ObjectId, rotation: Rotation) -> ActionOutcome {
        self.perform(agent, ActionKind::Rotate, None, None, |w| {
            let (_, facing) = w.actor(agent)?;
            w.try_face(agent, facing.rotated(rotation))
        })
    }

    /// Turn to face `facing` directly. Always succeeds for an agent.
    pub fn rotate_to_direction(&mut self, agent: ObjectId, facing: Facing) -> ActionOutcome {
        self.perform(agent, ActionKind::Rotate, None, None, |w| {
            w.try_face(agent, facing)
        })
    }

    /// Move the agent to any passable in-bounds tile.
    pub fn teleport_to_location(&mut self, agent: ObjectId, coord: TileCoord) -> ActionOutcome {
        self.perform(agent, ActionKind::Teleport, None, None, |w| {
            w.try_teleport(agent, coord)
        })
    }

    /// Move the agent next to `object`, facing it. Neighbors are tried in
    /// N, E, S, W order.
    pub fn teleport_to_object(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::Teleport, Some(object), None, |w| {
            w.try_teleport_to_object(agent, object)
        })
    }

    pub fn pick_up(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::PickUp, Some(object), None, |w| {
            w.try_pick_up(agent, object)
        })
    }

    /// Drop a held object onto the agent's tile.
    pub fn drop(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::Drop, Some(object), None, |w| {
            w.try_drop(agent, object)
        })
    }

    pub fn put_into(
        &mut self,
        agent: ObjectId,
        object: ObjectId,
        container: ObjectId,
    ) -> ActionOutcome {
        self.perform(
            agent,
            ActionKind::PutInto,
            Some(object),
            Some(container),
            |w| w.try_put_into(agent, object, container),
        )
    }

    /// Throw a held object up to `throw_distance` tiles in the facing
    /// direction. It lands on the last passable tile before an obstacle.
    pub fn throw(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::Throw, Some(object), None, |w| {
            w.try_throw(agent, object)
        })
    }

    /// Open (`open == true`) or close an openable object.
    pub fn open_close(&mut self, agent: ObjectId, object: ObjectId, open: bool) -> ActionOutcome {
        self.perform(agent, ActionKind::OpenClose, Some(object), None, |w| {
            w.try_open_close(agent, object, open)
        })
    }

    pub fn activate_deactivate(
        &mut self,
        agent: ObjectId,
        object: ObjectId,
        active: bool,
    ) -> ActionOutcome {
        self.perform(
            agent,
            ActionKind::ActivateDeactivate,
            Some(object),
            None,
            |w| w.try_activate(agent, object, active),
        )
    }

    /// Eat a held or reachable edible object. The object and everything in it
    /// are deleted.
    pub fn eat(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::Eat, Some(object), None, |w| {
            w.try_eat(agent, object)
        })
    }

    pub fn read(&mut self, agent: ObjectId, object: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::Read, Some(object), None, |w| {
            w.try_read(agent, object)
        })
    }

    /// Use a held tool on a target.
    pub fn use_on(&mut self, agent: ObjectId, tool: ObjectId, target: ObjectId) -> ActionOutcome {
        self.perform(agent, ActionKind::UseOn, Some(tool), Some(target), |w| {
            w.try_use_on(agent, tool, target)
        })
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    /// Run an action body, convert its error into a failed outcome, and
    /// record it in the actor's history.
    fn perform(
        &mut self,
        agent: ObjectId,
        kind: ActionKind,
        arg1: Option<ObjectId>,
        arg2: Option<ObjectId>,
        body: impl FnOnce(&mut World) -> ActionResult,
    ) -> ActionOutcome {
        let arg1 = arg1.map(|id| self.snapshot(id));
        let arg2 = arg2.map(|id| self.snapshot(id));
        let outcome = match body(self) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::trace!("agent {agent} {kind:?} failed: {err}");
                ActionOutcome::failed(&err)
            }
        };
        let tick = self.tick;
        if let Some(a) = self.agents.get_mut(&agent) {
            a.history.push(ActionRecord {
                tick,
                kind,
                arg1,
                arg2,
                success: outcome.success,
                message: outcome.message.clone(),
            });
        }
        outcome
    }

    fn snapshot(&self, id: ObjectId) -> ArgSnapshot {
        match self.objects.get(&id) {
            Some(obj) => ArgSnapshot {
                id,
                kind: obj.kind.clone(),
                name: obj.name.clone(),
            },
            None => ArgSnapshot {
                id,
                kind: String::new(),
                name: id.to_string(),
            },
        }
    }

    /// The acting agent's position and facing.
    fn actor(&self, agent: ObjectId) -> Result<(TileCoord, Facing), ActionError> {
        let Some(a) = self.agents.get(&agent) else {
            return Err(if self.objects.contains_key(&agent) {
                ActionError::NotAnAgent(agent)
            } else {
                ActionError::UnknownObject(agent)
            });
        };
        let pos = self
            .world_position(agent)
            .ok_or(ActionError::NotAnAgent(agent))?;
        Ok((pos, a.facing))
    }

    fn target(&self, id: ObjectId) -> Result<&GameObject, ActionError> {
        self.objects.get(&id).ok_or(ActionError::UnknownObject(id))
    }

    /// Reach check: Chebyshev distance <= 1 from the actor.
    fn check_reach(&self, from: TileCoord, id: ObjectId) -> Result<(), ActionError> {
        match self.world_position(id) {
            Some(pos) if from.chebyshev_distance(pos) <= 1 => Ok(()),
            _ => Err(ActionError::OutOfReach {
                name: self.name_of(id),
            }),
        }
    }

    /// `true` unless `id` is sealed inside a closed container or inside
    /// another agent. Anything in the actor's own inventory is accessible
    /// up to the first closed container.
    pub fn is_accessible_to(&self, agent: ObjectId, id: ObjectId) -> bool {
        let mut current = id;
        while let Some(obj) = self.objects.get(&current) {
            let holder = match obj.location {
                Location::Contained { parent } => parent,
                // Parts share their owner's accessibility.
                Location::Part { owner } => {
                    current = owner;
                    continue;
                }
                _ => return true,
            };
            if holder == agent {
                return true;
            }
            if self.is_agent(holder) || !self.is_container_open(holder) {
                return false;
            }
            current = holder;
        }
        false
    }

    fn check_accessible(&self, agent: ObjectId, id: ObjectId) -> Result<(), ActionError> {
        if self.is_accessible_to(agent, id) {
            Ok(())
        } else {
            Err(ActionError::Inaccessible {
                name: self.name_of(id),
            })
        }
    }

    fn check_held(&self, agent: ObjectId, id: ObjectId) -> Result<(), ActionError> {
        if self.objects.get(&id).and_then(|o| o.parent()) == Some(agent) {
            Ok(())
        } else {
            Err(ActionError::NotHeld {
                name: self.name_of(id),
            })
        }
    }

    /// Passability of `coord` ignoring `agent` itself.
    pub(crate) fn passable_for(&self, agent: ObjectId, coord: TileCoord) -> Passability {
        let Some(tile) = self.grid.tile(coord) else {
            return Passability::OutOfBounds;
        };
        for id in tile.iter() {
            if id != agent && self.objects.get(&id).is_some_and(|o| o.blocks_movement()) {
                return Passability::Blocked(id);
            }
        }
        Passability::Passable
    }

    fn check_enterable(&self, agent: ObjectId, coord: TileCoord) -> Result<(), ActionError> {
        match self.passable_for(agent, coord) {
            Passability::Passable => Ok(()),
            Passability::OutOfBounds => Err(ActionError::OutOfBounds(coord)),
            Passability::Blocked(blocker) => Err(ActionError::NotPassable {
                coord,
                blocker,
                blocker_name: self.name_of(blocker),
            }),
        }
    }

    /// Every object the agent carries, depth-first, descending only into
    /// open containers.
    pub fn reachable_inventory(&self, agent: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = self
            .objects
            .get(&agent)
            .map(|a| a.contents.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(obj) = self.objects.get(&id) {
                if obj.caps.container && obj.interior_open() {
                    stack.extend(obj.contents.iter().rev().copied());
                }
            }
        }
        out
    }

    /// `id` plus everything inside it, recursively.
    fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(obj) = self.objects.get(&next) {
                out.push(next);
                stack.extend(obj.contents.iter().copied());
                stack.extend(obj.parts.iter().copied());
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Action bodies
    // -----------------------------------------------------------------------

    fn try_move(&mut self, agent: ObjectId, direction: MoveDirection) -> ActionResult {
        let (pos, facing) = self.actor(agent)?;
        let heading = match direction {
            MoveDirection::Forward => facing,
            MoveDirection::Backward => facing.opposite(),
        };
        let dest = pos.step(heading);
        self.check_enterable(agent, dest)?;
        self.place(agent, dest, Layer::Agent)?;
        Ok(ActionOutcome::succeeded(format!("you move {heading}")).with_importance(Importance::Low))
    }

    fn try_face(&mut self, agent: ObjectId, facing: Facing) -> ActionResult {
        self.actor(agent)?;
        if let Some(a) = self.agents.get_mut(&agent) {
            a.facing = facing;
        }
        self.mark_dirty_at(agent);
        Ok(ActionOutcome::succeeded(format!("you turn to face {facing}"))
            .with_importance(Importance::Low))
    }

    fn try_teleport(&mut self, agent: ObjectId, coord: TileCoord) -> ActionResult {
        self.actor(agent)?;
        self.check_enterable(agent, coord)?;
        self.place(agent, coord, Layer::Agent)?;
        Ok(ActionOutcome::succeeded(format!("you are now at {coord}")))
    }

    fn try_teleport_to_object(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        self.actor(agent)?;
        let name = self.target(object)?.name.clone();
        if object == agent {
            return Err(ActionError::SelfTarget);
        }
        let pos = self
            .world_position(object)
            .ok_or_else(|| ActionError::Inaccessible { name: name.clone() })?;
        let landing = Facing::ALL
            .into_iter()
            .map(|f| (pos.step(f), f))
            .find(|&(c, _)| self.passable_for(agent, c).is_passable());
        let Some((coord, side)) = landing else {
            return Err(ActionError::NoRoomNear { name });
        };
        self.place(agent, coord, Layer::Agent)?;
        if let Some(a) = self.agents.get_mut(&agent) {
            a.facing = side.opposite();
        }
        Ok(ActionOutcome::succeeded(format!("you are now next to the {name}")))
    }

    fn try_pick_up(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        if object == agent {
            return Err(ActionError::SelfTarget);
        }
        let name = obj.name.clone();
        if !obj.caps.movable {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Movable,
            });
        }
        let is_part = matches!(obj.location, Location::Part { .. });
        self.check_reach(pos, object)?;
        if self.holder_of(object) == Some(agent) && !is_part {
            return Err(ActionError::AlreadyHeld { name });
        }
        if is_part {
            return Err(ActionError::Attached { name });
        }
        self.check_accessible(agent, object)?;
        self.move_into_container(object, agent)?;
        Ok(ActionOutcome::succeeded(format!("you pick up the {name}")))
    }

    fn try_drop(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        if !obj.caps.movable {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Movable,
            });
        }
        self.check_held(agent, object)?;
        self.place(object, pos, Layer::Object)?;
        Ok(ActionOutcome::succeeded(format!("you drop the {name}")))
    }

    fn try_put_into(
        &mut self,
        agent: ObjectId,
        object: ObjectId,
        container: ObjectId,
    ) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let holder = self.target(container)?;
        let name = obj.name.clone();
        let container_name = holder.name.clone();
        if object == agent {
            return Err(ActionError::SelfTarget);
        }
        if !obj.caps.movable {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Movable,
            });
        }
        if !holder.caps.container {
            return Err(ActionError::MissingCapability {
                name: container_name,
                capability: Capability::Container,
            });
        }
        let recipient_is_agent = self.is_agent(container);
        let container_open = holder.interior_open();

        self.check_reach(pos, object)?;
        self.check_reach(pos, container)?;

        if matches!(self.objects.get(&object).map(|o| o.location), Some(Location::Part { .. })) {
            return Err(ActionError::Attached { name });
        }
        self.check_held(agent, object)?;
        self.check_accessible(agent, container)?;
        if container == object || self.is_inside(container, object) {
            return Err(ActionError::WouldCycle {
                object: name,
                container: container_name,
            });
        }
        if !recipient_is_agent && !container_open {
            return Err(ActionError::ContainerClosed {
                name: container_name,
            });
        }
        self.move_into_container(object, container)?;
        let message = if recipient_is_agent && container != agent {
            format!("you give the {name} to {container_name}")
        } else {
            format!("you put the {name} into the {container_name}")
        };
        Ok(ActionOutcome::succeeded(message))
    }

    fn try_throw(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        let (pos, facing) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        if !obj.caps.movable {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Movable,
            });
        }
        self.check_held(agent, object)?;

        let mut landing = None;
        for n in 1..=self.config.throw_distance as i32 {
            let c = pos.step_n(facing, n);
            if !self.passable_for(agent, c).is_passable() {
                break;
            }
            landing = Some(c);
        }
        let Some(dest) = landing else {
            return Err(ActionError::NoLandingTile { name });
        };
        self.place(object, dest, Layer::Object)?;
        Ok(ActionOutcome::succeeded(format!("you throw the {name}, it lands at {dest}")))
    }

    fn try_open_close(&mut self, agent: ObjectId, object: ObjectId, open: bool) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        let Some(openable) = obj.caps.openable else {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Openable,
            });
        };
        let required_key = obj.caps.passage.map_or(0, |p| p.required_key);

        self.check_reach(pos, object)?;
        self.check_accessible(agent, object)?;
        if openable.open == open {
            return Err(ActionError::AlreadyInState {
                name,
                state: if open { "open" } else { "closed" },
            });
        }
        if required_key != 0 {
            self.check_key(agent, required_key, &name)?;
        }

        if let Some(o) = self.objects.get_mut(&object) {
            o.caps.openable = Some(crate::object::Openable { open });
        }
        self.mark_dirty_at(object);
        let verb = if open { "open" } else { "close" };
        let mut data = OutcomeData::default();
        if open && self.objects.get(&object).is_some_and(|o| o.caps.container) {
            data.revealed = self
                .objects
                .get(&object)
                .map(|o| o.contents.clone())
                .unwrap_or_default();
        }
        Ok(ActionOutcome::succeeded(format!("you {verb} the {name}")).with_data(data))
    }

    /// The actor must carry a working key with `key_id`.
    fn check_key(&self, agent: ObjectId, key_id: u32, door_name: &str) -> Result<(), ActionError> {
        let mut disabled = None;
        for id in self.reachable_inventory(agent) {
            let Some(obj) = self.objects.get(&id) else {
                continue;
            };
            match obj.caps.key {
                Some(k) if k.key_id == key_id && !k.disabled => return Ok(()),
                Some(k) if k.key_id == key_id => disabled = Some(obj.name.clone()),
                _ => {}
            }
        }
        match disabled {
            Some(key) => Err(ActionError::KeyDisabled {
                name: door_name.to_string(),
                key,
            }),
            None => Err(ActionError::MissingKey {
                name: door_name.to_string(),
            }),
        }
    }

    fn try_activate(&mut self, agent: ObjectId, object: ObjectId, active: bool) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        let Some(current) = obj.caps.activatable else {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Activatable,
            });
        };
        self.check_reach(pos, object)?;
        self.check_accessible(agent, object)?;
        if current.active == active {
            return Err(ActionError::AlreadyInState {
                name,
                state: if active { "on" } else { "off" },
            });
        }
        if let Some(o) = self.objects.get_mut(&object) {
            o.caps.activatable = Some(crate::object::Activatable { active });
        }
        self.mark_dirty_at(object);
        let verb = if active { "switch on" } else { "switch off" };
        Ok(ActionOutcome::succeeded(format!("you {verb} the {name}")))
    }

    fn try_eat(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        if object == agent {
            return Err(ActionError::SelfTarget);
        }
        if !obj.caps.edible {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Edible,
            });
        }
        self.check_reach(pos, object)?;
        if matches!(obj.location, Location::Part { .. }) {
            return Err(ActionError::Attached { name });
        }
        self.check_accessible(agent, object)?;

        let eaten = self.subtree(object);
        let poisonous = eaten
            .iter()
            .any(|id| self.objects.get(id).is_some_and(|o| o.caps.poisonous));
        self.delete(object)?;

        if !poisonous {
            return Ok(ActionOutcome::succeeded(format!("you eat the {name}")));
        }
        let (min, max) = (self.config.poison.min_ticks, self.config.poison.max_ticks);
        let ticks = self.rng.range_u32_inclusive(min, max);
        if let Some(a) = self.agents.get_mut(&agent) {
            a.poison_counter = ticks;
        }
        log::info!("agent {agent} poisoned for {ticks} ticks by {name}");
        self.emit(SimEventKind::AgentPoisoned { agent, ticks });
        Ok(
            ActionOutcome::succeeded(format!("you eat the {name}, you feel sick"))
                .with_importance(Importance::High),
        )
    }

    fn try_read(&mut self, agent: ObjectId, object: ObjectId) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let obj = self.target(object)?;
        let name = obj.name.clone();
        let Some(readable) = obj.caps.readable.clone() else {
            return Err(ActionError::MissingCapability {
                name,
                capability: Capability::Readable,
            });
        };
        self.check_reach(pos, object)?;
        self.check_accessible(agent, object)?;
        let data = OutcomeData {
            text: Some(readable.text.clone()),
            ..OutcomeData::default()
        };
        Ok(ActionOutcome::succeeded(readable.text).with_data(data))
    }

    fn try_use_on(&mut self, agent: ObjectId, tool: ObjectId, target: ObjectId) -> ActionResult {
        let (pos, _) = self.actor(agent)?;
        let tool_obj = self.target(tool)?;
        let tool_name = tool_obj.name.clone();
        let Some(usable) = tool_obj.caps.usable.clone() else {
            return Err(ActionError::MissingCapability {
                name: tool_name,
                capability: Capability::Usable,
            });
        };
        let target_name = self.target(target)?.name.clone();
        self.check_reach(pos, target)?;
        self.check_held(agent, tool)?;
        self.check_accessible(agent, target)?;

        match usable.effect {
            UseEffect::Dig => self.dig(target, &tool_name, &target_name),
            UseEffect::Inspect { property } => {
                let value = self
                    .objects
                    .get(&target)
                    .and_then(|o| o.props.get(&property))
                    .map(|v| v.to_string());
                let Some(value) = value else {
                    return Err(ActionError::NoSuchProperty {
                        name: target_name,
                        property,
                    });
                };
                let message = format!("the {target_name}'s {property} is {value}");
                let data = OutcomeData {
                    text: Some(value),
                    ..OutcomeData::default()
                };
                Ok(ActionOutcome::succeeded(message).with_data(data))
            }
        }
    }

    /// Toggle diggable ground between dug (an open hole) and filled.
    fn dig(&mut self, target: ObjectId, tool_name: &str, target_name: &str) -> ActionResult {
        let Some(obj) = self.objects.get_mut(&target) else {
            return Err(ActionError::UnknownObject(target));
        };
        let Some(diggable) = obj.caps.diggable else {
            return Err(ActionError::NoEffect {
                tool: tool_name.to_string(),
                target: target_name.to_string(),
            });
        };
        let dug = !diggable.dug;
        obj.caps.diggable = Some(Diggable { dug });
        let contents = obj.contents.clone();
        self.mark_dirty_at(target);
        if dug {
            let data = OutcomeData {
                revealed: contents,
                ..OutcomeData::default()
            };
            Ok(ActionOutcome::succeeded(format!("you dig a hole in the {target_name}"))
                .with_data(data))
        } else {
            Ok(ActionOutcome::succeeded(format!(
                "you fill in the hole in the {target_name}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::object::{ObjectTemplate, PropValue};

    fn world() -> World {
        let config = SimConfig {
            grid_size: (8, 8),
            ..SimConfig::default()
        };
        World::with_config(11, config)
    }

    fn with_agent(coord: TileCoord, facing: Facing) -> (World, ObjectId) {
        let mut w = world();
        let agent = w.spawn_agent("Ada", coord, facing).unwrap();
        (w, agent)
    }

    #[test]
    fn pick_up_respects_reach() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let near = w
            .spawn_at(ObjectTemplate::item("stone"), TileCoord::new(4, 4), Layer::Object)
            .unwrap();
        let far = w
            .spawn_at(ObjectTemplate::item("stone"), TileCoord::new(5, 3), Layer::Object)
            .unwrap();

        let out = w.pick_up(agent, far);
        assert!(!out.success);
        assert_eq!(w.world_position(far), Some(TileCoord::new(5, 3)));
        assert!(w.get(agent).unwrap().contents.is_empty());

        assert!(w.pick_up(agent, near).success);
        assert_eq!(w.holder_of(near), Some(agent));
        w.verify_ownership().unwrap();
    }

    #[test]
    fn pick_up_refuses_immovable() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let anvil = w
            .spawn_at(ObjectTemplate::fixture("anvil"), TileCoord::new(3, 2), Layer::Furniture)
            .unwrap();
        let out = w.pick_up(agent, anvil);
        assert!(!out.success);
        assert_eq!(out.message, "the anvil is not something that can be moved");
    }

    #[test]
    fn validation_checks_capability_before_reach() {
        let (mut w, agent) = with_agent(TileCoord::new(0, 0), Facing::North);
        let anvil = w
            .spawn_at(ObjectTemplate::fixture("anvil"), TileCoord::new(7, 7), Layer::Furniture)
            .unwrap();
        let out = w.pick_up(agent, anvil);
        assert!(out.message.contains("can be moved"));
    }

    #[test]
    fn cannot_pick_up_from_closed_chest() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let chest = w
            .spawn_at(
                ObjectTemplate::fixture("chest").container().openable(false),
                TileCoord::new(3, 2),
                Layer::Furniture,
            )
            .unwrap();
        let coin = w.spawn_in(ObjectTemplate::item("coin"), chest).unwrap();
        assert!(!w.pick_up(agent, coin).success);
        assert!(w.open_close(agent, chest, true).success);
        assert!(w.pick_up(agent, coin).success);
    }

    #[test]
    fn move_is_blocked_by_walls_and_edges() {
        let (mut w, agent) = with_agent(TileCoord::new(0, 1), Facing::North);
        let wall = w
            .spawn_at(ObjectTemplate::fixture("wall"), TileCoord::new(1, 1), Layer::Structure)
            .unwrap();
        assert!(w.move_direction(agent, MoveDirection::Forward).success);
        let out = w.move_direction(agent, MoveDirection::Forward);
        assert!(!out.success);
        assert_eq!(w.world_position(agent), Some(TileCoord::new(0, 0)));

        w.rotate_to_direction(agent, Facing::South);
        assert!(w.move_direction(agent, MoveDirection::Forward).success);
        w.rotate(agent, Rotation::CounterClockwise);
        assert_eq!(w.agent(agent).unwrap().facing, Facing::East);
        let out = w.move_direction(agent, MoveDirection::Forward);
        assert!(!out.success);
        assert_eq!(out.data.blocking, Some(wall));
    }

    #[test]
    fn move_backward_keeps_facing() {
        let (mut w, agent) = with_agent(TileCoord::new(2, 2), Facing::East);
        assert!(w.move_direction(agent, MoveDirection::Backward).success);
        assert_eq!(w.world_position(agent), Some(TileCoord::new(1, 2)));
        assert_eq!(w.agent(agent).unwrap().facing, Facing::East);
    }

    #[test]
    fn put_into_prevents_cycles() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let bag = w
            .spawn_in(ObjectTemplate::item("bag").container(), agent)
            .unwrap();
        let pouch = w.spawn_in(ObjectTemplate::item("pouch").container(), bag).unwrap();
        assert!(!w.put_into(agent, bag, bag).success);
        let out = w.put_into(agent, bag, pouch);
        assert!(!out.success);
        assert!(out.message.contains("inside itself"));
        assert_eq!(w.holder_of(pouch), Some(bag));
        w.verify_ownership().unwrap();
    }

    #[test]
    fn put_into_closed_container_fails_but_giving_works() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let friend = w.spawn_agent("Bo", TileCoord::new(4, 3), Facing::West).unwrap();
        let box_ = w
            .spawn_at(
                ObjectTemplate::fixture("box").container().openable(false),
                TileCoord::new(2, 3),
                Layer::Furniture,
            )
            .unwrap();
        let pear = w.spawn_in(ObjectTemplate::item("pear"), agent).unwrap();

        let out = w.put_into(agent, pear, box_);
        assert!(!out.success);
        assert_eq!(out.message, "the box is closed");

        let out = w.put_into(agent, pear, friend);
        assert!(out.success, "{}", out.message);
        assert_eq!(w.holder_of(pear), Some(friend));
    }

    #[test]
    fn put_into_requires_holding_the_object() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let bin = w
            .spawn_at(
                ObjectTemplate::fixture("bin").container(),
                TileCoord::new(3, 2),
                Layer::Furniture,
            )
            .unwrap();
        let rock = w
            .spawn_at(ObjectTemplate::item("rock"), TileCoord::new(3, 3), Layer::Object)
            .unwrap();

        let out = w.put_into(agent, rock, bin);
        assert!(!out.success);
        let expected = ActionError::NotHeld {
            name: "rock".to_string(),
        };
        assert_eq!(out.message, expected.to_string());
        assert_eq!(w.world_position(rock), Some(TileCoord::new(3, 3)));
        assert_eq!(w.holder_of(rock), None);

        assert!(w.pick_up(agent, rock).success);
        assert!(w.put_into(agent, rock, bin).success);
        assert_eq!(w.holder_of(rock), Some(bin));
    }

    #[test]
    fn locked_door_needs_working_key() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let door = w
            .spawn_at(ObjectTemplate::door(7), TileCoord::new(3, 2), Layer::Structure)
            .unwrap();
        let out = w.open_close(agent, door, true);
        assert!(!out.success);
        assert!(out.message.contains("locked"));

        let key = w.spawn_in(ObjectTemplate::item("key").key(7), agent).unwrap();
        w.get_mut(key).unwrap().caps.key = Some(crate::object::Key {
            key_id: 7,
            disabled: true,
        });
        let out = w.open_close(agent, door, true);
        assert!(!out.success);
        assert!(out.message.contains("no longer works"));

        w.get_mut(key).unwrap().caps.key = Some(crate::object::Key {
            key_id: 7,
            disabled: false,
        });
        assert!(w.open_close(agent, door, true).success);
        assert!(w.get(door).unwrap().is_open());
        let out = w.open_close(agent, door, true);
        assert_eq!(out.message, "the door is already open");
    }

    #[test]
    fn key_inside_held_bag_counts() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let door = w
            .spawn_at(ObjectTemplate::door(2), TileCoord::new(3, 2), Layer::Structure)
            .unwrap();
        let bag = w.spawn_in(ObjectTemplate::item("bag").container(), agent).unwrap();
        w.spawn_in(ObjectTemplate::item("key").key(2), bag).unwrap();
        assert!(w.open_close(agent, door, true).success);
    }

    #[test]
    fn activate_checks_state() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let lamp = w
            .spawn_at(
                ObjectTemplate::item("lamp").activatable(false),
                TileCoord::new(3, 3),
                Layer::Object,
            )
            .unwrap();
        assert!(w.activate_deactivate(agent, lamp, true).success);
        let out = w.activate_deactivate(agent, lamp, true);
        assert_eq!(out.message, "the lamp is already on");
        assert!(w.activate_deactivate(agent, lamp, false).success);
    }

    #[test]
    fn eating_poison_rolls_counter_in_range() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let pie = w
            .spawn_at(
                ObjectTemplate::item("pie").edible().container(),
                TileCoord::new(3, 4),
                Layer::Object,
            )
            .unwrap();
        let berry = w
            .spawn_in(ObjectTemplate::item("berry").poisonous(), pie)
            .unwrap();
        let out = w.eat(agent, pie);
        assert!(out.success);
        assert_eq!(out.importance, Importance::High);
        assert!(!w.contains(pie));
        assert!(!w.contains(berry));
        let counter = w.agent(agent).unwrap().poison_counter;
        let p = &w.config.poison;
        assert!((p.min_ticks..=p.max_ticks).contains(&counter));
        w.verify_ownership().unwrap();

        // The record survives the deletion.
        let history = &w.agent(agent).unwrap().history;
        let eaten = history.query_by_type_and_arg_kinds(ActionKind::Eat, Some("pie"), None);
        assert_eq!(eaten.len(), 1);
    }

    #[test]
    fn eating_wholesome_food_does_not_poison() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let apple = w.spawn_in(ObjectTemplate::item("apple").edible(), agent).unwrap();
        assert!(w.eat(agent, apple).success);
        assert_eq!(w.agent(agent).unwrap().poison_counter, 0);
    }

    #[test]
    fn read_returns_text() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let sign = w
            .spawn_at(
                ObjectTemplate::fixture("sign").readable("beware of geese"),
                TileCoord::new(2, 2),
                Layer::Furniture,
            )
            .unwrap();
        let out = w.read(agent, sign);
        assert_eq!(out.message, "beware of geese");
        assert_eq!(out.data.text.as_deref(), Some("beware of geese"));
    }

    #[test]
    fn shovel_digs_and_fills() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let soil = w
            .spawn_at(ObjectTemplate::soil(), TileCoord::new(3, 2), Layer::Ground)
            .unwrap();
        let shovel = w
            .spawn_at(
                ObjectTemplate::item("shovel").usable(UseEffect::Dig),
                TileCoord::new(3, 3),
                Layer::Object,
            )
            .unwrap();
        // Tool must be held.
        assert!(!w.use_on(agent, shovel, soil).success);
        assert!(w.pick_up(agent, shovel).success);
        assert!(w.use_on(agent, shovel, soil).success);
        assert!(w.is_container_open(soil));

        let bone = w.spawn_in(ObjectTemplate::item("bone"), agent).unwrap();
        assert!(w.put_into(agent, bone, soil).success);
        assert!(w.use_on(agent, shovel, soil).success);
        assert!(!w.is_container_open(soil));
        assert!(!w.pick_up(agent, bone).success);

        let out = w.use_on(agent, shovel, soil);
        assert_eq!(out.data.revealed, vec![bone]);
    }

    #[test]
    fn inspect_reports_property() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        let gauge = w
            .spawn_in(
                ObjectTemplate::item("thermometer").usable(UseEffect::Inspect {
                    property: "temperature".into(),
                }),
                agent,
            )
            .unwrap();
        let pot = w
            .spawn_at(
                ObjectTemplate::item("pot").with_prop("temperature", PropValue::Int(80)),
                TileCoord::new(4, 3),
                Layer::Object,
            )
            .unwrap();
        let out = w.use_on(agent, gauge, pot);
        assert_eq!(out.message, "the pot's temperature is 80");
        let out = w.use_on(agent, gauge, gauge);
        assert!(!out.success);
    }

    #[test]
    fn throw_stops_before_obstacle() {
        let (mut w, agent) = with_agent(TileCoord::new(1, 1), Facing::East);
        w.spawn_at(ObjectTemplate::fixture("wall"), TileCoord::new(4, 1), Layer::Structure)
            .unwrap();
        let ball = w.spawn_in(ObjectTemplate::item("ball"), agent).unwrap();
        assert!(w.throw(agent, ball).success);
        assert_eq!(w.world_position(ball), Some(TileCoord::new(3, 1)));

        let rock = w.spawn_in(ObjectTemplate::item("rock"), agent).unwrap();
        w.rotate_to_direction(agent, Facing::North);
        w.teleport_to_location(agent, TileCoord::new(1, 0));
        let out = w.throw(agent, rock);
        assert!(!out.success);
        assert_eq!(w.holder_of(rock), Some(agent));
    }

    #[test]
    fn teleport_to_object_faces_it() {
        let (mut w, agent) = with_agent(TileCoord::new(0, 0), Facing::North);
        let tree = w
            .spawn_at(ObjectTemplate::fixture("tree"), TileCoord::new(5, 5), Layer::Structure)
            .unwrap();
        w.spawn_at(ObjectTemplate::fixture("wall"), TileCoord::new(5, 4), Layer::Structure)
            .unwrap();
        assert!(w.teleport_to_object(agent, tree).success);
        // North is walled off, so the agent lands east of the tree.
        assert_eq!(w.world_position(agent), Some(TileCoord::new(6, 5)));
        assert_eq!(w.agent(agent).unwrap().facing, Facing::West);
    }

    #[test]
    fn every_attempt_is_recorded() {
        let (mut w, agent) = with_agent(TileCoord::new(3, 3), Facing::North);
        w.drop(agent, ObjectId(999));
        w.rotate(agent, Rotation::Clockwise);
        let history = &w.agent(agent).unwrap().history;
        assert_eq!(history.len(), 2);
        assert!(!history.records()[0].success);
        assert_eq!(
            history.last_step_action().map(|r| r.kind),
            Some(ActionKind::Rotate)
        );
    }

    #[test]
    fn non_agent_actor_fails_cleanly() {
        let mut w = world();
        let rock = w
            .spawn_at(ObjectTemplate::item("rock"), TileCoord::new(1, 1), Layer::Object)
            .unwrap();
        let out = w.move_direction(rock, MoveDirection::Forward);
        assert!(!out.success);
        assert_eq!(out.message, "#1 is not an agent");
    }
}
