// Tick loop.
//
// `World::step(commands, ticker)` advances the world by exactly one tick.
// The order within a tick is fixed:
//
//   1. The tick counter advances. It doubles as the tick generation: an
//      object whose `last_ticked` is below it has not been ticked yet this
//      tick, so no reset pass over the arena is needed.
//   2. User commands are applied in slice order. Primitive actions produce an
//      `ActionOutcome` returned in `StepResult::outcomes`; the rest edit the
//      agent's autopilot state.
//   3. Every object is ticked once, in grid scan order (row-major, then layer
//      order, then parts and contents depth-first). The built-in update counts
//      down poison; afterwards the caller's `ObjectTicker` runs for the same
//      object. That hook is where NPC goal logic lives: it may enqueue or
//      clear autopilot goals and mutate the world freely.
//   4. Each agent in ID order whose queue is non-empty and who is not in a
//      dialog has its head goal stepped once by the interpreter. The status
//      decides whether the goal stays, leaves, or hands its continuation to
//      a parent.
//
// Objects spawned during a tick carry the current generation and are first
// ticked on the next tick. Objects deleted mid-tick are skipped.
//
// See also: `interpreter.rs` for the per-goal state machine, `command.rs`
// for the input types, `event.rs` for the output types.
//
// **Critical constraint: determinism.** Every phase iterates in a fixed
// order and the only randomness is the world PRNG, so the same seed and the
// same command stream reproduce the same world and event stream.

use crate::command::{SimAction, SimCommand};
use crate::event::{SimEvent, SimEventKind};
use crate::interpreter::{self, ActionStatus};
use crate::outcome::ActionOutcome;
use crate::types::ObjectId;
use crate::world::{ObjectsAt, World};

/// Per-object update hook run during phase 3 of `World::step`.
pub trait ObjectTicker {
    fn tick_object(&mut self, world: &mut World, id: ObjectId);
}

/// A ticker that does nothing beyond the built-in update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTicker;

impl ObjectTicker for NoopTicker {
    fn tick_object(&mut self, _world: &mut World, _id: ObjectId) {}
}

impl<F> ObjectTicker for F
where
    F: FnMut(&mut World, ObjectId),
{
    fn tick_object(&mut self, world: &mut World, id: ObjectId) {
        self(world, id)
    }
}

/// The outcome of one primitive action issued by a command.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandOutcome {
    pub agent: ObjectId,
    pub outcome: ActionOutcome,
}

/// The result of advancing the simulation by one tick.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    /// The tick that was just processed.
    pub tick: u64,
    /// One entry per primitive-action command, in command order.
    pub outcomes: Vec<CommandOutcome>,
    /// Narrative events emitted during this step, for the UI / event log.
    pub events: Vec<SimEvent>,
}

impl World {
    /// Apply `commands` and advance the world by one tick.
    pub fn step(&mut self, commands: &[SimCommand], ticker: &mut dyn ObjectTicker) -> StepResult {
        self.tick += 1;

        let mut outcomes = Vec::new();
        for cmd in commands {
            if let Some(outcome) = self.apply_command(cmd) {
                outcomes.push(CommandOutcome {
                    agent: cmd.agent,
                    outcome,
                });
            }
        }

        self.tick_objects(ticker);

        let agent_ids: Vec<ObjectId> = self.agents.keys().copied().collect();
        for id in agent_ids {
            self.advance_autopilot(id);
        }

        StepResult {
            tick: self.tick,
            outcomes,
            events: self.drain_events(),
        }
    }

    /// Apply one command. Returns the outcome for primitive actions.
    fn apply_command(&mut self, cmd: &SimCommand) -> Option<ActionOutcome> {
        let agent = cmd.agent;
        log::debug!("tick {}: agent {agent} command {:?}", self.tick, cmd.action);
        let outcome = match &cmd.action {
            SimAction::Move { direction } => self.move_direction(agent, *direction),
            SimAction::Rotate { rotation } => self.rotate(agent, *rotation),
            SimAction::RotateTo { facing } => self.rotate_to_direction(agent, *facing),
            SimAction::TeleportTo { coord } => self.teleport_to_location(agent, *coord),
            SimAction::TeleportToObject { object } => self.teleport_to_object(agent, *object),
            SimAction::PickUp { object } => self.pick_up(agent, *object),
            SimAction::Drop { object } => self.drop(agent, *object),
            SimAction::PutInto { object, container } => self.put_into(agent, *object, *container),
            SimAction::Throw { object } => self.throw(agent, *object),
            SimAction::OpenClose { object, open } => self.open_close(agent, *object, *open),
            SimAction::ActivateDeactivate { object, active } => {
                self.activate_deactivate(agent, *object, *active)
            }
            SimAction::Eat { object } => self.eat(agent, *object),
            SimAction::Read { object } => self.read(agent, *object),
            SimAction::UseOn { tool, target } => self.use_on(agent, *tool, *target),
            SimAction::Enqueue { action } => {
                if let Err(err) = self.enqueue(agent, action.clone()) {
                    log::warn!("enqueue for {agent} ignored: {err}");
                }
                return None;
            }
            SimAction::ClearAutopilot => {
                if let Err(err) = self.clear_autopilot(agent) {
                    log::warn!("clear for {agent} ignored: {err}");
                }
                return None;
            }
            SimAction::SetDialog { in_dialog } => {
                match self.agent_mut(agent) {
                    Some(a) => a.in_dialog = *in_dialog,
                    None => log::warn!("dialog flag for non-agent {agent} ignored"),
                }
                return None;
            }
        };
        Some(outcome)
    }

    /// Phase 3: tick every object once.
    fn tick_objects(&mut self, ticker: &mut dyn ObjectTicker) {
        let generation = self.tick;
        let order: Vec<ObjectId> = self
            .grid
            .iter()
            .flat_map(|(coord, _)| self.objects_at(coord, ObjectsAt::everything()))
            .collect();
        for id in order {
            let Some(obj) = self.objects.get_mut(&id) else {
                continue;
            };
            if obj.last_ticked >= generation {
                continue;
            }
            obj.last_ticked = generation;
            self.builtin_update(id);
            ticker.tick_object(self, id);
        }
    }

    fn builtin_update(&mut self, id: ObjectId) {
        let recovered = self.agents.get_mut(&id).is_some_and(|a| a.tick_poison());
        if recovered {
            log::info!("agent {id} is no longer poisoned");
            self.emit(SimEventKind::AgentRecovered { agent: id });
        }
    }

    /// Phase 4: run the interpreter once on the agent's head goal.
    fn advance_autopilot(&mut self, agent: ObjectId) {
        let Some(a) = self.agents.get(&agent) else {
            return;
        };
        if a.in_dialog {
            return;
        }
        let Some(mut head) = a.queue.head().cloned() else {
            return;
        };
        let ts = head.timestamp;
        let status = interpreter::step(&mut head, agent, self);
        let label = head.kind.label();
        log::debug!("agent {agent} {label} (ts {ts}): {status:?}");

        let Some(a) = self.agents.get_mut(&agent) else {
            return;
        };
        if !status.is_finished() {
            // Write back progress the handler made on its copy.
            if let Some(slot) = a.queue.get_mut(ts) {
                *slot = head;
            }
            return;
        }

        a.queue.remove(ts);
        if status == ActionStatus::Completed {
            if let Some(continuation) = head.on_complete {
                a.queue.apply_continuation(continuation);
            }
        }
        match status {
            ActionStatus::Invalid => log::warn!("agent {agent} dropped invalid {label} goal"),
            _ => log::info!("agent {agent} {label} finished: {status:?}"),
        }
        self.emit(SimEventKind::AutopilotFinished {
            agent,
            label: label.to_string(),
            status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autopilot::{AutopilotAction, AutopilotKind};
    use crate::config::SimConfig;
    use crate::object::ObjectTemplate;
    use crate::types::{Facing, Layer, MoveDirection, TileCoord};

    fn world() -> World {
        World::with_config(
            9,
            SimConfig {
                grid_size: (6, 6),
                ..SimConfig::default()
            },
        )
    }

    #[test]
    fn step_advances_tick_and_returns_outcomes() {
        let mut w = world();
        let agent = w.spawn_agent("a", TileCoord::new(0, 0), Facing::East).unwrap();
        let cmds = [SimCommand::new(
            agent,
            SimAction::Move {
                direction: MoveDirection::Forward,
            },
        )];
        let result = w.step(&cmds, &mut NoopTicker);
        assert_eq!(result.tick, 1);
        assert_eq!(result.outcomes.len(), 1);
        assert!(result.outcomes[0].outcome.success);
        assert_eq!(w.world_position(agent), Some(TileCoord::new(1, 0)));
    }

    #[test]
    fn each_object_ticked_once_in_scan_order() {
        let mut w = world();
        let chest = w
            .spawn_at(
                ObjectTemplate::fixture("chest").container(),
                TileCoord::new(1, 0),
                Layer::Furniture,
            )
            .unwrap();
        let coin = w.spawn_in(ObjectTemplate::item("coin"), chest).unwrap();
        let rock = w
            .spawn_at(ObjectTemplate::item("rock"), TileCoord::new(0, 1), Layer::Object)
            .unwrap();
        let mut seen = Vec::new();
        let mut ticker = |world: &mut World, id: ObjectId| {
            // Moving the rock onto a tile not yet scanned must not tick it twice.
            if id == rock {
                world.remove(rock).unwrap();
                world.place(rock, TileCoord::new(5, 5), Layer::Object).unwrap();
            }
            seen.push(id);
        };
        w.step(&[], &mut ticker);
        assert_eq!(seen, vec![chest, coin, rock]);
    }

    #[test]
    fn objects_spawned_mid_tick_wait_for_next_tick() {
        let mut w = world();
        let seed = w
            .spawn_at(ObjectTemplate::item("seed"), TileCoord::new(0, 0), Layer::Object)
            .unwrap();
        let mut spawned = Vec::new();
        let mut ticker = |world: &mut World, id: ObjectId| {
            if id == seed {
                let sprout = world
                    .spawn_at(ObjectTemplate::item("sprout"), TileCoord::new(3, 3), Layer::Object)
                    .unwrap();
                spawned.push(sprout);
            }
        };
        w.step(&[], &mut ticker);
        let sprout = spawned[0];
        assert_eq!(w.get(sprout).unwrap().last_ticked, 1);
        w.step(&[], &mut NoopTicker);
        assert_eq!(w.get(sprout).unwrap().last_ticked, 2);
    }

    #[test]
    fn dialog_freezes_the_queue() {
        let mut w = world();
        let agent = w.spawn_agent("a", TileCoord::new(0, 0), Facing::East).unwrap();
        let goto = AutopilotAction::new(
            AutopilotKind::GoTo {
                target: TileCoord::new(3, 0),
                allow_adjacent: false,
            },
            1,
        );
        let cmds = [
            SimCommand::new(agent, SimAction::Enqueue { action: goto }),
            SimCommand::new(agent, SimAction::SetDialog { in_dialog: true }),
        ];
        w.step(&cmds, &mut NoopTicker);
        w.step(&[], &mut NoopTicker);
        assert_eq!(w.world_position(agent), Some(TileCoord::new(0, 0)));

        let cmds = [SimCommand::new(agent, SimAction::SetDialog { in_dialog: false })];
        w.step(&cmds, &mut NoopTicker);
        assert_eq!(w.world_position(agent), Some(TileCoord::new(1, 0)));
    }

    #[test]
    fn finished_goal_emits_event_and_leaves_queue() {
        let mut w = world();
        let agent = w.spawn_agent("a", TileCoord::new(0, 0), Facing::East).unwrap();
        w.enqueue(
            agent,
            AutopilotAction::new(
                AutopilotKind::PostFeedUpdate {
                    text: "hello".into(),
                },
                1,
            ),
        )
        .unwrap();
        let result = w.step(&[], &mut NoopTicker);
        assert!(w.agent(agent).unwrap().queue.is_empty());
        let kinds: Vec<_> = result.events.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                SimEventKind::FeedPost {
                    agent,
                    text: "hello".into()
                },
                SimEventKind::AutopilotFinished {
                    agent,
                    label: "post-feed-update".into(),
                    status: ActionStatus::Completed,
                },
            ]
        );
        assert!(result.events.iter().all(|e| e.tick == 1));
    }

    #[test]
    fn poison_wears_off() {
        let mut w = world();
        let agent = w.spawn_agent("a", TileCoord::new(0, 0), Facing::East).unwrap();
        w.agent_mut(agent).unwrap().poison_counter = 2;
        let first = w.step(&[], &mut NoopTicker);
        assert!(first.events.is_empty());
        let second = w.step(&[], &mut NoopTicker);
        assert_eq!(
            second.events[0].kind,
            SimEventKind::AgentRecovered { agent }
        );
        assert!(!w.agent(agent).unwrap().is_poisoned());
    }
}
