// Autopilot actions and the per-agent priority queue.
//
// An autopilot action is a queued, possibly multi-tick, high-level goal for
// an agent ("walk to (4, 7)", "pick up every mushroom in this area and put
// it in the basket"). Each agent owns one `AutopilotQueue`. The queue is
// kept sorted by priority descending, ties broken by insertion timestamp
// ascending, so the head is always the goal the interpreter runs next.
//
// Compound goals decompose: their interpreter handler pushes finer-grained
// sub-actions at a higher priority and suspends. A sub-action may carry a
// `Continuation`, plain data the queue applies to the parent (addressed by
// its timestamp) when the sub-action completes. This is how the area pickup
// goal counts how many objects its children have placed.
//
// `impl World` at the bottom exposes the agent-level entry points used by
// goal-selection logic: `enqueue`, `clear_autopilot`, `is_busy`.
//
// See also: `interpreter.rs` for the per-kind handlers, `sim.rs` for the tick
// loop that drives the head of each queue, `agent.rs` which owns the queue.
//
// **Critical constraint: determinism.** Timestamps come from a per-agent
// counter, never from the clock, and the sort is stable.

use crate::error::ContainmentError;
use crate::types::{Facing, MoveDirection, ObjectId, TileArea, TileCoord};
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Bookkeeping for a decomposing area pickup goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaProgress {
    /// Stop once this many objects have been placed.
    pub max_to_take: u32,
    /// Objects placed so far. Incremented by child continuations.
    pub num_taken: u32,
    /// Objects a pickup was already scheduled for, so a failed attempt is
    /// not retried forever.
    pub attempted: Vec<ObjectId>,
}

impl AreaProgress {
    pub fn new(max_to_take: u32) -> Self {
        Self {
            max_to_take,
            num_taken: 0,
            attempted: Vec::new(),
        }
    }
}

/// A world predicate checked by `AutopilotKind::CheckCondition`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `object` is directly inside `container`.
    ObjectInContainer {
        object: ObjectId,
        container: ObjectId,
    },
    /// The agent holds an object of this kind.
    Holding { kind: String },
    /// The agent stands on `coord`.
    AgentAt { coord: TileCoord },
    IsOpen { object: ObjectId, open: bool },
    IsActive { object: ObjectId, active: bool },
}

/// The goal and its parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotKind {
    /// Walk to `target` (or next to it, facing it, when `allow_adjacent`).
    GoTo {
        target: TileCoord,
        allow_adjacent: bool,
    },
    /// Walk up to `object` and pick it up.
    PickUp { object: ObjectId },
    /// Walk up to `container` and put the held `object` into it.
    PlaceInContainer {
        object: ObjectId,
        container: ObjectId,
    },
    /// Walk onto `target` and drop the held `object` there.
    DropAt { object: ObjectId, target: TileCoord },
    /// Find objects whose kind is in `kinds` within `area` and place each in
    /// `container`, via pickup/place sub-actions.
    PickUpObjectsInArea {
        area: TileArea,
        kinds: Vec<String>,
        container: ObjectId,
        progress: AreaProgress,
    },
    /// Walk to the nearest empty passable tile in `area`.
    LocateBlankTile { area: TileArea },
    /// Random walk. Never completes.
    Wander { heading: Option<Facing> },
    /// Do nothing. Never completes.
    Wait,
    /// Eat the first held edible item whose kind is in `kinds` (any edible
    /// item when `kinds` is empty).
    EatFromInventory { kinds: Vec<String> },
    /// Dig the diggable ground in front with a held digging tool.
    DigInFront,
    /// Dig in front if needed, put `object` in the hole, fill it in.
    BuryInFront { object: ObjectId },
    /// Post a message to the agent's feed.
    PostFeedUpdate { text: String },
    /// Move `steps_remaining` tiles relative to the current facing.
    MoveRelative {
        direction: MoveDirection,
        steps_remaining: u32,
    },
    RotateTo { facing: Facing },
    /// Completes if the condition holds, fails otherwise.
    CheckCondition { condition: Condition },
}

impl AutopilotKind {
    /// Short name for logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            AutopilotKind::GoTo { .. } => "go-to",
            AutopilotKind::PickUp { .. } => "pick-up",
            AutopilotKind::PlaceInContainer { .. } => "place-in-container",
            AutopilotKind::DropAt { .. } => "drop-at",
            AutopilotKind::PickUpObjectsInArea { .. } => "pick-up-objects-in-area",
            AutopilotKind::LocateBlankTile { .. } => "locate-blank-tile",
            AutopilotKind::Wander { .. } => "wander",
            AutopilotKind::Wait => "wait",
            AutopilotKind::EatFromInventory { .. } => "eat-from-inventory",
            AutopilotKind::DigInFront => "dig-in-front",
            AutopilotKind::BuryInFront { .. } => "bury-in-front",
            AutopilotKind::PostFeedUpdate { .. } => "post-feed-update",
            AutopilotKind::MoveRelative { .. } => "move-relative",
            AutopilotKind::RotateTo { .. } => "rotate-to",
            AutopilotKind::CheckCondition { .. } => "check-condition",
        }
    }

    /// Area pickup goal with a fresh progress record.
    pub fn collect_in_area(
        area: TileArea,
        kinds: &[&str],
        container: ObjectId,
        max_to_take: u32,
    ) -> Self {
        AutopilotKind::PickUpObjectsInArea {
            area,
            kinds: kinds.iter().map(|k| k.to_string()).collect(),
            container,
            progress: AreaProgress::new(max_to_take),
        }
    }
}

/// Data applied to a parent action when a sub-action completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Increment `num_taken` on the area pickup goal stamped `parent`.
    IncrementTaken { parent: u64 },
}

/// A queued goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotAction {
    pub kind: AutopilotKind,
    pub priority: u32,
    /// Stamped by the queue on enqueue.
    pub timestamp: u64,
    pub on_complete: Option<Continuation>,
}

impl AutopilotAction {
    pub fn new(kind: AutopilotKind, priority: u32) -> Self {
        Self {
            kind,
            priority,
            timestamp: 0,
            on_complete: None,
        }
    }

    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.on_complete = Some(continuation);
        self
    }
}

/// Priority-ordered queue of autopilot actions for one agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotQueue {
    actions: Vec<AutopilotAction>,
    next_timestamp: u64,
}

impl AutopilotQueue {
    /// Stamp, append, and re-sort. Returns the stamped timestamp.
    pub fn enqueue(&mut self, mut action: AutopilotAction) -> u64 {
        let ts = self.next_timestamp;
        self.next_timestamp += 1;
        action.timestamp = ts;
        self.actions.push(action);
        self.actions.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.timestamp.cmp(&b.timestamp))
        });
        ts
    }

    /// `true` if any queued action has priority above `threshold`.
    pub fn is_busy(&self, threshold: u32) -> bool {
        self.actions.iter().any(|a| a.priority > threshold)
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn head(&self) -> Option<&AutopilotAction> {
        self.actions.first()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AutopilotAction> {
        self.actions.iter()
    }

    pub fn get(&self, timestamp: u64) -> Option<&AutopilotAction> {
        self.actions.iter().find(|a| a.timestamp == timestamp)
    }

    pub fn get_mut(&mut self, timestamp: u64) -> Option<&mut AutopilotAction> {
        self.actions.iter_mut().find(|a| a.timestamp == timestamp)
    }

    pub fn remove(&mut self, timestamp: u64) -> Option<AutopilotAction> {
        let pos = self.actions.iter().position(|a| a.timestamp == timestamp)?;
        Some(self.actions.remove(pos))
    }

    /// Apply a completed child's continuation to its parent. A parent that
    /// has already left the queue is ignored.
    pub fn apply_continuation(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::IncrementTaken { parent } => {
                if let Some(AutopilotAction {
                    kind: AutopilotKind::PickUpObjectsInArea { progress, .. },
                    ..
                }) = self.get_mut(parent)
                {
                    progress.num_taken += 1;
                }
            }
        }
    }
}

impl World {
    /// Queue a goal for `agent`. Returns the stamped timestamp.
    ///
    /// Priorities are capped at `u32::MAX - subtask_priority_boost` so that
    /// sub-actions of a decomposing goal can always outrank it.
    pub fn enqueue(
        &mut self,
        agent: ObjectId,
        mut action: AutopilotAction,
    ) -> Result<u64, ContainmentError> {
        let ceiling = u32::MAX - self.config.autopilot.subtask_priority_boost;
        if action.priority > ceiling {
            log::debug!(
                "agent {agent} goal priority {} capped at {ceiling}",
                action.priority
            );
            action.priority = ceiling;
        }
        self.enqueue_subtask(agent, action)
    }

    /// Queue without the priority cap. Used for sub-actions pushed by a
    /// decomposing goal.
    pub(crate) fn enqueue_subtask(
        &mut self,
        agent: ObjectId,
        action: AutopilotAction,
    ) -> Result<u64, ContainmentError> {
        let a = self
            .agents
            .get_mut(&agent)
            .ok_or(ContainmentError::NotAnAgent(agent))?;
        let label = action.kind.label();
        let priority = action.priority;
        let ts = a.queue.enqueue(action);
        log::debug!("agent {agent} queued {label} (priority {priority}, ts {ts})");
        Ok(ts)
    }

    /// Drop every queued goal of `agent`.
    pub fn clear_autopilot(&mut self, agent: ObjectId) -> Result<(), ContainmentError> {
        let a = self
            .agents
            .get_mut(&agent)
            .ok_or(ContainmentError::NotAnAgent(agent))?;
        a.queue.clear();
        Ok(())
    }

    /// `true` if `agent` has a goal above the configured busy threshold.
    /// Unknown agents are never busy.
    pub fn is_busy(&self, agent: ObjectId) -> bool {
        let threshold = self.config.autopilot.busy_priority_threshold;
        self.agents
            .get(&agent)
            .is_some_and(|a| a.queue.is_busy(threshold))
    }
}
