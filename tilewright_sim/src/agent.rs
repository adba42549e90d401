// Agent-only state.
//
// An agent is a `GameObject` (kind `"agent"`, a container whose contents are
// its inventory, impassable) plus an `Agent` entry in the world's side
// table keyed by the same `ObjectId`. The side table holds everything the
// object model has no slot for: facing, the autopilot queue, door
// bookkeeping used by navigation, the dialog flag, the poison counter, and
// the action history.
//
// See also: `world.rs` (`World::spawn_agent`), `navigation.rs` for the door
// fields, `autopilot.rs` for the queue.

use crate::autopilot::AutopilotQueue;
use crate::history::ActionHistory;
use crate::types::{Facing, ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: ObjectId,
    pub facing: Facing,
    pub queue: AutopilotQueue,
    /// A door this agent opened while navigating and still has to close.
    pub door_to_close: Option<ObjectId>,
    /// Forward steps taken since `door_to_close` was opened.
    pub steps_since_door_open: u32,
    /// Consecutive navigation ticks spent waiting behind another agent.
    #[serde(default)]
    pub blocked_ticks: u32,
    /// While set, the autopilot queue is not advanced.
    pub in_dialog: bool,
    /// Remaining poisoned ticks. Zero means healthy.
    pub poison_counter: u32,
    pub history: ActionHistory,
}

impl Agent {
    pub fn new(id: ObjectId, facing: Facing) -> Self {
        Self {
            id,
            facing,
            queue: AutopilotQueue::default(),
            door_to_close: None,
            steps_since_door_open: 0,
            blocked_ticks: 0,
            in_dialog: false,
            poison_counter: 0,
            history: ActionHistory::default(),
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison_counter > 0
    }

    /// Per-tick built-in update. Returns `true` on the tick the poison wears
    /// off.
    pub(crate) fn tick_poison(&mut self) -> bool {
        if self.poison_counter == 0 {
            return false;
        }
        self.poison_counter -= 1;
        self.poison_counter == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poison_wears_off() {
        let mut agent = Agent::new(ObjectId(1), Facing::North);
        assert!(!agent.tick_poison());
        agent.poison_counter = 2;
        assert!(agent.is_poisoned());
        assert!(!agent.tick_poison());
        assert!(agent.tick_poison());
        assert!(!agent.is_poisoned());
    }
}
