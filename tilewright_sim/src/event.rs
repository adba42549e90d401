// Narrative events emitted by the simulation.
//
// Events are output only: the sim appends them while it runs (feed posts
// from autopilot goals, goal completion/failure, poisoning) and hands them
// back in `StepResult::events`. Nothing inside the sim reads them. A UI or
// the external feed/scoring collaborators consume them.
//
// See also: `sim.rs` for the tick loop that collects events, `world.rs`
// (`World::emit`) for the pending buffer.
//
// **Critical constraint: determinism.** Events are appended in processing
// order, which is itself deterministic, so two runs with the same seed and
// commands produce identical event streams.

use crate::interpreter::ActionStatus;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

/// A narrative event emitted by the simulation for the UI / event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

/// Types of narrative events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// An agent posted to its feed.
    FeedPost { agent: ObjectId, text: String },
    /// An autopilot goal left the queue.
    AutopilotFinished {
        agent: ObjectId,
        label: String,
        status: ActionStatus,
    },
    /// An agent ate something poisonous.
    AgentPoisoned { agent: ObjectId, ticks: u32 },
    /// An agent's poison wore off.
    AgentRecovered { agent: ObjectId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = SimEvent {
            tick: 12,
            kind: SimEventKind::AutopilotFinished {
                agent: ObjectId(3),
                label: "go-to".into(),
                status: ActionStatus::Failed,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let restored: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, restored);
    }
}
