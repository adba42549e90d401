// Commands that mutate simulation state from outside.
//
// User-controlled agents act through `SimCommand`s handed to
// `World::step()`. Each command names the acting agent and a `SimAction`:
// either one primitive action (applied immediately, producing an
// `ActionOutcome`), or a change to the agent's autopilot state (enqueue a
// goal, clear the queue, enter or leave dialog).
//
// Commands are applied in slice order, before any object ticks or autopilot
// steps of that tick.
//
// See also: `sim.rs` for `apply_command()` which dispatches these,
// `action.rs` for the primitive actions, `autopilot.rs` for the queue.
//
// **Critical constraint: determinism.** Commands are the sole external
// input to the sim.

use crate::autopilot::AutopilotAction;
use crate::types::{Facing, MoveDirection, ObjectId, Rotation, TileCoord};
use serde::{Deserialize, Serialize};

/// A command issued on behalf of one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCommand {
    pub agent: ObjectId,
    pub action: SimAction,
}

impl SimCommand {
    pub fn new(agent: ObjectId, action: SimAction) -> Self {
        Self { agent, action }
    }
}

/// The specific action a command performs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimAction {
    Move { direction: MoveDirection },
    Rotate { rotation: Rotation },
    RotateTo { facing: Facing },
    TeleportTo { coord: TileCoord },
    TeleportToObject { object: ObjectId },
    PickUp { object: ObjectId },
    Drop { object: ObjectId },
    PutInto { object: ObjectId, container: ObjectId },
    Throw { object: ObjectId },
    OpenClose { object: ObjectId, open: bool },
    ActivateDeactivate { object: ObjectId, active: bool },
    Eat { object: ObjectId },
    Read { object: ObjectId },
    UseOn { tool: ObjectId, target: ObjectId },
    /// Queue an autopilot goal.
    Enqueue { action: AutopilotAction },
    /// Drop every queued goal.
    ClearAutopilot,
    /// Enter (`true`) or leave a dialog. The queue is frozen while in one.
    SetDialog { in_dialog: bool },
}
