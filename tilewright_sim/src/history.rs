// Per-agent action history.
//
// An append-only log of every primitive action an agent attempted, with the
// tick, the action kind, snapshots of up to two argument objects, and the
// outcome. Records are never mutated after being pushed. Argument snapshots
// copy the object's kind and name so queries still work after the object is
// gone (an eaten mushroom, a deleted key).
//
// Consumers outside the core (task scoring) use the query methods to ask
// things like "did the agent eat a mushroom on the preceding tick".
//
// See also: `action.rs` which appends a record for every primitive action,
// `agent.rs` which owns one `ActionHistory` per agent.

use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

/// Which primitive action a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Rotate,
    Teleport,
    PickUp,
    Drop,
    PutInto,
    Throw,
    OpenClose,
    ActivateDeactivate,
    Eat,
    Read,
    UseOn,
}

/// Snapshot of an argument object at the time of the action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSnapshot {
    pub id: ObjectId,
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub tick: u64,
    pub kind: ActionKind,
    pub arg1: Option<ArgSnapshot>,
    pub arg2: Option<ArgSnapshot>,
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHistory {
    records: Vec<ActionRecord>,
}

fn arg_matches_id(arg: &Option<ArgSnapshot>, want: Option<ObjectId>) -> bool {
    match want {
        None => true,
        Some(id) => arg.as_ref().is_some_and(|a| a.id == id),
    }
}

fn arg_matches_kind(arg: &Option<ArgSnapshot>, want: Option<&str>) -> bool {
    match want {
        None => true,
        Some(kind) => arg.as_ref().is_some_and(|a| a.kind == kind),
    }
}

impl ActionHistory {
    pub fn push(&mut self, record: ActionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Records of `kind` whose arguments match. `None` matches anything.
    pub fn query_by_type_and_args(
        &self,
        kind: ActionKind,
        arg1: Option<ObjectId>,
        arg2: Option<ObjectId>,
    ) -> Vec<&ActionRecord> {
        self.records
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| arg_matches_id(&r.arg1, arg1) && arg_matches_id(&r.arg2, arg2))
            .collect()
    }

    /// Like `query_by_type_and_args`, matching argument object kinds.
    pub fn query_by_type_and_arg_kinds(
        &self,
        kind: ActionKind,
        kind1: Option<&str>,
        kind2: Option<&str>,
    ) -> Vec<&ActionRecord> {
        self.records
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| arg_matches_kind(&r.arg1, kind1) && arg_matches_kind(&r.arg2, kind2))
            .collect()
    }

    /// The most recent record.
    pub fn last_step_action(&self) -> Option<&ActionRecord> {
        self.records.last()
    }

    pub fn actions_on_tick(&self, tick: u64) -> Vec<&ActionRecord> {
        // Records are appended in tick order.
        let start = self.records.partition_point(|r| r.tick < tick);
        self.records[start..]
            .iter()
            .take_while(|r| r.tick == tick)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(id: u32, kind: &str) -> Option<ArgSnapshot> {
        Some(ArgSnapshot {
            id: ObjectId(id),
            kind: kind.into(),
            name: kind.into(),
        })
    }

    fn record(tick: u64, kind: ActionKind, arg1: Option<ArgSnapshot>) -> ActionRecord {
        ActionRecord {
            tick,
            kind,
            arg1,
            arg2: None,
            success: true,
            message: String::new(),
        }
    }

    fn sample() -> ActionHistory {
        let mut h = ActionHistory::default();
        h.push(record(1, ActionKind::PickUp, snap(5, "mushroom")));
        h.push(record(2, ActionKind::Move, None));
        h.push(record(2, ActionKind::Eat, snap(5, "mushroom")));
        h.push(record(4, ActionKind::Eat, snap(8, "apple")));
        h
    }

    #[test]
    fn query_with_wildcards() {
        let h = sample();
        assert_eq!(h.query_by_type_and_args(ActionKind::Eat, None, None).len(), 2);
        assert_eq!(
            h.query_by_type_and_args(ActionKind::Eat, Some(ObjectId(5)), None)
                .len(),
            1
        );
        assert!(
            h.query_by_type_and_args(ActionKind::Eat, None, Some(ObjectId(5)))
                .is_empty()
        );
    }

    #[test]
    fn query_by_arg_kind() {
        let h = sample();
        let eaten = h.query_by_type_and_arg_kinds(ActionKind::Eat, Some("mushroom"), None);
        assert_eq!(eaten.len(), 1);
        assert_eq!(eaten[0].tick, 2);
    }

    #[test]
    fn actions_on_tick_and_last() {
        let h = sample();
        assert_eq!(h.actions_on_tick(2).len(), 2);
        assert!(h.actions_on_tick(3).is_empty());
        assert_eq!(h.last_step_action().map(|r| r.tick), Some(4));
    }
}
