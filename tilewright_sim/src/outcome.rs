// Structured result of a primitive action.
//
// Every primitive action returns exactly one `ActionOutcome`: success flag,
// a human-readable message, an importance level for the UI, and a small
// typed payload (`OutcomeData`) for the cases that produce more than a
// message: objects revealed by a tool, the object blocking a move, text read
// from a sign.
//
// Failures are outcomes too. `ActionOutcome::failed` builds one from an
// `ActionError`, carrying its message and, for movement failures, the
// blocking object.
//
// See also: `action.rs` which produces outcomes, `history.rs` which records
// them.

use crate::error::ActionError;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

/// Extra data attached to an outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeData {
    /// Objects that became visible, e.g. the contents of a freshly dug hole.
    pub revealed: Vec<ObjectId>,
    /// The object that prevented a move.
    pub blocking: Option<ObjectId>,
    /// Text produced by the action (a sign's contents, an inspected value).
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub importance: Importance,
    pub data: OutcomeData,
}

impl ActionOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            importance: Importance::Normal,
            data: OutcomeData::default(),
        }
    }

    pub fn failed(err: &ActionError) -> Self {
        let blocking = match err {
            ActionError::NotPassable { blocker, .. } => Some(*blocker),
            _ => None,
        };
        Self {
            success: false,
            message: err.to_string(),
            importance: Importance::Low,
            data: OutcomeData {
                blocking,
                ..OutcomeData::default()
            },
        }
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_data(mut self, data: OutcomeData) -> Self {
        self.data = data;
        self
    }
}
