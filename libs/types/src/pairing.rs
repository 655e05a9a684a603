//! Pairing outcomes and waiting-pool snapshots

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{MatchId, ParticipantId};
use crate::topic::Topic;

/// Which side of an evaluation a participant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Waiting to have work evaluated
    Submitter,
    /// Waiting to evaluate someone
    Evaluator,
}

impl Role {
    /// The role whose pool this role is matched against
    pub fn opposite(self) -> Self {
        match self {
            Role::Submitter => Role::Evaluator,
            Role::Evaluator => Role::Submitter,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Submitter => write!(f, "submitter"),
            Role::Evaluator => write!(f, "evaluator"),
        }
    }
}

/// Outcome handed to a participant once its wait ends
///
/// `matched == false` means the wait was cancelled before any counterpart
/// arrived; `counterpart` and `match_id` are then `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingResult {
    pub matched: bool,
    /// Role of the participant receiving this result
    pub role: Role,
    pub counterpart: Option<ParticipantId>,
    pub topic: Option<Topic>,
    pub match_id: Option<MatchId>,
}

impl PairingResult {
    pub fn matched(
        role: Role,
        counterpart: ParticipantId,
        topic: Option<Topic>,
        match_id: MatchId,
    ) -> Self {
        Self {
            matched: true,
            role,
            counterpart: Some(counterpart),
            topic,
            match_id: Some(match_id),
        }
    }

    pub fn cancelled(role: Role, topic: Option<Topic>) -> Self {
        Self {
            matched: false,
            role,
            counterpart: None,
            topic,
            match_id: None,
        }
    }
}

/// Ordered snapshot of both waiting pools, oldest waiter first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub evaluators: Vec<ParticipantId>,
    pub submitters: Vec<ParticipantId>,
}

impl MatchState {
    pub fn is_idle(&self) -> bool {
        self.evaluators.is_empty() && self.submitters.is_empty()
    }
}
