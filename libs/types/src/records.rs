//! Account and grade records kept by the record store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ParticipantId;
use crate::topic::Topic;

/// Highest score an evaluator may award
pub const MAX_SCORE: u8 = 100;

/// Registered participant with its display name (intra login)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub participant: ParticipantId,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// One evaluation outcome, appended once and never rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub submitter: ParticipantId,
    pub evaluator: ParticipantId,
    pub topic: Topic,
    pub score: u8,
    pub passed: bool,
    pub recorded_at: DateTime<Utc>,
}
