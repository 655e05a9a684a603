//! Identifier types for participants and pairings
//!
//! Participant identifiers are assigned by the chat platform and are never
//! generated here. Pairings get a UUID v7 so both sides of a match, and any
//! grade recorded later, can be correlated in chronological order.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::IdError;

/// Maximum accepted length of a participant identifier, in bytes.
pub const MAX_PARTICIPANT_ID_LEN: usize = 64;

/// Opaque identifier of a person taking part in evaluations
///
/// Stable across sessions. Two values are the same participant exactly when
/// their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant id, rejecting blank or oversized values.
    pub fn try_new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() > MAX_PARTICIPANT_ID_LEN {
            return Err(IdError::TooLong {
                len: trimmed.len(),
                max: MAX_PARTICIPANT_ID_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

/// Unique identifier for a formed pairing
///
/// Both the submitter and the evaluator receive the same `MatchId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_trims_whitespace() {
        let id = ParticipantId::try_new("  123456789012345678 ").unwrap();
        assert_eq!(id.as_str(), "123456789012345678");
    }

    #[test]
    fn test_participant_id_rejects_blank() {
        assert_eq!(ParticipantId::try_new("   "), Err(IdError::Empty));
        assert_eq!(ParticipantId::try_new(""), Err(IdError::Empty));
    }

    #[test]
    fn test_participant_id_rejects_oversized() {
        let long = "x".repeat(MAX_PARTICIPANT_ID_LEN + 1);
        assert!(matches!(
            ParticipantId::try_new(long),
            Err(IdError::TooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn test_participant_id_serialization() {
        let id = ParticipantId::try_new("u1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u1\"");

        let bad: Result<ParticipantId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_match_id_creation() {
        let id1 = MatchId::new();
        let id2 = MatchId::new();
        assert_ne!(id1, id2, "MatchIds should be unique");
    }

    #[test]
    fn test_match_id_serialization() {
        let id = MatchId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: MatchId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
