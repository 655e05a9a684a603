//! Record events: the payloads stored in journal entries
//!
//! Each variant is bincode-encoded into `JournalEntry::payload`, with the
//! variant name duplicated in `JournalEntry::kind` for inspection tools.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::records::{Account, GradeRecord};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EventCodecError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Entry kind {header} does not match payload {payload}")]
    KindMismatch { header: String, payload: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordEvent {
    AccountRegistered(Account),
    GradeRecorded(GradeRecord),
}

impl RecordEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordEvent::AccountRegistered(_) => "AccountRegistered",
            RecordEvent::GradeRecorded(_) => "GradeRecorded",
        }
    }

    /// Instant the event took effect, in unix nanoseconds.
    pub fn timestamp_nanos(&self) -> i64 {
        let at = match self {
            RecordEvent::AccountRegistered(account) => account.registered_at,
            RecordEvent::GradeRecorded(grade) => grade.recorded_at,
        };
        at.timestamp_nanos_opt().unwrap_or_default()
    }

    pub fn encode(&self) -> Result<Vec<u8>, EventCodecError> {
        bincode::serialize(self).map_err(|e| EventCodecError::Serialization(e.to_string()))
    }

    /// Decode a payload and check it against the entry's kind header.
    pub fn decode(kind: &str, payload: &[u8]) -> Result<Self, EventCodecError> {
        let event: RecordEvent =
            bincode::deserialize(payload).map_err(|e| EventCodecError::Serialization(e.to_string()))?;
        if event.kind() != kind {
            return Err(EventCodecError::KindMismatch {
                header: kind.to_string(),
                payload: event.kind(),
            });
        }
        Ok(event)
    }
}
