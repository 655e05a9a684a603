use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::ids::ParticipantId;
use types::pairing::PairingResult;
use types::topic::Topic;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub subject: String,
}

/// Pairing outcome with the counterpart's display name when known
#[derive(Debug, Clone, Serialize)]
pub struct PairingResponse {
    #[serde(flatten)]
    pub result: PairingResult,
    pub counterpart_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaiterView {
    pub participant: ParticipantId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchStateResponse {
    pub evaluators: Vec<WaiterView>,
    pub submitters: Vec<WaiterView>,
    /// False when the record store could not be reached and only raw ids are shown
    pub names_resolved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeRequest {
    pub submitter: String,
    pub subject: String,
    pub score: u8,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeView {
    pub evaluator: ParticipantId,
    pub subject: Topic,
    /// Catalog code of the subject, absent if it left the catalog
    pub subject_code: Option<u16>,
    pub score: u8,
    pub passed: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
