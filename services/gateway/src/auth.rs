use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use types::ids::ParticipantId;

/// Header carrying the platform-assigned participant id
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// The participant a command is issued for.
///
/// The chat platform relays the user's stable id in `X-Participant-Id`. When
/// a platform token is configured, the relay must also present it as
/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Participant(pub ParticipantId);

impl FromRequestParts<AppState> for Participant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(expected) = state.config.platform_token.as_deref() {
            let presented = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            if presented != Some(expected) {
                return Err(AppError::Unauthorized("Missing or invalid platform token".to_string()));
            }
        }

        let raw = parts
            .headers
            .get(PARTICIPANT_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-Participant-Id header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-Participant-Id header".to_string()))?;

        let participant = ParticipantId::try_new(raw)?;
        state.rate_limiter.check(&participant)?;
        Ok(Participant(participant))
    }
}
