use crate::auth::Participant;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::GradeRequest;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use tracing::info;
use types::ids::ParticipantId;
use types::records::GradeRecord;

/// Record a grade authored by the calling evaluator.
pub async fn record_grade(
    State(state): State<AppState>,
    Participant(evaluator): Participant,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<StatusCode, AppError> {
    let submitter = ParticipantId::try_new(payload.submitter)
        .map_err(|e| AppError::bad_request(format!("Invalid submitter: {}", e)))?;
    let grade = GradeRecord {
        submitter,
        evaluator,
        topic: state.catalog.topic(&payload.subject)?,
        score: payload.score,
        passed: payload.passed,
        recorded_at: Utc::now(),
    };
    info!(
        submitter = %grade.submitter,
        evaluator = %grade.evaluator,
        topic = %grade.topic,
        score = grade.score,
        "grade submitted"
    );

    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.append_grade(grade))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(StatusCode::CREATED)
}
