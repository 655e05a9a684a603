use crate::auth::Participant;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::{GradeView, SignUpRequest};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use types::records::Account;

pub async fn sign_up(
    State(state): State<AppState>,
    Participant(participant): Participant,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let store = state.store.clone();
    // Journal appends fsync, keep them off the async workers
    let account = tokio::task::spawn_blocking(move || store.sign_up(&participant, &payload.name))
        .await
        .map_err(anyhow::Error::from)??;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Grades the caller received, oldest first.
pub async fn my_grades(
    State(state): State<AppState>,
    Participant(participant): Participant,
) -> Result<Json<Vec<GradeView>>, AppError> {
    let grades = state.store.grades_for(&participant)?;
    let views = grades
        .into_iter()
        .map(|grade| GradeView {
            subject_code: state.catalog.by_name(grade.topic.as_str()).map(|s| s.code),
            evaluator: grade.evaluator,
            subject: grade.topic,
            score: grade.score,
            passed: grade.passed,
            recorded_at: grade.recorded_at,
        })
        .collect();
    Ok(Json(views))
}
