use crate::auth::Participant;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::{MatchStateResponse, PairingResponse, SubmitRequest, WaiterView};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::future::Future;
use tracing::{info, warn};
use types::errors::{EngineError, StoreError};
use types::ids::ParticipantId;
use types::pairing::PairingResult;

/// Long-poll until a counterpart arrives or the submission is cancelled.
pub async fn submit(
    State(state): State<AppState>,
    Participant(participant): Participant,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<PairingResponse>, AppError> {
    let topic = state.catalog.topic(&payload.subject)?;
    info!(participant = %participant, topic = %topic, "submission received");

    let result = await_pairing(&state, state.engine.submit(participant, topic)).await?;
    Ok(Json(annotate(&state, result)))
}

pub async fn cancel_submission(
    State(state): State<AppState>,
    Participant(participant): Participant,
) -> Result<StatusCode, AppError> {
    state.engine.cancel_submission(&participant)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Long-poll until a submitter is assigned or the registration is cancelled.
pub async fn register(
    State(state): State<AppState>,
    Participant(participant): Participant,
) -> Result<Json<PairingResponse>, AppError> {
    info!(participant = %participant, "evaluator registered");

    let result = await_pairing(&state, state.engine.register(participant)).await?;
    Ok(Json(annotate(&state, result)))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    Participant(participant): Participant,
) -> Result<StatusCode, AppError> {
    state.engine.cancel_registration(&participant)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Both pools, oldest first, with display names when the store answers.
pub async fn match_state(
    State(state): State<AppState>,
    Participant(_): Participant,
) -> Result<Json<MatchStateResponse>, AppError> {
    let snapshot = state.engine.match_state();

    let resolved = resolve_views(&state, &snapshot.evaluators)
        .and_then(|evaluators| Ok((evaluators, resolve_views(&state, &snapshot.submitters)?)));

    let response = match resolved {
        Ok((evaluators, submitters)) => MatchStateResponse {
            evaluators,
            submitters,
            names_resolved: true,
        },
        Err(e) => {
            warn!(error = %e, "record store unavailable, showing raw participant ids");
            MatchStateResponse {
                evaluators: raw_views(snapshot.evaluators),
                submitters: raw_views(snapshot.submitters),
                names_resolved: false,
            }
        }
    };
    Ok(Json(response))
}

/// Await a pairing, bounded by the configured maximum wait.
///
/// On timeout the pairing future is dropped, which withdraws the waiting entry.
async fn await_pairing<F>(state: &AppState, pairing: F) -> Result<PairingResult, AppError>
where
    F: Future<Output = Result<PairingResult, EngineError>>,
{
    match state.config.max_wait {
        None => Ok(pairing.await?),
        Some(limit) => match tokio::time::timeout(limit, pairing).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::Timeout(format!(
                "no counterpart arrived within {}s",
                limit.as_secs()
            ))),
        },
    }
}

fn annotate(state: &AppState, result: PairingResult) -> PairingResponse {
    let counterpart_name = result.counterpart.as_ref().and_then(|counterpart| {
        state.store.resolve_name(counterpart).unwrap_or_else(|e| {
            warn!(participant = %counterpart, error = %e, "could not resolve counterpart name");
            None
        })
    });
    PairingResponse {
        result,
        counterpart_name,
    }
}

fn resolve_views(state: &AppState, ids: &[ParticipantId]) -> Result<Vec<WaiterView>, StoreError> {
    ids.iter()
        .map(|id| {
            Ok(WaiterView {
                participant: id.clone(),
                name: state.store.resolve_name(id)?,
            })
        })
        .collect()
}

fn raw_views(ids: Vec<ParticipantId>) -> Vec<WaiterView> {
    ids.into_iter()
        .map(|participant| WaiterView { participant, name: None })
        .collect()
}
