use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use types::topic::SubjectInfo;

pub async fn list_subjects(State(state): State<AppState>) -> Json<Vec<SubjectInfo>> {
    Json(state.catalog.iter().cloned().collect())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
