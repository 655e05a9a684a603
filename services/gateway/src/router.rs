use crate::handlers::{accounts, grades, matching, subjects};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/submissions",
            post(matching::submit).delete(matching::cancel_submission),
        )
        .route(
            "/evaluations",
            post(matching::register).delete(matching::cancel_registration),
        )
        .route("/match-state", get(matching::match_state))
        .route("/subjects", get(subjects::list_subjects))
        .route("/accounts", post(accounts::sign_up))
        .route("/accounts/me/grades", get(accounts::my_grades))
        .route("/grades", post(grades::record_grade));

    Router::new()
        .route("/health", get(subjects::health))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
