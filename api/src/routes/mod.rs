pub mod assessments;
pub mod body_areas;
pub mod check_ins;
pub mod health;
pub mod plans;
pub mod recovery_plans;

use axum::Router;

use crate::state::AppState;

/// Endpoints that call the completion service.
pub fn completion_router() -> Router<AppState> {
    Router::new()
        .merge(assessments::router())
        .merge(recovery_plans::router())
        .merge(check_ins::router())
}

/// Read-only endpoints backed by the store.
pub fn read_router() -> Router<AppState> {
    Router::new()
        .merge(plans::router())
        .merge(body_areas::router())
}
