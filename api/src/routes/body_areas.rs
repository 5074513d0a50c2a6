use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use rejuuv_core::intake::BodyArea;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/body-areas", get(list_body_areas))
}

/// Body areas selectable on the first intake screen
///
/// Always succeeds: when no configuration can be loaded the built-in list is
/// returned.
#[utoipa::path(
    get,
    path = "/body-areas",
    responses(
        (status = 200, description = "Active body areas in display order", body = Vec<BodyArea>)
    ),
    tag = "intake"
)]
pub async fn list_body_areas(State(state): State<AppState>) -> Json<Vec<BodyArea>> {
    Json(state.pipeline.body_areas().await)
}
