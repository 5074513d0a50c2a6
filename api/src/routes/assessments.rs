use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use rejuuv_core::error::ApiError;
use rejuuv_core::intake::{AssessmentResponse, IntakeData};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/assessments", post(create_assessment))
}

/// Screen an intake and, when it is safe to continue, analyze it
///
/// Safety screening always runs first. A red flag returns the screening result
/// with `blocked: true` and no analysis; otherwise the movement analysis is
/// returned with `blocked: false`. Either way one assessment is stored.
#[utoipa::path(
    post,
    path = "/assessments",
    request_body = IntakeData,
    responses(
        (status = 200, description = "Blocked safety result or analysis", body = AssessmentResponse),
        (status = 400, description = "Invalid intake", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Completion failed", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "intake"
)]
pub async fn create_assessment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(intake): AppJson<IntakeData>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let response = state.pipeline.assess(auth.user_id, intake).await?;
    Ok(Json(response))
}
