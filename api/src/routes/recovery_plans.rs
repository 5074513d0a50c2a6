use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use rejuuv_core::error::ApiError;
use rejuuv_core::plans::{CreateRecoveryPlanRequest, RecoveryPlanResponse};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/recovery-plans", post(create_recovery_plan))
}

/// Generate a three-phase recovery plan from an analysis
///
/// The plan is stored as active, phase 1. `id` is `null` when the plan could
/// not be saved; the generated content is returned regardless.
#[utoipa::path(
    post,
    path = "/recovery-plans",
    request_body = CreateRecoveryPlanRequest,
    responses(
        (status = 200, description = "Generated plan", body = RecoveryPlanResponse),
        (status = 400, description = "Missing analysis or intake data", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Completion failed", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "plans"
)]
pub async fn create_recovery_plan(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(req): AppJson<CreateRecoveryPlanRequest>,
) -> Result<Json<RecoveryPlanResponse>, AppError> {
    let response = state.pipeline.create_recovery_plan(auth.user_id, req).await?;
    Ok(Json(response))
}
