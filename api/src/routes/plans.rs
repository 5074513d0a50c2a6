use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use rejuuv_core::error::ApiError;
use rejuuv_core::plans::{PlanDetailResponse, PlansResponse};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(get_plan))
}

/// List the caller's recovery plans, newest first
#[utoipa::path(
    get,
    path = "/plans",
    responses(
        (status = 200, description = "Plans owned by the caller", body = PlansResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "plans"
)]
pub async fn list_plans(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<PlansResponse>, AppError> {
    Ok(Json(state.pipeline.list_plans(auth.user_id).await?))
}

/// Get one recovery plan with its check-in history
///
/// Plans owned by other users are reported as not found.
#[utoipa::path(
    get,
    path = "/plans/{id}",
    params(
        ("id" = Uuid, Path, description = "Recovery plan id")
    ),
    responses(
        (status = 200, description = "Plan and check-ins, newest first", body = PlanDetailResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Plan not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "plans"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<PlanDetailResponse>, AppError> {
    // A malformed id cannot name an existing plan.
    let plan_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound {
        resource: "Plan".to_string(),
    })?;
    Ok(Json(state.pipeline.plan_detail(auth.user_id, plan_id).await?))
}
