use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use rejuuv_core::check_ins::{CheckInResponse, CreateCheckInRequest};
use rejuuv_core::error::ApiError;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/check-ins", post(create_check_in))
}

/// Record a progress check-in and get adjusted recommendations
///
/// `pain_level: 0` is a valid answer. Every missing required field is named in
/// the 400 response.
#[utoipa::path(
    post,
    path = "/check-ins",
    request_body = CreateCheckInRequest,
    responses(
        (status = 200, description = "Adjusted recommendations", body = CheckInResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Completion failed", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "check-ins"
)]
pub async fn create_check_in(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(req): AppJson<CreateCheckInRequest>,
) -> Result<Json<CheckInResponse>, AppError> {
    let response = state.pipeline.record_check_in(auth.user_id, req).await?;
    Ok(Json(response))
}
