//! JSON body extractor that reports bad bodies in the API error envelope.
//!
//! Handlers take `AppJson<T>` instead of `axum::Json<T>` so that a body that
//! fails to deserialize produces a 400 `validation_failed` response naming
//! the offending field, instead of axum's plain-text rejection.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| AppJson(value))
            .map_err(map_json_rejection)
    }
}

pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field = field_from_serde_message(&body_text).unwrap_or_else(|| "body".to_string());

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field),
        received: None,
        docs_hint: Some(
            "Send a JSON body matching the endpoint schema (see /api-doc/openapi.json)."
                .to_string(),
        ),
    }
}

/// Pull the field name out of serde messages such as "missing field `pain_level`".
fn field_from_serde_message(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `", "duplicate field `"]
        .iter()
        .find_map(|pattern| {
            let after = &msg[msg.find(pattern)? + pattern.len()..];
            let end = after.find('`')?;
            Some(after[..end].to_string())
        })
}
