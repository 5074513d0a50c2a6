use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tower::{Layer, Service, ServiceExt};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::error::AppError;
use crate::state::AppState;

/// User resolved from the `Authorization: Bearer <token>` header.
///
/// Resolution happens once per request in `InjectAuthLayer`; the extractor
/// reads the result from request extensions and only falls back to resolving
/// the token itself when the layer did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Maps a bearer token to a stable user id.
///
/// Missing, malformed, expired, or unknown tokens resolve to `None`; this is
/// never an error.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<Uuid>;
}

pub fn build_identity_provider(
    config: &IdentityConfig,
) -> Result<Arc<dyn IdentityProvider>, reqwest::Error> {
    let provider: Arc<dyn IdentityProvider> = match config {
        IdentityConfig::Jwt { secret, audience } => {
            Arc::new(JwtIdentityProvider::new(secret, audience))
        }
        IdentityConfig::Remote { auth_url, api_key } => {
            Arc::new(RemoteIdentityProvider::new(auth_url, api_key)?)
        }
    };
    Ok(provider)
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    sub: String,
}

/// Verifies HS256 session tokens locally with the project JWT secret.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, token: &str) -> Option<Uuid> {
        let data = match jsonwebtoken::decode::<AccessTokenClaims>(token, &self.key, &self.validation)
        {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                return None;
            }
        };
        Uuid::parse_str(&data.claims.sub).ok()
    }
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
}

/// Asks the hosted auth service which user a token belongs to.
pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(auth_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            user_url: format!("{auth_url}/auth/v1/user"),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn resolve(&self, token: &str) -> Option<Uuid> {
        let response = self
            .http
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Auth service rejected bearer token");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auth service request failed");
                return None;
            }
        };

        response.json::<RemoteUser>().await.ok().map(|user| user.id)
    }
}

/// Bearer token from the Authorization header, if the header uses the Bearer scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Marks a request whose bearer token the auth layer already failed to resolve.
#[derive(Debug, Clone, Copy)]
struct RejectedToken;

// --- Tower Layer/Service for auth injection ---

/// Tower Layer that injects `AuthenticatedUser` into request extensions.
/// Requests without a valid token pass through without a user; a token that
/// did not resolve is marked so the extractor does not look it up again.
#[derive(Clone)]
pub struct InjectAuthLayer {
    identity: Arc<dyn IdentityProvider>,
}

impl InjectAuthLayer {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }
}

impl<S> Layer<S> for InjectAuthLayer {
    type Service = InjectAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InjectAuthService {
            inner,
            identity: self.identity.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InjectAuthService<S> {
    inner: S,
    identity: Arc<dyn IdentityProvider>,
}

impl<S> Service<Request> for InjectAuthService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);
        let identity = self.identity.clone();

        // Headers are read before the future so the body never crosses an await.
        let token = bearer_token(req.headers()).map(str::to_owned);

        Box::pin(async move {
            if let Some(token) = token {
                match identity.resolve(&token).await {
                    Some(user_id) => {
                        req.extensions_mut().insert(AuthenticatedUser { user_id });
                    }
                    None => {
                        req.extensions_mut().insert(RejectedToken);
                    }
                }
            }
            Ok(ready.oneshot(req).await.into_response())
        })
    }
}

// --- Extractor (used by handlers) ---

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(*user);
        }
        if parts.extensions.get::<RejectedToken>().is_some() {
            return Err(AppError::unauthorized());
        }

        let token = bearer_token(&parts.headers).ok_or_else(AppError::unauthorized)?;
        let user_id = state
            .identity
            .resolve(token)
            .await
            .ok_or_else(AppError::unauthorized)?;
        Ok(AuthenticatedUser { user_id })
    }
}
