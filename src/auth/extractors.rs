//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::models::User;
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated user extractor
///
/// Resolves the `Authorization: Bearer <token>` header to a user record via
/// the session pipeline. Missing header, malformed header, bad token, and
/// stale subject all reject with the same 401.
#[derive(Debug)]
pub struct AuthedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match header.and_then(bearer_token) {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing or malformed Authorization header");
                return Err(ApiError::Unauthorized(
                    "Invalid or expired session".to_string(),
                ));
            }
        };

        let user = app_state.auth.resolve_session(token).await?;

        debug!(
            user_id = user.id,
            email = %safe_email_log(&user.email),
            "User authenticated via session token"
        );

        Ok(AuthedUser(user))
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
