//! Authentication handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::extractors::AuthedUser;
use super::models::{GoogleAuthResponse, GoogleTokenRequest, User};
use crate::common::{ApiError, AppState};

/// POST /auth/google
/// Exchanges a Google ID token for a locally issued session token
///
/// # Request Body
/// ```json
/// {
///   "token": "<google id token>"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "access_token": "<session token>",
///   "token_type": "bearer",
///   "user": { ... }
/// }
/// ```
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Result<Json<GoogleTokenRequest>, JsonRejection>,
) -> Result<Json<GoogleAuthResponse>, ApiError> {
    info!("Received Google auth request");

    // A body without a token field is a 400, not axum's default 422
    let Json(payload) =
        payload.map_err(|_| ApiError::BadRequest("token is required".to_string()))?;

    if payload.token.trim().is_empty() {
        return Err(ApiError::BadRequest("token must not be empty".to_string()));
    }

    let state = state_lock.read().await.clone();
    let response = state.auth.exchange_assertion(&payload.token).await?;

    Ok(Json(response))
}

/// GET /auth/me
/// Returns the current authenticated user's information
pub async fn me_handler(AuthedUser(user): AuthedUser) -> Json<User> {
    Json(user)
}
