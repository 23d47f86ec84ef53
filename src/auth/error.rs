// src/auth/error.rs
//! Error taxonomy for the authentication pipeline
//!
//! Internal variants carry the underlying reason for logging; the
//! translation to `ApiError` deliberately flattens them to generic
//! client-facing messages so callers cannot probe which stage rejected
//! them. The one exception is a missing required claim, which names the
//! claim since that reveals nothing sensitive.

use thiserror::Error;

use crate::common::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The external identity assertion failed verification (bad signature,
    /// wrong audience, expired, unparsable, or the verification call itself
    /// failed). Fail closed: transport errors land here too.
    #[error("invalid identity assertion: {0}")]
    InvalidAssertion(String),

    /// The assertion verified but lacks a claim we cannot authenticate
    /// without.
    #[error("assertion missing required claim: {0}")]
    MissingClaim(&'static str),

    /// Session token missing, malformed, expired, signed with another key,
    /// or bound to a subject that no longer resolves to a user.
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session token issuance failed: {0}")]
    TokenIssuance(#[from] jsonwebtoken::errors::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidAssertion(_) => {
                ApiError::Unauthorized("Invalid or expired Google token".to_string())
            }
            AuthError::MissingClaim(claim) => {
                ApiError::BadRequest(format!("{} not found in Google token", claim))
            }
            AuthError::Unauthenticated => {
                ApiError::Unauthorized("Invalid or expired session".to_string())
            }
            AuthError::Database(e) => ApiError::DatabaseError(e),
            AuthError::TokenIssuance(_) => ApiError::InternalServer(
                "Authentication failed. Please try again later.".to_string(),
            ),
        }
    }
}
