//! Authentication orchestrator
//!
//! Composes the claims verifier, identity resolver, and session codec into
//! the two end-to-end operations the transport layer exposes: exchanging an
//! external identity assertion for a session, and resolving a session token
//! back to a user.

use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::AuthError;
use super::models::{GoogleAuthResponse, User};
use super::resolver::UserRepository;
use super::session::SessionCodec;
use super::verifier::{AssertionVerifier, ClaimsVerifier};
use crate::common::{safe_email_log, AuthConfig};

pub struct AuthService {
    verifier: ClaimsVerifier,
    users: UserRepository,
    codec: SessionCodec,
    session_ttl: Duration,
    expected_audience: String,
}

impl AuthService {
    pub fn new(config: &AuthConfig, db: SqlitePool, primitive: Arc<dyn AssertionVerifier>) -> Self {
        Self {
            verifier: ClaimsVerifier::new(primitive),
            users: UserRepository::new(db),
            codec: SessionCodec::new(&config.jwt_secret, config.jwt_algorithm),
            session_ttl: config.session_ttl,
            expected_audience: config.google_client_id.clone(),
        }
    }

    /// Exchange an external identity assertion for a session token
    ///
    /// Pipeline: verify the assertion, upsert the user record by email,
    /// issue a session token bound to the user's id and email. Each stage
    /// runs only after the previous one succeeded.
    pub async fn exchange_assertion(&self, assertion: &str) -> Result<GoogleAuthResponse, AuthError> {
        let claims = self
            .verifier
            .verify(assertion, &self.expected_audience)
            .await?;

        let user = self.users.resolve_and_upsert(&claims).await?;

        let access_token = self
            .codec
            .issue(&user.id.to_string(), &user.email, self.session_ttl)?;

        info!(
            user_id = user.id,
            email = %safe_email_log(&user.email),
            "User authentication successful"
        );

        Ok(GoogleAuthResponse {
            access_token,
            token_type: "bearer".to_string(),
            user,
        })
    }

    /// Resolve a session token to the user it was issued for
    ///
    /// Invalid, expired, and tampered tokens are indistinguishable, and so
    /// is a structurally valid token whose subject no longer resolves to a
    /// user record: all fail with `Unauthenticated`.
    pub async fn resolve_session(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.codec.validate(token).ok_or(AuthError::Unauthenticated)?;

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            warn!("Session token carries a non-numeric subject");
            AuthError::Unauthenticated
        })?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id, "Session subject no longer resolves to a user");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
