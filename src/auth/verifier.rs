//! Identity claims verification
//!
//! Splits assertion handling in two: an [`AssertionVerifier`] primitive that
//! checks the token against the identity provider and returns the raw
//! verified claim payload, and a [`ClaimsVerifier`] that wraps the primitive
//! and extracts a typed [`IdentityClaims`] with email as the mandatory key.
//! The orchestrator only ever sees the typed claims.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::error::AuthError;
use super::models::IdentityClaims;

/// Google's ID token introspection endpoint
/// Docs: https://developers.google.com/identity/sign-in/web/backend-auth
const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// HTTP timeout for the verification call. A timeout is treated as a
/// rejection, never as success.
const VERIFY_TIMEOUT_SECS: u64 = 10;

/// Failure modes of the verification primitive
///
/// Both variants translate to `InvalidAssertion` at the claims-verifier
/// boundary (fail closed); they stay distinct so logs can tell a rejected
/// token from an unreachable provider.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("assertion rejected: {0}")]
    Rejected(String),

    #[error("verification service unavailable: {0}")]
    Unavailable(String),
}

/// External verification primitive: given a raw assertion and the audience
/// it must have been minted for, return the validated claim payload or fail.
#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    async fn verify(&self, assertion: &str, expected_audience: &str)
        -> Result<Value, VerifierError>;
}

/// Verifies Google ID tokens against the tokeninfo endpoint
pub struct GoogleTokenInfoVerifier {
    http: Client,
}

impl GoogleTokenInfoVerifier {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(VERIFY_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for GoogleTokenInfoVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssertionVerifier for GoogleTokenInfoVerifier {
    async fn verify(
        &self,
        assertion: &str,
        expected_audience: &str,
    ) -> Result<Value, VerifierError> {
        debug!("Validating identity assertion with Google tokeninfo endpoint");

        let resp = self
            .http
            .get(TOKENINFO_ENDPOINT)
            .query(&[("id_token", assertion)])
            .send()
            .await
            .map_err(|e| VerifierError::Unavailable(format!("tokeninfo request failed: {}", e)))?;

        let status = resp.status();
        debug!(http_status = %status, "Received response from Google tokeninfo endpoint");

        if !status.is_success() {
            // Google answers 400 for malformed and 401 for expired/invalid
            // tokens; either way the assertion is no good.
            return Err(VerifierError::Rejected(format!(
                "tokeninfo returned status {}",
                status
            )));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| VerifierError::Rejected(format!("malformed tokeninfo response: {}", e)))?;

        validate_payload(&payload, expected_audience)?;

        Ok(payload)
    }
}

/// Check expiry and audience on a verified claim payload
///
/// tokeninfo already validates the signature; expiry and audience are
/// re-checked here so a cached or mis-audienced response can never pass.
fn validate_payload(payload: &Value, expected_audience: &str) -> Result<(), VerifierError> {
    if let Some(exp) = payload.get("exp").and_then(claim_as_i64) {
        let now = Utc::now().timestamp();
        if exp < now {
            return Err(VerifierError::Rejected(format!(
                "token expired at {} (now {})",
                exp, now
            )));
        }
    }

    match payload.get("aud").and_then(|v| v.as_str()) {
        Some(aud) if aud == expected_audience => Ok(()),
        Some(aud) => Err(VerifierError::Rejected(format!(
            "audience mismatch: token minted for {}",
            aud
        ))),
        None => Err(VerifierError::Rejected("token missing audience".to_string())),
    }
}

/// tokeninfo serves numeric claims as strings; accept both encodings
fn claim_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Identity claims verifier: primitive verification plus typed extraction
pub struct ClaimsVerifier {
    primitive: Arc<dyn AssertionVerifier>,
}

impl ClaimsVerifier {
    pub fn new(primitive: Arc<dyn AssertionVerifier>) -> Self {
        Self { primitive }
    }

    /// Verify an assertion and extract normalized identity claims
    ///
    /// Any primitive failure becomes `InvalidAssertion` with the reason
    /// logged here and nowhere else. A verified assertion without an email
    /// claim fails with `MissingClaim("email")`.
    pub async fn verify(
        &self,
        assertion: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaims, AuthError> {
        let payload = self
            .primitive
            .verify(assertion, expected_audience)
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity assertion verification failed");
                AuthError::InvalidAssertion(e.to_string())
            })?;

        extract_claims(&payload)
    }
}

/// Build typed claims from a verified payload; email is mandatory
fn extract_claims(payload: &Value) -> Result<IdentityClaims, AuthError> {
    let string_claim =
        |key: &str| payload.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let email = match string_claim("email") {
        Some(email) if !email.is_empty() => email,
        _ => {
            warn!("Assertion verified but carries no email claim");
            return Err(AuthError::MissingClaim("Email"));
        }
    };

    Ok(IdentityClaims {
        subject: string_claim("sub"),
        email,
        given_name: string_claim("given_name"),
        family_name: string_claim("family_name"),
        picture: string_claim("picture"),
    })
}
