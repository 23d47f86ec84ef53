//! Session token codec
//!
//! Issues and validates the locally signed bearer tokens that stand in for
//! a verified identity on subsequent requests. Tokens are stateless: a
//! token's validity is wholly reconstructable from its signature and the
//! embedded expiry, so there is no server-side session table and no
//! revocation path. Expiry is the only way out of validity.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

use super::models::SessionClaims;

/// Creates and validates session tokens with a process-wide symmetric key
///
/// The key and algorithm are injected at construction and fixed for the
/// process lifetime.
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl SessionCodec {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
        }
    }

    /// Issue a token binding `subject` and `email`, expiring at now + ttl
    pub fn issue(
        &self,
        subject: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + ttl).timestamp() as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
    }

    /// Validate a token and return its claims, or `None`
    ///
    /// Malformed structure, signature mismatch, past expiry, and decoding
    /// errors are indistinguishable to the caller: a token is either usable
    /// or it is not.
    ///
    /// Expiry has second granularity and the expiry second itself still
    /// validates (`exp == now` passes, `exp < now` does not), matching the
    /// underlying JWT check.
    pub fn validate(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(self.algorithm);
        // No leeway: a token is invalid the instant its expiry passes.
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Session token validation failed");
                None
            }
        }
    }
}
