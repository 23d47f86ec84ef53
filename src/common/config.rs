// src/common/config.rs
//! Process configuration for the authentication core
//!
//! Everything the session codec and orchestrator need (signing secret,
//! algorithm, session TTL, expected audience) is collected here once at
//! startup and passed in at construction time. Nothing deeper in the call
//! graph reads environment variables.

use anyhow::{anyhow, bail, Result};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;

/// Placeholder secret used when JWT_SECRET is unset. Accepted in development,
/// rejected when ENVIRONMENT=production.
pub const INSECURE_DEFAULT_SECRET: &str = "change-this-secret-in-production-INSECURE";

const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Configuration consumed by the authentication core
#[derive(Clone)]
pub struct AuthConfig {
    /// Symmetric signing secret for session tokens
    pub jwt_secret: String,
    /// Signing algorithm (HMAC family only, since the key is symmetric)
    pub jwt_algorithm: Algorithm,
    /// Session token lifetime
    pub session_ttl: Duration,
    /// Expected `aud` of inbound identity assertions (Google OAuth client id)
    pub google_client_id: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("session_ttl", &self.session_ttl)
            .field("google_client_id", &self.google_client_id)
            .finish()
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// - `JWT_SECRET` (insecure development default, refused in production)
    /// - `JWT_ALGORITHM` (default HS256)
    /// - `SESSION_TTL_MINUTES` (default 30)
    /// - `GOOGLE_CLIENT_ID` (required)
    pub fn from_env() -> Result<Self> {
        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        if environment == "production" && jwt_secret == INSECURE_DEFAULT_SECRET {
            bail!(
                "JWT_SECRET must be set in production! Generate one with: openssl rand -hex 32"
            );
        }

        let jwt_algorithm = match env::var("JWT_ALGORITHM") {
            Ok(raw) => parse_hmac_algorithm(&raw)?,
            Err(_) => Algorithm::HS256,
        };

        let session_ttl = match env::var("SESSION_TTL_MINUTES") {
            Ok(raw) => parse_ttl_minutes(&raw)?,
            Err(_) => Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        };

        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| anyhow!("GOOGLE_CLIENT_ID must be set"))?;

        Ok(AuthConfig {
            jwt_secret,
            jwt_algorithm,
            session_ttl,
            google_client_id,
        })
    }
}

/// Parse an algorithm identifier, restricted to the HMAC family
fn parse_hmac_algorithm(raw: &str) -> Result<Algorithm> {
    let algorithm = Algorithm::from_str(raw.trim())
        .map_err(|_| anyhow!("unknown JWT_ALGORITHM '{}'", raw))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!(
            "JWT_ALGORITHM {:?} is asymmetric; only HS256/HS384/HS512 work with a shared secret",
            other
        ),
    }
}

fn parse_ttl_minutes(raw: &str) -> Result<Duration> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("SESSION_TTL_MINUTES must be an integer, got '{}'", raw))?;
    if minutes <= 0 {
        bail!("SESSION_TTL_MINUTES must be positive, got {}", minutes);
    }
    Ok(Duration::minutes(minutes))
}
