//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model
///
/// `id` is assigned by SQLite on insert and never changes; `email` is the
/// unique lookup key. The profile fields are overwritten on every successful
/// authentication with whatever the identity provider asserted, nulls
/// included.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub google_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Normalized identity claims extracted from a verified identity assertion
///
/// Populated once by the claims verifier and passed by value through the
/// rest of the pipeline. Email is the mandatory identity key; everything
/// else is optional enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub subject: Option<String>,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

/// Claim set embedded in locally issued session tokens
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SessionClaims {
    /// Bound user's numeric id, as a string
    pub sub: String,
    pub email: String,
    /// Expiry, seconds since the Unix epoch
    pub exp: usize,
}

/// Request body for POST /auth/google
#[derive(Deserialize)]
pub struct GoogleTokenRequest {
    pub token: String,
}

/// Response body for a successful token exchange
#[derive(Serialize, Debug)]
pub struct GoogleAuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}
