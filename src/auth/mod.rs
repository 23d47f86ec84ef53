//! # Auth Module
//!
//! The verification → resolution → issuance → session-verification
//! pipeline:
//! - Google ID token verification and typed claims extraction
//! - user record upsert keyed by email
//! - session token issuance and validation
//! - AuthedUser extractor for protected routes

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod service;
pub mod session;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use routes::auth_routes;
