//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/google` - exchange a Google ID token for a session token
/// - `GET /auth/me` - current user information (bearer-protected)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/google", post(handlers::google_auth))
        .route("/auth/me", get(handlers::me_handler))
}
