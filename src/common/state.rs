// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::service::AuthService;

/// Application state containing database pool and the authentication service
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: Arc<AuthService>,
}
