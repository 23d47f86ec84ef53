//! Identity resolution: upsert-by-email of user records
//!
//! The resolver is the only component that creates or mutates user rows.
//! An authentication for a known email overwrites the profile fields
//! unconditionally (a null claim clears a previously stored value); an
//! authentication for a new email inserts a row. Two concurrent
//! authentications for the same brand-new email race on the unique email
//! constraint: the loser's INSERT fails with a unique violation and is
//! recovered here by re-reading and updating instead.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::models::{IdentityClaims, User};
use crate::common::safe_email_log;

/// Repository for user record lookups and the upsert-by-email lifecycle
pub struct UserRepository {
    db: SqlitePool,
}

impl UserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Find the user for these claims, creating or updating as needed
    pub async fn resolve_and_upsert(&self, claims: &IdentityClaims) -> Result<User, sqlx::Error> {
        match self.find_by_email(&claims.email).await? {
            Some(existing) => {
                debug!(
                    user_id = existing.id,
                    email = %safe_email_log(&claims.email),
                    "Found existing user, updating profile fields"
                );
                self.apply_claims(existing.id, claims).await
            }
            None => self.insert_new(claims).await,
        }
    }

    /// Insert a new user row, falling back to an update if another request
    /// created the row between our lookup and the insert
    async fn insert_new(&self, claims: &IdentityClaims) -> Result<User, sqlx::Error> {
        match self.insert(claims).await {
            Ok(user) => {
                info!(
                    user_id = user.id,
                    email = %safe_email_log(&user.email),
                    "Created new user account"
                );
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => {
                warn!(
                    email = %safe_email_log(&claims.email),
                    "Lost creation race for new email, updating the existing row"
                );
                match self.find_by_email(&claims.email).await? {
                    Some(existing) => self.apply_claims(existing.id, claims).await,
                    // Row vanished between the failed insert and the re-read;
                    // nothing sane to recover to.
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, claims: &IdentityClaims) -> Result<User, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, google_id, first_name, last_name, profile_picture, created_at)
            VALUES (?, ?, ?, ?, ?, datetime('now'))
            "#,
        )
        .bind(&claims.email)
        .bind(claims.subject.as_deref())
        .bind(claims.given_name.as_deref())
        .bind(claims.family_name.as_deref())
        .bind(claims.picture.as_deref())
        .execute(&self.db)
        .await?;

        let id = result.last_insert_rowid();
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.db)
            .await
    }

    /// Overwrite the mutable profile fields with the asserted claims
    ///
    /// Unconditional: a null claim clears the stored value. Email, id, and
    /// created_at are never touched.
    async fn apply_claims(&self, id: i64, claims: &IdentityClaims) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET google_id = ?, first_name = ?, last_name = ?, profile_picture = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(claims.subject.as_deref())
        .bind(claims.given_name.as_deref())
        .bind(claims.family_name.as_deref())
        .bind(claims.picture.as_deref())
        .bind(id)
        .execute(&self.db)
        .await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.db)
            .await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
