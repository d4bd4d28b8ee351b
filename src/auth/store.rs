// Persistent registry of currently-valid refresh tokens
// One row per issued refresh token, keyed by SHA-256 digest of the value

use crate::auth::{error::AuthError, models::RefreshTokenRow};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::debug;

/// Refresh token store backed by Postgres
///
/// A refresh token is usable only while its row exists and has not passed
/// `expires_at`. Logout deletes the row, which invalidates the token even
/// though its signature remains valid.
pub struct RefreshTokenStore {
    pool: PgPool,
}

impl RefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a token value using SHA-256 before it touches the database
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Register a refresh token for a user
    ///
    /// The unique index on `token_hash` guarantees no silent overwrite; a
    /// collision surfaces as `DuplicateToken`.
    pub async fn insert(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let token_hash = Self::hash_token(token);

        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateToken;
                }
            }
            AuthError::Database(e.to_string())
        })?;

        Ok(())
    }

    /// Find a live row for the given token value
    ///
    /// Rows past their expiry are treated as absent regardless of explicit
    /// deletion; the TTL is enforced here at the storage layer.
    pub async fn find(&self, token: &str) -> Result<Option<RefreshTokenRow>, AuthError> {
        let token_hash = Self::hash_token(token);

        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, user_id, token_hash, expires_at, created_at
             FROM refresh_tokens
             WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(row)
    }

    /// Delete the row for the given token value
    ///
    /// Idempotent: deleting an absent token is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), AuthError> {
        let token_hash = Self::hash_token(token);

        sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(())
    }

    /// Purge rows past their expiry, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!("Purged {} expired refresh tokens", purged);
        }
        Ok(purged)
    }
}
