// Database repository for user accounts

use crate::auth::{error::AuthError, models::User, role::Role};
use crate::query::{UserQueryBuilder, ValidatedListing};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, email, password_hash, pseudonyme, role, created_at, updated_at";

/// Explicit allow-list of mutable account fields
///
/// Each operation builds exactly the set of changes it permits; nothing else
/// can reach the UPDATE statement. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub pseudonyme: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.pseudonyme.is_none()
            && self.role.is_none()
    }
}

/// User repository for database operations
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// The case-insensitive unique index on email surfaces duplicates as
    /// `AccountExists` rather than a generic database error.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        pseudonyme: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, pseudonyme, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(pseudonyme)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::AccountExists;
                }
            }
            AuthError::Database(e.to_string())
        })?;

        Ok(user)
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Apply an allow-listed set of changes, returning the updated row
    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET email = COALESCE($1, email),
                 password_hash = COALESCE($2, password_hash),
                 pseudonyme = COALESCE($3, pseudonyme),
                 role = COALESCE($4, role),
                 updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.pseudonyme)
        .bind(changes.role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::AccountExists;
                }
            }
            AuthError::Database(e.to_string())
        })?
        .ok_or(AuthError::AccountNotFound(id))?;

        Ok(user)
    }

    /// Delete a user row outright; true when a row was removed
    pub async fn delete_by_id(&self, id: i32) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Filtered, sorted, paginated listing plus the unpaginated total
    pub async fn list(&self, listing: &ValidatedListing) -> Result<(Vec<User>, i64), AuthError> {
        let builder = UserQueryBuilder::from_listing(listing);

        let (query_str, params) = builder.build();
        let mut query = sqlx::query_as::<_, User>(&query_str);
        for param in params {
            query = query.bind(param);
        }
        let users = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let (count_str, params) = builder.build_count();
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_str);
        for param in params {
            count_query = count_query.bind(param);
        }
        let (total,) = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok((users, total))
    }
}
