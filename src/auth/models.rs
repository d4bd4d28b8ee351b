// Account data models and request/response DTOs

use crate::auth::role::Role;
use crate::validation::{validate_password_strength, validate_role_member};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    /// Nullable: accounts created through an external identity may have no
    /// password until the owner sets one
    pub password_hash: Option<String>,
    pub pseudonyme: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub pseudonyme: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            pseudonyme: user.pseudonyme,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Refresh token database model
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Signup request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "pseudonyme is required"))]
    pub pseudonyme: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Logout / token refresh request DTO
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Admin user-creation request DTO; role is caller-specified
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminCreateRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "pseudonyme is required"))]
    pub pseudonyme: String,
    /// Role string, must name a member of the hierarchy
    #[validate(custom = "validate_role_member")]
    pub role: String,
}

/// Update request DTO; every field optional
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    /// Current password, required when changing an existing password
    pub password: Option<String>,
    pub new_password: Option<String>,
    pub pseudonyme: Option<String>,
    pub role: Option<String>,
}

/// Issued access/refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signup/login response payload
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Pagination metadata returned with user listings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Paginated user listing payload
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub users: Vec<UserResponse>,
    pub pagination: PageMeta,
}
