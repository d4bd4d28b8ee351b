// Consolidated authentication and authorization error taxonomy
// Every auth call site resolves into exactly one of these variants

use crate::auth::role::Role;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};

/// Error taxonomy for the account/token core
///
/// One enum serves both the HTTP boundary (via `IntoResponse`) and internal
/// callers, so the same failure always maps to the same status and message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Insufficient access: role '{caller}' may not act on role '{target}'")]
    InsufficientAccess { caller: Role, target: Role },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Missing information: {0}")]
    MissingInfo(String),

    #[error("Request validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Email already exists")]
    AccountExists,

    #[error("Refresh token already registered")]
    DuplicateToken,

    #[error("User with id {0} not found")]
    AccountNotFound(i32),

    #[error("Current password is required to change password")]
    PasswordRequired,

    #[error("A new password is required")]
    NewPasswordRequired,

    #[error("No password is set for this account")]
    NoPasswordSet,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error")]
    PasswordHash,

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::Unauthorized
            | AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::InvalidSignature
            | AuthError::MalformedToken
            | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientAccess { .. } => StatusCode::FORBIDDEN,
            AuthError::InvalidRole(_)
            | AuthError::MissingInfo(_)
            | AuthError::Validation(_)
            | AuthError::PasswordRequired
            | AuthError::NewPasswordRequired
            | AuthError::NoPasswordSet => StatusCode::BAD_REQUEST,
            AuthError::AccountExists | AuthError::DuplicateToken => StatusCode::CONFLICT,
            AuthError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::PasswordHash | AuthError::TokenGeneration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message, with internals filtered out of 500-class errors
    fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::PasswordHash | AuthError::TokenGeneration(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Database(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHash => error!("Password hashing error"),
            AuthError::TokenGeneration(msg) => error!("Token generation error: {}", msg),
            AuthError::MissingToken => warn!("Missing token in request"),
            AuthError::InvalidToken | AuthError::MalformedToken => warn!("Invalid token attempt"),
            AuthError::InvalidSignature => warn!("Token signature verification failed"),
            AuthError::ExpiredToken => warn!("Expired token attempt"),
            AuthError::InsufficientAccess { caller, target } => {
                warn!("Authorization failed: caller role '{}', target role '{}'", caller, target)
            }
            other => debug!("Auth request rejected: {}", other),
        }

        // Validation failures carry per-field entries under error.errors;
        // everything else is a single error.msg
        let body = match &self {
            AuthError::Validation(errors) => {
                let entries: Vec<serde_json::Value> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| {
                            json!({
                                "msg": e
                                    .message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string()),
                                "location": field,
                            })
                        })
                    })
                    .collect();
                json!({ "error": { "errors": entries } })
            }
            other => json!({ "error": { "msg": other.client_message() } }),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientAccess { caller: Role::Moderator, target: Role::SuperAdmin }
                .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::InvalidRole("bogus".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AccountExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::DuplicateToken.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::AccountNotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Database("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = AuthError::Database("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.client_message(), "Internal server error");

        let err = AuthError::TokenGeneration("bad key material".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_invalid_signature_message() {
        assert_eq!(AuthError::InvalidSignature.to_string(), "invalid signature");
    }
}
