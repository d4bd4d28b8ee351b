// Authentication gate at the request boundary

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use crate::auth::{error::AuthError, role::Role, token::TokenService};
use std::sync::Arc;

/// Resolved identity of an authenticated request
///
/// Extracted from the `Authorization: Bearer <token>` header before the
/// handler runs; on any verification failure the request is rejected and no
/// partial identity is attached.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Token service comes from application state; the secret was
        // validated at startup and cannot be absent here
        let token_service = Arc::<TokenService>::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        // verify() classifies signature/expiry/malformed failures
        let claims = token_service.verify(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
